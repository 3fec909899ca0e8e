use std::collections::HashMap;
use std::time::Duration;

use bollard::container::{ListContainersOptions, RemoveContainerOptions, StopContainerOptions};
use bollard::models::{ContainerSummary, Network};
use bollard::network::ListNetworksOptions;

use undock_types::labels;

use crate::client::*;
use crate::rt::ContainerRuntimeErrorKind;
use crate::ContainerRuntimeError;

pub struct DockerClient {
    docker: bollard::Docker,
}

impl DockerClient {
    pub fn new() -> Result<Self, ContainerRuntimeError> {
        let docker = bollard::Docker::connect_with_local_defaults()
            .map_err(|err| ContainerRuntimeError::new(ContainerRuntimeErrorKind::Initialization, err.to_string()))?;
        Ok(Self {
            docker,
        })
    }
}

#[async_trait::async_trait]
impl Client for DockerClient {

    async fn list_containers(&self, project_name: &str, include_stopped: bool) -> Result<Vec<ContainerRecord>, ContainerRuntimeError> {
        let options = ListContainersOptions {
            all: include_stopped,
            filters: project_filter(project_name),
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await
            .map_err(|err| map_error(err, ContainerRuntimeErrorKind::ListContainers, project_name))?;

        Ok(containers.into_iter().map(container_record).collect())
    }

    async fn stop_container(&self, id: ContainerId, timeout: Option<Duration>) -> Result<(), ContainerRuntimeError> {
        let options = timeout.map(|timeout| StopContainerOptions { t: timeout.as_secs() as i64 });
        self.docker.stop_container(&id, options).await
            .map_err(|err| map_error(err, ContainerRuntimeErrorKind::StopContainer, &id))?;
        Ok(())
    }

    async fn remove_container(&self, id: ContainerId, force: bool) -> Result<(), ContainerRuntimeError> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.docker.remove_container(&id, Some(options)).await
            .map_err(|err| map_error(err, ContainerRuntimeErrorKind::RemoveContainer, &id))?;
        Ok(())
    }

    async fn list_networks(&self, project_name: &str) -> Result<Vec<NetworkRecord>, ContainerRuntimeError> {
        let options = ListNetworksOptions {
            filters: project_filter(project_name),
        };

        let networks = self.docker.list_networks(Some(options)).await
            .map_err(|err| map_error(err, ContainerRuntimeErrorKind::ListNetworks, project_name))?;

        Ok(networks.into_iter().map(network_record).collect())
    }

    async fn remove_network(&self, id: NetworkId) -> Result<(), ContainerRuntimeError> {
        self.docker.remove_network(&id).await
            .map_err(|err| map_error(err, ContainerRuntimeErrorKind::RemoveNetwork, &id))?;
        Ok(())
    }
}

fn project_filter(project_name: &str) -> HashMap<String, Vec<String>> {
    HashMap::from([(
        String::from("label"),
        vec![format!("{}={project_name}", labels::PROJECT_LABEL)],
    )])
}

fn map_error(err: bollard::errors::Error, kind: ContainerRuntimeErrorKind, resource: &str) -> ContainerRuntimeError {
    match err {
        bollard::errors::Error::DockerResponseServerError { status_code: 404, message } => {
            ContainerRuntimeError::new_with_resource(ContainerRuntimeErrorKind::NotFound, message, String::from(resource))
        }
        other => ContainerRuntimeError::new_with_resource(kind, other.to_string(), String::from(resource)),
    }
}

fn container_record(container: ContainerSummary) -> ContainerRecord {
    let name = container.names.unwrap_or_default().first()
        .map(|name| String::from(name.trim_start_matches('/')))
        .unwrap_or_else(|| String::from("<unknown>"));

    ContainerRecord {
        id: container.id.unwrap_or_else(|| String::from("<unknown>")),
        name,
        labels: container.labels.unwrap_or_default(),
        state: container_state(container.state.as_deref()),
    }
}

fn container_state(state: Option<&str>) -> ContainerState {
    match state {
        Some("created") => ContainerState::Created,
        Some("running") => ContainerState::Running,
        Some("paused") => ContainerState::Paused,
        Some("restarting") => ContainerState::Restarting,
        Some("removing") => ContainerState::Removing,
        Some("exited") => ContainerState::Exited,
        Some("dead") => ContainerState::Dead,
        _ => ContainerState::Unknown,
    }
}

fn network_record(network: Network) -> NetworkRecord {
    NetworkRecord {
        id: network.id.unwrap_or_else(|| String::from("<unknown>")),
        name: network.name.unwrap_or_else(|| String::from("<unknown>")),
        labels: network.labels.unwrap_or_default(),
    }
}

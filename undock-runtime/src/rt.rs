use std::sync::Arc;
use std::time::Duration;

use crate::client::{Client, ContainerId, ContainerRecord, NetworkId, NetworkRecord};

/// Facade over an exchangeable [`Client`] implementation.
///
/// Passed explicitly into the teardown core; there is no process-wide handle.
#[derive(Clone)]
pub struct ContainerRuntime {
    client: Arc<dyn Client>,
}

impl ContainerRuntime {

    #[cfg(feature = "docker")]
    pub fn new_docker() -> Result<ContainerRuntime, ContainerRuntimeError> {
        let client = crate::client::docker::DockerClient::new()?;
        Ok(ContainerRuntime {
            client: Arc::new(client),
        })
    }

    #[cfg(any(test, feature = "mock"))]
    pub fn new_mock() -> (crate::client::mock::MockClient, ContainerRuntime) {
        let mock = crate::client::mock::MockClient::new();
        (Clone::clone(&mock), ContainerRuntime { client: Arc::new(mock) })
    }

    pub fn new(client: Arc<dyn Client>) -> ContainerRuntime {
        ContainerRuntime { client }
    }

    pub async fn list_containers(&self, project_name: &str, include_stopped: bool) -> Result<Vec<ContainerRecord>, ContainerRuntimeError> {
        self.client.list_containers(project_name, include_stopped).await
    }

    pub async fn stop_container(&self, id: ContainerId, timeout: Option<Duration>) -> Result<(), ContainerRuntimeError> {
        self.client.stop_container(id, timeout).await
    }

    pub async fn remove_container(&self, id: ContainerId, force: bool) -> Result<(), ContainerRuntimeError> {
        self.client.remove_container(id, force).await
    }

    pub async fn list_networks(&self, project_name: &str) -> Result<Vec<NetworkRecord>, ContainerRuntimeError> {
        self.client.list_networks(project_name).await
    }

    pub async fn remove_network(&self, id: NetworkId) -> Result<(), ContainerRuntimeError> {
        self.client.remove_network(id).await
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(any(test, feature = "mock"), derive(PartialEq, Eq))]
pub struct ContainerRuntimeError {
    pub kind: ContainerRuntimeErrorKind,
    pub message: String,
    pub affected_resource: Option<String>,
}

impl ContainerRuntimeError {

    pub fn new(kind: ContainerRuntimeErrorKind, message: String) -> ContainerRuntimeError {
        ContainerRuntimeError {
            kind,
            message,
            affected_resource: None,
        }
    }

    pub fn new_with_resource(kind: ContainerRuntimeErrorKind, message: String, resource: String) -> ContainerRuntimeError {
        ContainerRuntimeError {
            kind,
            message,
            affected_resource: Some(resource),
        }
    }

    /// Whether the runtime reported the resource as already absent.
    ///
    /// Idempotent teardown treats this as success for removals.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ContainerRuntimeErrorKind::NotFound)
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(any(test, feature = "mock"), derive(PartialEq, Eq))]
pub enum ContainerRuntimeErrorKind {
    Initialization,
    ListContainers,
    StopContainer,
    RemoveContainer,
    ListNetworks,
    RemoveNetwork,
    NotFound,

    #[cfg(any(test, feature = "mock"))] MockLock,
}

impl std::error::Error for ContainerRuntimeError {}

impl std::fmt::Display for ContainerRuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "An error occurred ")?;
        let affected_resource = self.affected_resource.as_deref()
            .unwrap_or("<unknown>");
        match self.kind {
            ContainerRuntimeErrorKind::Initialization => write!(f, "during runtime initialization")?,
            ContainerRuntimeErrorKind::ListContainers => write!(f, "when listing containers of project '{affected_resource}'")?,
            ContainerRuntimeErrorKind::StopContainer => write!(f, "when stopping container '{affected_resource}'")?,
            ContainerRuntimeErrorKind::RemoveContainer => write!(f, "when removing container '{affected_resource}'")?,
            ContainerRuntimeErrorKind::ListNetworks => write!(f, "when listing networks of project '{affected_resource}'")?,
            ContainerRuntimeErrorKind::RemoveNetwork => write!(f, "when removing network '{affected_resource}'")?,
            ContainerRuntimeErrorKind::NotFound => write!(f, "because resource '{affected_resource}' was not found")?,
            #[cfg(any(test, feature = "mock"))] ContainerRuntimeErrorKind::MockLock => write!(f, "when accessing the inner lock of the mock")?,
        };
        write!(f, ": {}", self.message)
    }
}

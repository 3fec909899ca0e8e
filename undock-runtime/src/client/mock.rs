use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::client::{Client, ContainerId, ContainerRecord, ContainerState, NetworkId, NetworkRecord};
use crate::rt::ContainerRuntimeErrorKind;
use crate::ContainerRuntimeError;

use undock_types::labels;

/// In-memory stand-in for a container runtime.
///
/// Serves configured container and network fixtures, records every
/// invocation, and can be instructed to fail individual stop or remove
/// calls to exercise error paths.
#[derive(Clone, Debug, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    containers: Vec<ContainerRecord>,
    networks: Vec<NetworkRecord>,
    failing_stops: HashSet<ContainerId>,
    failing_removals: HashSet<ContainerId>,
    failing_network_removals: HashSet<NetworkId>,
    absent_networks: HashSet<NetworkId>,
    invocations: Vec<MockClientInvocation>,
}

impl MockClient {

    pub(crate) fn new() -> Self {
        Default::default()
    }

    pub fn add_container(&self, container: ContainerRecord) {
        self.lock_state().containers.push(container);
    }

    pub fn add_network(&self, network: NetworkRecord) {
        self.lock_state().networks.push(network);
    }

    /// Makes the next stop of the given container fail.
    pub fn fail_stop_of(&self, id: impl Into<ContainerId>) {
        self.lock_state().failing_stops.insert(id.into());
    }

    /// Makes the next removal of the given container fail.
    pub fn fail_removal_of(&self, id: impl Into<ContainerId>) {
        self.lock_state().failing_removals.insert(id.into());
    }

    /// Makes the next removal of the given network fail.
    pub fn fail_removal_of_network(&self, id: impl Into<NetworkId>) {
        self.lock_state().failing_network_removals.insert(id.into());
    }

    /// Makes removal of the given network report "not found",
    /// even while the network still shows up in listings.
    pub fn mark_network_absent(&self, id: impl Into<NetworkId>) {
        self.lock_state().absent_networks.insert(id.into());
    }

    pub fn invocations(&self) -> Vec<MockClientInvocation> {
        self.lock_state().invocations.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("Failed to lock mock state")
    }
}

#[async_trait::async_trait]
impl Client for MockClient {

    async fn list_containers(&self, project_name: &str, include_stopped: bool) -> Result<Vec<ContainerRecord>, ContainerRuntimeError> {
        let mut state = self.state.lock()?;
        state.invocations.push(MockClientInvocation::ListContainers {
            project_name: String::from(project_name),
            include_stopped,
        });
        let containers = state.containers.iter()
            .filter(|container| container.labels.get(labels::PROJECT_LABEL).is_some_and(|label| label == project_name))
            .filter(|container| include_stopped || container.state.is_running())
            .cloned()
            .collect();
        Ok(containers)
    }

    async fn stop_container(&self, id: ContainerId, timeout: Option<Duration>) -> Result<(), ContainerRuntimeError> {
        let mut state = self.state.lock()?;
        state.invocations.push(MockClientInvocation::StopContainer { id: Clone::clone(&id), timeout });
        if state.failing_stops.contains(&id) {
            return Err(ContainerRuntimeError::new_with_resource(
                ContainerRuntimeErrorKind::StopContainer,
                String::from("Simulated failure while stopping."),
                id,
            ));
        }
        if let Some(container) = state.containers.iter_mut().find(|container| container.id == id) {
            container.state = ContainerState::Exited;
        }
        Ok(())
    }

    async fn remove_container(&self, id: ContainerId, force: bool) -> Result<(), ContainerRuntimeError> {
        let mut state = self.state.lock()?;
        state.invocations.push(MockClientInvocation::RemoveContainer { id: Clone::clone(&id), force });
        if state.failing_removals.contains(&id) {
            return Err(ContainerRuntimeError::new_with_resource(
                ContainerRuntimeErrorKind::RemoveContainer,
                String::from("Simulated failure while removing."),
                id,
            ));
        }
        let known = state.containers.iter().any(|container| container.id == id);
        if known {
            state.containers.retain(|container| container.id != id);
            Ok(())
        } else {
            Err(ContainerRuntimeError::new_with_resource(
                ContainerRuntimeErrorKind::NotFound,
                String::from("No such container."),
                id,
            ))
        }
    }

    async fn list_networks(&self, project_name: &str) -> Result<Vec<NetworkRecord>, ContainerRuntimeError> {
        let mut state = self.state.lock()?;
        state.invocations.push(MockClientInvocation::ListNetworks { project_name: String::from(project_name) });
        let networks = state.networks.iter()
            .filter(|network| network.labels.get(labels::PROJECT_LABEL).is_some_and(|label| label == project_name))
            .cloned()
            .collect();
        Ok(networks)
    }

    async fn remove_network(&self, id: NetworkId) -> Result<(), ContainerRuntimeError> {
        let mut state = self.state.lock()?;
        state.invocations.push(MockClientInvocation::RemoveNetwork { id: Clone::clone(&id) });
        if state.failing_network_removals.contains(&id) {
            return Err(ContainerRuntimeError::new_with_resource(
                ContainerRuntimeErrorKind::RemoveNetwork,
                String::from("Simulated failure while removing."),
                id,
            ));
        }
        let known = state.networks.iter().any(|network| network.id == id);
        if state.absent_networks.contains(&id) || !known {
            return Err(ContainerRuntimeError::new_with_resource(
                ContainerRuntimeErrorKind::NotFound,
                String::from("No such network."),
                id,
            ));
        }
        state.networks.retain(|network| network.id != id);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MockClientInvocation {
    ListContainers { project_name: String, include_stopped: bool },
    StopContainer { id: ContainerId, timeout: Option<Duration> },
    RemoveContainer { id: ContainerId, force: bool },
    ListNetworks { project_name: String },
    RemoveNetwork { id: NetworkId },
}

impl <T> From<PoisonError<T>> for ContainerRuntimeError {
    fn from(value: PoisonError<T>) -> Self {
        ContainerRuntimeError::new(ContainerRuntimeErrorKind::MockLock, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use googletest::prelude::*;

    use super::*;

    fn shop_container(id: &str, service: &str, state: ContainerState) -> ContainerRecord {
        ContainerRecord {
            id: String::from(id),
            name: format!("shop_{service}_1"),
            labels: HashMap::from([
                (String::from(labels::PROJECT_LABEL), String::from("shop")),
                (String::from(labels::SERVICE_LABEL), String::from(service)),
            ]),
            state,
        }
    }

    #[tokio::test]
    async fn should_filter_listed_containers_by_project_and_state() -> Result<()> {
        let client = MockClient::new();
        client.add_container(shop_container("c1", "web", ContainerState::Running));
        client.add_container(shop_container("c2", "db", ContainerState::Exited));

        let running = client.list_containers("shop", false).await?;
        verify_that!(running.len(), eq(1))?;

        let all = client.list_containers("shop", true).await?;
        verify_that!(all.len(), eq(2))?;

        let other_project = client.list_containers("blog", true).await?;
        verify_that!(other_project, empty())
    }

    #[tokio::test]
    async fn should_report_removal_of_an_unknown_network_as_not_found() -> Result<()> {
        let client = MockClient::new();

        let result = client.remove_network(String::from("n1")).await;

        verify_that!(result.unwrap_err().is_not_found(), eq(true))
    }

    #[tokio::test]
    async fn should_record_invocations_in_order() -> Result<()> {
        let client = MockClient::new();
        client.add_container(shop_container("c1", "web", ContainerState::Running));

        client.stop_container(String::from("c1"), None).await?;
        client.remove_container(String::from("c1"), true).await?;

        verify_that!(client.invocations(), eq(vec![
            MockClientInvocation::StopContainer { id: String::from("c1"), timeout: None },
            MockClientInvocation::RemoveContainer { id: String::from("c1"), force: true },
        ]))
    }
}

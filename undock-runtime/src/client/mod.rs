use std::collections::HashMap;
use std::time::Duration;

use crate::ContainerRuntimeError;

#[cfg(feature = "docker")]
pub mod docker;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Request/response seam to the container runtime.
///
/// Implementations must distinguish "not found" from other failures,
/// see [`ContainerRuntimeError::is_not_found`].
#[async_trait::async_trait]
pub trait Client: Send + Sync {

    /// Lists containers labeled as belonging to the given project.
    /// Results are snapshots; runtime state can change between calls.
    async fn list_containers(&self, project_name: &str, include_stopped: bool) -> Result<Vec<ContainerRecord>, ContainerRuntimeError>;

    /// Stops a container. Without a timeout the runtime default grace period applies.
    async fn stop_container(&self, id: ContainerId, timeout: Option<Duration>) -> Result<(), ContainerRuntimeError>;

    async fn remove_container(&self, id: ContainerId, force: bool) -> Result<(), ContainerRuntimeError>;

    /// Lists networks labeled as belonging to the given project.
    async fn list_networks(&self, project_name: &str) -> Result<Vec<NetworkRecord>, ContainerRuntimeError>;

    async fn remove_network(&self, id: NetworkId) -> Result<(), ContainerRuntimeError>;
}

pub type ContainerId = String;
pub type NetworkId = String;

#[derive(Clone, Debug)]
#[cfg_attr(any(test, feature = "mock"), derive(PartialEq))]
pub struct ContainerRecord {
    pub id: ContainerId,
    /// Canonical display name, without the leading slash the runtime reports.
    pub name: String,
    pub labels: HashMap<String, String>,
    pub state: ContainerState,
}

#[derive(Clone, Debug)]
#[cfg_attr(any(test, feature = "mock"), derive(PartialEq))]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown,
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(any(test, feature = "mock"), derive(PartialEq))]
pub struct NetworkRecord {
    pub id: NetworkId,
    pub name: String,
    pub labels: HashMap<String, String>,
}

use undock_runtime::ContainerRuntimeError;
use undock_types::labels::MissingLabel;
use undock_types::project::{IllegalServiceName, ProjectName};

use crate::loader::LoadProjectError;
use crate::ordering::DependencyCycle;

/// Teardown is not transactional: previously completed service groups are
/// not rolled back, and partial teardown is an expected, visible outcome of
/// any of these errors. Every resource-level failure is additionally emitted
/// as an error lifecycle event naming the same resource.
#[derive(thiserror::Error, Debug)]
pub enum TearDownError {
    #[error("Failed to query the runtime for project <{project}>:\n  {source}")]
    Lookup {
        project: ProjectName,
        source: ContainerRuntimeError,
    },
    #[error("Failed to recover the definition of project <{project}> from container '{container}':\n  {source}")]
    MissingLabels {
        project: ProjectName,
        container: String,
        source: MissingLabel,
    },
    #[error("Containers of project <{project}> carry an illegal service name label: {source}")]
    IllegalServiceLabel {
        project: ProjectName,
        source: IllegalServiceName,
    },
    #[error("Failed to re-parse the definition of project <{project}>:\n  {source}")]
    Parse {
        project: ProjectName,
        source: LoadProjectError,
    },
    #[error(transparent)]
    DependencyCycle(#[from] DependencyCycle),
    #[error("An error occurred while stopping container '{container}':\n  {source}")]
    StopContainer {
        container: String,
        source: ContainerRuntimeError,
    },
    #[error("An error occurred while removing container '{container}':\n  {source}")]
    RemoveContainer {
        container: String,
        source: ContainerRuntimeError,
    },
    #[error("An error occurred while removing network '{network}':\n  {source}")]
    RemoveNetwork {
        network: String,
        source: ContainerRuntimeError,
    },
    #[error("Teardown was cancelled.")]
    Cancelled,
}

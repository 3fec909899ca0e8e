use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use undock_runtime::{ContainerRecord, ContainerRuntime, NetworkRecord};
use undock_types::project::{Project, ProjectName};

use crate::containers::Containers;
use crate::error::TearDownError;
use crate::loader::ProjectLoader;
use crate::ordering;
use crate::progress::{Event, EventSink};
use crate::reconstruct;

/// Options for one teardown invocation. Immutable once supplied.
#[derive(Clone, Debug, Default)]
pub struct TearDownOptions {
    /// Pre-parsed project. When absent, the topology is reconstructed
    /// from the labels of the project's containers.
    pub project: Option<Project>,
    /// Also remove containers labeled for the project but no longer
    /// declared by it.
    pub remove_orphans: bool,
    /// Grace period granted when stopping containers.
    /// `None` defers to the runtime default.
    pub stop_timeout: Option<Duration>,
}

impl TearDownOptions {
    pub fn load(config: &config::Config) -> Result<Self, config::ConfigError> {
        let remove_orphans = match config.get::<bool>("teardown.remove-orphans") {
            Ok(value) => value,
            Err(config::ConfigError::NotFound(_)) => false,
            Err(cause) => return Err(cause),
        };
        let stop_timeout = match config.get::<u64>("teardown.stop.timeout.ms") {
            Ok(millis) => Some(Duration::from_millis(millis)),
            Err(config::ConfigError::NotFound(_)) => None,
            Err(cause) => return Err(cause),
        };
        Ok(TearDownOptions {
            project: None,
            remove_orphans,
            stop_timeout,
        })
    }
}

/// Tears a deployed application back down: containers in reverse dependency
/// order, then the application's networks.
pub struct TearDown {
    runtime: ContainerRuntime,
    loader: Arc<dyn ProjectLoader>,
    progress: Arc<dyn EventSink>,
    cancellation: CancellationToken,
}

impl TearDown {

    pub fn new(
        runtime: ContainerRuntime,
        loader: Arc<dyn ProjectLoader>,
        progress: Arc<dyn EventSink>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { runtime, loader, progress, cancellation }
    }

    /// Stops and removes all containers of the project in reverse dependency
    /// order, optionally removes orphaned containers, and finally removes the
    /// project's networks.
    ///
    /// Aborts at the first failing batch; service groups torn down before the
    /// failure stay torn down. Networks are only touched once every container
    /// batch has completed, since a network cannot be removed while a
    /// container still references it.
    pub async fn down(&self, project_name: ProjectName, options: TearDownOptions) -> Result<(), TearDownError> {
        let project = match options.project {
            Some(project) => project,
            None => reconstruct::project_from_container_labels(&self.runtime, self.loader.as_ref(), &project_name).await?,
        };
        let stop_timeout = options.stop_timeout;

        let containers = self.runtime.list_containers(project.name.as_ref(), true).await
            .map_err(|source| TearDownError::Lookup { project: Clone::clone(&project.name), source })?;
        let containers = Containers::new(containers);

        let project_name = &project.name;
        let remaining = ordering::in_reverse_dependency_order(&project, containers, |containers, service| async move {
            let (batch, remaining) = containers.split(Containers::belonging_to_service(&service.name));
            debug!("Tearing down service '{}' of project <{}> ({} containers).", service.name, project_name, batch.len());
            self.remove_containers(batch, stop_timeout).await?;
            Ok(remaining)
        }).await?;

        if options.remove_orphans && !remaining.is_empty() {
            debug!("Removing {} orphaned containers of project <{}>.", remaining.len(), project.name);
            self.remove_containers(remaining, stop_timeout).await?;
        }

        self.remove_networks(&project.name).await
    }

    /// Tears down one batch of containers concurrently. Per container the
    /// order is strictly stop, then forced removal; the batch waits for all
    /// containers and reports the first error.
    async fn remove_containers(&self, containers: Containers, stop_timeout: Option<Duration>) -> Result<(), TearDownError> {
        let units = containers.iter()
            .map(|container| self.stop_and_remove_container(container, stop_timeout));
        self.join_first_error(units).await
    }

    async fn stop_and_remove_container(&self, container: &ContainerRecord, stop_timeout: Option<Duration>) -> Result<(), TearDownError> {
        let event_name = format!("Container {}", container.name);

        self.progress.emit(Event::stopping(&event_name));
        if let Err(source) = self.runtime.stop_container(Clone::clone(&container.id), stop_timeout).await {
            self.progress.emit(Event::error(&event_name, "Error while Stopping"));
            return Err(TearDownError::StopContainer { container: Clone::clone(&container.name), source });
        }
        self.progress.emit(Event::stopped(&event_name));

        self.progress.emit(Event::removing(&event_name));
        // Forced, so removal succeeds even for containers that raced back
        // into a running state after the stop.
        if let Err(source) = self.runtime.remove_container(Clone::clone(&container.id), true).await {
            self.progress.emit(Event::error(&event_name, "Error while Removing"));
            return Err(TearDownError::RemoveContainer { container: Clone::clone(&container.name), source });
        }
        self.progress.emit(Event::removed(&event_name));

        Ok(())
    }

    /// Removes all networks owned by the project concurrently. Networks the
    /// runtime already reports as absent count as removed.
    async fn remove_networks(&self, project: &ProjectName) -> Result<(), TearDownError> {
        let networks = self.runtime.list_networks(project.as_ref()).await
            .map_err(|source| TearDownError::Lookup { project: Clone::clone(project), source })?;

        let units = networks.iter()
            .map(|network| self.remove_network(network));
        self.join_first_error(units).await
    }

    async fn remove_network(&self, network: &NetworkRecord) -> Result<(), TearDownError> {
        match self.runtime.remove_network(Clone::clone(&network.id)).await {
            Ok(()) => Ok(()),
            Err(source) if source.is_not_found() => {
                debug!("Network '{}' was already removed.", network.name);
                Ok(())
            }
            Err(source) => {
                self.progress.emit(Event::error(format!("Network {}", network.name), "Error while Removing"));
                Err(TearDownError::RemoveNetwork { network: Clone::clone(&network.name), source })
            }
        }
    }

    /// Runs all units concurrently, waits for every unit to finish and
    /// reports the first error. A failing unit does not cancel its siblings,
    /// so callers must not assume the runtime is quiescent once an error
    /// surfaces. Cancellation makes the whole batch return promptly.
    async fn join_first_error<I, F>(&self, units: I) -> Result<(), TearDownError>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<(), TearDownError>>,
    {
        if self.cancellation.is_cancelled() {
            return Err(TearDownError::Cancelled);
        }
        tokio::select! {
            results = join_all(units) => {
                results.into_iter().collect::<Result<(), TearDownError>>()
            }
            _ = self.cancellation.cancelled() => Err(TearDownError::Cancelled),
        }
    }
}

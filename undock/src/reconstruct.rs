use std::collections::BTreeSet;

use tracing::debug;

use undock_runtime::ContainerRuntime;
use undock_types::labels::{self, ProjectLabels};
use undock_types::project::{Project, ProjectName, Service, ServiceName};

use crate::error::TearDownError;
use crate::loader::ProjectLoader;

/// Rebuilds the project topology purely from labels stamped onto the
/// project's containers, for teardown invocations that supply only a name.
///
/// With no containers left on the runtime this yields an empty project,
/// making the teardown a no-op beyond the network sweep.
pub async fn project_from_container_labels(
    runtime: &ContainerRuntime,
    loader: &dyn ProjectLoader,
    project_name: &ProjectName,
) -> Result<Project, TearDownError> {

    let containers = runtime.list_containers(project_name.as_ref(), true).await
        .map_err(|source| TearDownError::Lookup { project: Clone::clone(project_name), source })?;

    let Some(first) = containers.first() else {
        return Ok(Project::empty(Clone::clone(project_name)));
    };

    let recovered = ProjectLabels::try_from_labels(&first.labels)
        .map_err(|source| TearDownError::MissingLabels {
            project: Clone::clone(project_name),
            container: Clone::clone(&first.name),
            source,
        })?;

    if recovered.declared_via_stdin() {
        // The definition never existed on disk, so there is no dependency
        // metadata to recover. One flat service per distinct service label;
        // teardown order degrades to all-at-once.
        debug!("Project <{project_name}> was declared via stdin. Synthesizing services from container labels.");
        let service_names = containers.iter()
            .filter_map(|container| container.labels.get(labels::SERVICE_LABEL))
            .collect::<BTreeSet<_>>();

        let services = service_names.into_iter()
            .map(|name| ServiceName::try_from(name.as_str()).map(Service::new))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TearDownError::IllegalServiceLabel { project: Clone::clone(project_name), source })?;

        return Ok(Project { name: Clone::clone(project_name), services });
    }

    debug!("Re-parsing declaration files {:?} of project <{project_name}> from '{}'.",
        recovered.config_files, recovered.working_dir.display());

    loader.load(&recovered.config_files, &recovered.working_dir, project_name).await
        .map_err(|source| TearDownError::Parse { project: Clone::clone(project_name), source })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use googletest::prelude::*;

    use undock_runtime::{ContainerRecord, ContainerState};

    use crate::loader::LoadProjectError;

    use super::*;

    fn shop() -> ProjectName {
        ProjectName::try_from("shop").unwrap()
    }

    fn container(id: &str, service: &str, config_files: &str) -> ContainerRecord {
        ContainerRecord {
            id: String::from(id),
            name: format!("shop_{service}_1"),
            labels: HashMap::from([
                (String::from(labels::PROJECT_LABEL), String::from("shop")),
                (String::from(labels::SERVICE_LABEL), String::from(service)),
                (String::from(labels::CONFIG_FILES_LABEL), String::from(config_files)),
                (String::from(labels::WORKING_DIR_LABEL), String::from("/srv/shop")),
            ]),
            state: ContainerState::Running,
        }
    }

    /// Loader stub returning a fixed project while capturing its arguments.
    #[derive(Clone, Default)]
    struct RecordingLoader {
        calls: Arc<Mutex<Vec<(Vec<String>, PathBuf)>>>,
        project: Arc<Mutex<Option<Project>>>,
    }

    impl RecordingLoader {
        fn returning(project: Project) -> Self {
            let loader = Self::default();
            *loader.project.lock().unwrap() = Some(project);
            loader
        }

        fn calls(&self) -> Vec<(Vec<String>, PathBuf)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ProjectLoader for RecordingLoader {
        // Spelled out because the googletest prelude shadows `Result`.
        async fn load(&self, config_files: &[String], working_dir: &Path, project_name: &ProjectName) -> std::result::Result<Project, LoadProjectError> {
            self.calls.lock().unwrap().push((config_files.to_vec(), working_dir.to_path_buf()));
            self.project.lock().unwrap().clone()
                .ok_or_else(|| LoadProjectError::ReadFile {
                    path: String::from("app.yaml"),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
                .map(|mut project| {
                    project.name = Clone::clone(project_name);
                    project
                })
        }
    }

    #[tokio::test]
    async fn should_yield_an_empty_project_when_no_containers_exist() -> anyhow::Result<()> {
        let (_mock, runtime) = ContainerRuntime::new_mock();
        let loader = RecordingLoader::default();

        let project = project_from_container_labels(&runtime, &loader, &shop()).await?;

        assert_that!(project, eq(Project::empty(shop())));
        assert_that!(loader.calls(), empty());
        Ok(())
    }

    #[tokio::test]
    async fn should_synthesize_one_service_per_distinct_label_for_stdin_declarations() -> anyhow::Result<()> {
        let (mock, runtime) = ContainerRuntime::new_mock();
        mock.add_container(container("c1", "web", "-"));
        mock.add_container(container("c2", "web", "-"));
        mock.add_container(container("c3", "db", "-"));
        let loader = RecordingLoader::default();

        let project = project_from_container_labels(&runtime, &loader, &shop()).await?;

        let names: Vec<&str> = project.services.iter().map(|service| service.name.as_ref()).collect();
        assert_that!(names, eq(vec!["db", "web"]));
        assert_that!(project.services.iter().all(|service| service.depends_on.is_empty()), eq(true));
        assert_that!(loader.calls(), empty());
        Ok(())
    }

    #[tokio::test]
    async fn should_reparse_recovered_declaration_files_with_base_names() -> anyhow::Result<()> {
        let (mock, runtime) = ContainerRuntime::new_mock();
        mock.add_container(container("c1", "web", "/old/location/app.yaml,/old/location/app.override.yaml"));
        let declared = Project {
            name: shop(),
            services: vec![Service::new(ServiceName::try_from("web").unwrap())],
        };
        let loader = RecordingLoader::returning(Clone::clone(&declared));

        let project = project_from_container_labels(&runtime, &loader, &shop()).await?;

        assert_that!(project, eq(declared));
        assert_that!(loader.calls(), eq(vec![(
            vec![String::from("app.yaml"), String::from("app.override.yaml")],
            PathBuf::from("/srv/shop"),
        )]));
        Ok(())
    }

    #[tokio::test]
    async fn should_fail_when_the_recovered_declaration_cannot_be_parsed() -> anyhow::Result<()> {
        let (mock, runtime) = ContainerRuntime::new_mock();
        mock.add_container(container("c1", "web", "/srv/shop/app.yaml"));
        let loader = RecordingLoader::default(); // loads nothing, fails

        let result = project_from_container_labels(&runtime, &loader, &shop()).await;

        let error = result.unwrap_err();
        assert_that!(matches!(error, TearDownError::Parse { .. }), eq(true));
        Ok(())
    }

    #[tokio::test]
    async fn should_fail_fast_when_labels_are_missing() -> anyhow::Result<()> {
        let (mock, runtime) = ContainerRuntime::new_mock();
        let mut stripped = container("c1", "web", "/srv/shop/app.yaml");
        stripped.labels.remove(labels::WORKING_DIR_LABEL);
        mock.add_container(stripped);
        let loader = RecordingLoader::default();

        let result = project_from_container_labels(&runtime, &loader, &shop()).await;

        let error = result.unwrap_err();
        assert_that!(matches!(error, TearDownError::MissingLabels { .. }), eq(true));
        Ok(())
    }
}

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use undock_types::project::{IllegalServiceName, Project, ProjectName, Service, ServiceName};

/// Turns declaration files into a structured [`Project`].
///
/// During reconstruction the paths handed in are the base-named file names
/// recovered from container labels, resolved against the recovered working
/// directory.
#[async_trait::async_trait]
pub trait ProjectLoader: Send + Sync {
    async fn load(&self, config_files: &[String], working_dir: &Path, project_name: &ProjectName) -> Result<Project, LoadProjectError>;
}

#[derive(thiserror::Error, Debug)]
pub enum LoadProjectError {
    #[error("Failed to read declaration file '{path}': {source}")]
    ReadFile {
        path: String,
        #[source] source: std::io::Error,
    },
    #[error("Declaration file '{path}' is not a valid project definition:\n  {source}")]
    IllegalYaml {
        path: String,
        #[source] source: serde_yaml::Error,
    },
    #[error("Declaration file '{path}' declares an illegal service name: {source}")]
    IllegalServiceName {
        path: String,
        #[source] source: IllegalServiceName,
    },
}

/// Loads YAML declaration files with a `services:` mapping,
/// where each service may list the services it depends on:
///
/// ```yaml
/// services:
///   web:
///     depends_on:
///       - db
///   db: {}
/// ```
///
/// `depends_on` also accepts the long mapping form. Multiple files merge
/// left to right; later files add services and dependency edges. Services
/// are emitted in name order, so loading is deterministic.
pub struct YamlProjectLoader;

#[async_trait::async_trait]
impl ProjectLoader for YamlProjectLoader {
    async fn load(&self, config_files: &[String], working_dir: &Path, project_name: &ProjectName) -> Result<Project, LoadProjectError> {
        let mut services: BTreeMap<ServiceName, Service> = BTreeMap::new();

        for file in config_files {
            let path = working_dir.join(file);
            let display_path = path.display().to_string();

            let content = tokio::fs::read_to_string(&path).await
                .map_err(|source| LoadProjectError::ReadFile { path: Clone::clone(&display_path), source })?;

            let document = serde_yaml::from_str::<ProjectDocument>(&content)
                .map_err(|source| LoadProjectError::IllegalYaml { path: Clone::clone(&display_path), source })?;

            for (name, declaration) in document.services {
                let name = ServiceName::try_from(name)
                    .map_err(|source| LoadProjectError::IllegalServiceName { path: Clone::clone(&display_path), source })?;

                let service = services.entry(Clone::clone(&name))
                    .or_insert_with(|| Service::new(name));

                for dependency in declaration.unwrap_or_default().depends_on.names() {
                    let dependency = ServiceName::try_from(dependency)
                        .map_err(|source| LoadProjectError::IllegalServiceName { path: Clone::clone(&display_path), source })?;
                    if !service.depends_on.contains(&dependency) {
                        service.depends_on.push(dependency);
                    }
                }
            }
        }

        Ok(Project {
            name: Clone::clone(project_name),
            services: services.into_values().collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProjectDocument {
    services: BTreeMap<String, Option<ServiceDeclaration>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceDeclaration {
    #[serde(default)]
    depends_on: DependsOn,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependsOn {
    Names(Vec<String>),
    Detailed(BTreeMap<String, serde_yaml::Value>),
}

impl Default for DependsOn {
    fn default() -> Self {
        DependsOn::Names(Vec::new())
    }
}

impl DependsOn {
    fn names(self) -> Vec<String> {
        match self {
            DependsOn::Names(names) => names,
            DependsOn::Detailed(entries) => entries.into_keys().collect(),
        }
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Labels stamped onto containers and networks by the deployment path.
///
/// These four labels are the entire persisted contract the teardown
/// core depends on for reconstructing a project.
pub const PROJECT_LABEL: &str = "io.undock.project";
pub const SERVICE_LABEL: &str = "io.undock.service";
pub const CONFIG_FILES_LABEL: &str = "io.undock.config-files";
pub const WORKING_DIR_LABEL: &str = "io.undock.working-dir";

/// Placeholder recorded as declaration path when the application
/// was defined via stdin and no file exists on disk.
pub const STDIN_CONFIG_PATH: &str = "-";

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("Container is missing label '{label}'.")]
pub struct MissingLabel {
    pub label: &'static str,
}

/// Typed view onto the label map of a container belonging to a project.
///
/// Declaration paths are base-named, since the absolute-path components
/// recorded at deploy time may be stale by the time teardown runs.
/// The project label must be present, but its value is not carried:
/// containers are looked up by that label, so it always repeats the
/// project name the caller already holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectLabels {
    pub config_files: Vec<String>,
    pub working_dir: PathBuf,
}

impl ProjectLabels {

    pub fn try_from_labels(labels: &HashMap<String, String>) -> Result<Self, MissingLabel> {
        let read = |label: &'static str| {
            labels.get(label).cloned().ok_or(MissingLabel { label })
        };

        read(PROJECT_LABEL)?;

        let config_files = read(CONFIG_FILES_LABEL)?
            .split(',')
            .map(base_name)
            .collect::<Vec<_>>();

        Ok(Self {
            config_files,
            working_dir: PathBuf::from(read(WORKING_DIR_LABEL)?),
        })
    }

    /// Whether the project was declared via a transient stdin-provided definition.
    pub fn declared_via_stdin(&self) -> bool {
        self.config_files.first().is_some_and(|path| path == STDIN_CONFIG_PATH)
    }
}

fn base_name(path: &str) -> String {
    Path::new(path).file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from(path))
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn label_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries.iter()
            .map(|(key, value)| (String::from(*key), String::from(*value)))
            .collect()
    }

    #[test]
    fn should_read_the_declaration_labels() -> Result<()> {
        let labels = label_map(&[
            (PROJECT_LABEL, "shop"),
            (SERVICE_LABEL, "web"),
            (CONFIG_FILES_LABEL, "/srv/shop/app.yaml,/srv/shop/app.override.yaml"),
            (WORKING_DIR_LABEL, "/srv/shop"),
        ]);

        let result = ProjectLabels::try_from_labels(&labels)?;

        verify_that!(result.config_files, eq(vec![String::from("app.yaml"), String::from("app.override.yaml")]))?;
        verify_that!(result.working_dir, eq(PathBuf::from("/srv/shop")))?;
        verify_that!(result.declared_via_stdin(), eq(false))
    }

    #[test]
    fn should_require_the_project_label_even_though_its_value_is_redundant() -> Result<()> {
        let labels = label_map(&[
            (SERVICE_LABEL, "web"),
            (CONFIG_FILES_LABEL, "/srv/shop/app.yaml"),
            (WORKING_DIR_LABEL, "/srv/shop"),
        ]);

        let result = ProjectLabels::try_from_labels(&labels);

        verify_that!(result, err(eq(MissingLabel { label: PROJECT_LABEL })))
    }

    #[test]
    fn should_fail_fast_naming_the_missing_label() -> Result<()> {
        let labels = label_map(&[
            (PROJECT_LABEL, "shop"),
            (WORKING_DIR_LABEL, "/srv/shop"),
        ]);

        let result = ProjectLabels::try_from_labels(&labels);

        verify_that!(result, err(eq(MissingLabel { label: CONFIG_FILES_LABEL })))
    }

    #[test]
    fn should_recognize_the_stdin_sentinel() -> Result<()> {
        let labels = label_map(&[
            (PROJECT_LABEL, "shop"),
            (CONFIG_FILES_LABEL, "-"),
            (WORKING_DIR_LABEL, "/srv/shop"),
        ]);

        let result = ProjectLabels::try_from_labels(&labels)?;

        verify_that!(result.declared_via_stdin(), eq(true))
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of a deployed multi-service application instance.
///
/// Project names end up in runtime labels and network names,
/// so the character set is restricted accordingly.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub(crate) String);

impl ProjectName {

    pub const MAX_LENGTH: usize = 63;

    pub fn value(self) -> String {
        self.0
    }
}

#[derive(thiserror::Error, Clone, Debug)]
pub enum IllegalProjectName {
    #[error("Project name may not be empty.")]
    Empty,
    #[error("Project name '{value}' is too long. Expected at most {expected} characters, got {actual}.")]
    TooLong { value: String, expected: usize, actual: usize },
    #[error("Project name '{value}' contains invalid characters.")]
    InvalidCharacter { value: String },
}

impl TryFrom<String> for ProjectName {

    type Error = IllegalProjectName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(IllegalProjectName::Empty)
        }
        else if value.len() > Self::MAX_LENGTH {
            Err(IllegalProjectName::TooLong { actual: value.len(), expected: Self::MAX_LENGTH, value })
        }
        else if value.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_') {
            Ok(Self(value))
        }
        else {
            Err(IllegalProjectName::InvalidCharacter { value })
        }
    }
}

impl TryFrom<&str> for ProjectName {

    type Error = IllegalProjectName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ProjectName::try_from(String::from(value))
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of one declared unit of an application.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceName(pub(crate) String);

impl ServiceName {
    pub fn value(self) -> String {
        self.0
    }
}

#[derive(thiserror::Error, Clone, Debug)]
#[error("Service name may not be empty.")]
pub struct IllegalServiceName;

impl TryFrom<String> for ServiceName {

    type Error = IllegalServiceName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(IllegalServiceName)
        } else {
            Ok(Self(value))
        }
    }
}

impl TryFrom<&str> for ServiceName {

    type Error = IllegalServiceName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ServiceName::try_from(String::from(value))
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One declared unit of an application together with the services it depends on.
///
/// Read-only during teardown.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: ServiceName,
    pub depends_on: Vec<ServiceName>,
}

impl Service {
    pub fn new(name: ServiceName) -> Self {
        Self { name, depends_on: Vec::new() }
    }
}

/// The declared multi-service application: name plus services and their dependency edges.
///
/// A reconstructed project may carry no services at all,
/// when no containers of the project are left on the runtime.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: ProjectName,
    pub services: Vec<Service>,
}

impl Project {

    pub fn empty(name: ProjectName) -> Self {
        Self { name, services: Vec::new() }
    }
}

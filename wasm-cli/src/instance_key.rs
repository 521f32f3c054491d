//! Composite `project:instanceName` key used to address a running instance.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("instance key \"{0}\" has no ':' between project and instance name")]
    MissingDelimiter(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub project: String,
    pub name: String,
}

impl InstanceKey {
    /// Split `key` on its first colon. Any later colons stay in the name.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let (project, name) = key
            .split_once(':')
            .ok_or_else(|| KeyError::MissingDelimiter(key.to_string()))?;
        Ok(Self {
            project: project.to_string(),
            name: name.to_string(),
        })
    }
}

impl FromStr for InstanceKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.name)
    }
}

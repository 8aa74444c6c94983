//! Project identity scoping the canonical namespace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const MAX_LEN: usize = 128;

/// Stable name of one project, usable as a single object key segment.
///
/// Identities are non-empty, at most 128 characters, free of `/` and control
/// characters, and never `.` or `..`. Because an identity is exactly one key
/// segment, keys derived from distinct identities never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectIdentity(String);

impl ProjectIdentity {
    /// Validates `name` as a project identity.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name.chars().count() > MAX_LEN {
            Some("name is longer than 128 characters")
        } else if name == "." || name == ".." {
            Some("name is a relative path component")
        } else if name.contains('/') {
            Some("name contains '/'")
        } else if name.chars().any(char::is_control) {
            Some("name contains control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::invalid_project(name, reason)),
            None => Ok(Self(name)),
        }
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProjectIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProjectIdentity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProjectIdentity> for String {
    fn from(project: ProjectIdentity) -> Self {
        project.0
    }
}

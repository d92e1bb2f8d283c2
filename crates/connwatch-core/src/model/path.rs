// ── Object path identity ──
//
// Every remote object is identified by a stable bus object path. Paths
// are the primary keys of both replica collections.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable identifier of a remote object (e.g.
/// `/net/connman/service/wifi_0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Qualify a notification path against the service namespace.
    ///
    /// Per-object signals carry the path tail (`wifi_0`); the replica keys
    /// on the full path. Absolute paths pass through untouched.
    pub fn qualify(namespace: &str, kind: &str, tail: &str) -> Self {
        if tail.starts_with('/') {
            Self(tail.to_owned())
        } else {
            Self(format!("{namespace}/{kind}/{tail}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for ObjectPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObjectPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

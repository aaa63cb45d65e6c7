//! Identifier types for implex
//!
//! This module provides type-safe wrapper types for the string identifiers the
//! documentation generator emits, preventing capability keys and crate
//! identifiers from being mixed at compile time. Both are opaque to implex:
//! they are compared and ordered, never parsed.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Type-safe wrapper for capability keys
///
/// A capability key names one documented interface or contract (for example a
/// fully qualified trait path). Each fragment contributes descriptors for
/// exactly one capability.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityKey(String);

/// Type-safe wrapper for crate identifiers
///
/// Crate identifiers key the merged index: every implementor descriptor is
/// filed under the crate that defines the implementing type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrateId(String);

impl CapabilityKey {
    /// Create a capability key from a generator-supplied identifier
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// View the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CrateId {
    /// Create a crate identifier from a generator-supplied identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// View the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CapabilityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for CrateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CapabilityKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CapabilityKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CrateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CrateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

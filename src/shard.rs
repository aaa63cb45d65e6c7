//! Shard structures for implex
//!
//! A shard is the unit one documentation fragment publishes: the capability it
//! documents plus an ordered list of implementor descriptors per crate. Shards
//! arrive from the generator fully constructed and are treated as immutable by
//! the aggregation protocol.

use crate::identifiers::{CapabilityKey, CrateId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// An opaque, pre-rendered implementor descriptor
///
/// The generator emits descriptors as display-ready strings. Implex never
/// parses, validates, or transforms their contents; its only obligations are
/// to preserve each descriptor byte-for-byte and to keep per-crate descriptor
/// order stable across the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImplementorDescriptor(String);

impl ImplementorDescriptor {
    /// Wrap a generator-rendered descriptor string
    pub fn new(rendered: impl Into<String>) -> Self {
        Self(rendered.into())
    }

    /// View the rendered descriptor
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ImplementorDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ImplementorDescriptor {
    fn from(rendered: &str) -> Self {
        Self::new(rendered)
    }
}

impl From<String> for ImplementorDescriptor {
    fn from(rendered: String) -> Self {
        Self(rendered)
    }
}

/// One fragment's contribution to the implementors index
///
/// An IndexShard carries the implementors of a single capability, grouped by
/// the crate that defines each implementing type. Within a crate the descriptor
/// sequence is ordered as the generator emitted it; the aggregator preserves
/// that order when appending into the merged index.
///
/// The serialized form matches the generator's wire format: the capability key
/// plus a map from crate identifier to descriptor list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexShard {
    /// The capability whose implementors this shard lists
    capability: CapabilityKey,
    /// Implementor descriptors grouped by defining crate
    entries: BTreeMap<CrateId, Vec<ImplementorDescriptor>>,
}

impl IndexShard {
    /// Create an empty shard for the given capability
    pub fn new(capability: impl Into<CapabilityKey>) -> Self {
        Self {
            capability: capability.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Append descriptors for a crate, extending any existing entry (builder style)
    pub fn with_descriptors<I, D>(mut self, crate_id: impl Into<CrateId>, descriptors: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<ImplementorDescriptor>,
    {
        self.entries
            .entry(crate_id.into())
            .or_default()
            .extend(descriptors.into_iter().map(Into::into));
        self
    }

    /// The capability this shard documents
    pub fn capability(&self) -> &CapabilityKey {
        &self.capability
    }

    /// Iterate crate entries and their descriptor sequences
    pub fn entries(&self) -> impl Iterator<Item = (&CrateId, &[ImplementorDescriptor])> {
        self.entries.iter().map(|(id, descriptors)| (id, descriptors.as_slice()))
    }

    /// Descriptors contributed for a specific crate, if any
    pub fn descriptors_for(&self, crate_id: &CrateId) -> Option<&[ImplementorDescriptor]> {
        self.entries.get(crate_id).map(Vec::as_slice)
    }

    /// Number of crates this shard contributes to
    pub fn crate_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of descriptors across all crates in this shard
    pub fn descriptor_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// True when the shard carries no descriptors
    ///
    /// An empty shard is valid: it records that a capability currently has no
    /// known implementors.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}

//! Merged implementors index
//!
//! The merged index is the accumulation of every shard the aggregator has seen
//! so far, keyed by crate identifier. The merge is strictly append-only: an
//! existing crate's descriptor sequence is only ever extended at the tail, so a
//! consumer that has already rendered a prefix never needs to re-examine it.

use crate::identifiers::CrateId;
use crate::shard::{ImplementorDescriptor, IndexShard};
use serde::Serialize;
use std::collections::BTreeMap;

/// Accumulated implementors index across all merged shards
///
/// Iteration across crate identifiers is lexicographic (deterministic for
/// rendering); within one crate, descriptors appear in the order their shards
/// were published.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedIndex {
    entries: BTreeMap<CrateId, Vec<ImplementorDescriptor>>,
    merged_shards: usize,
}

impl MergedIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one shard's entries into the index
    ///
    /// For each crate in the shard, its descriptor sequence is appended to the
    /// crate's existing sequence, creating the entry if absent. Existing
    /// descriptors are never rewritten or reordered.
    pub fn merge_shard(&mut self, shard: &IndexShard) {
        for (crate_id, descriptors) in shard.entries() {
            self.entries
                .entry(crate_id.clone())
                .or_default()
                .extend_from_slice(descriptors);
        }
        self.merged_shards += 1;
    }

    /// Descriptors accumulated for a specific crate, if any
    pub fn descriptors_for(&self, crate_id: &CrateId) -> Option<&[ImplementorDescriptor]> {
        self.entries.get(crate_id).map(Vec::as_slice)
    }

    /// Iterate crates and their accumulated descriptor sequences
    pub fn iter(&self) -> impl Iterator<Item = (&CrateId, &[ImplementorDescriptor])> {
        self.entries.iter().map(|(id, descriptors)| (id, descriptors.as_slice()))
    }

    /// Crate identifiers present in the index, in lexicographic order
    pub fn crate_ids(&self) -> impl Iterator<Item = &CrateId> {
        self.entries.keys()
    }

    /// Number of crates with at least one entry
    pub fn crate_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of descriptors across all crates
    pub fn descriptor_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Number of shards merged so far
    pub fn merged_shards(&self) -> usize {
        self.merged_shards
    }

    /// True when no shard has contributed any descriptor
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

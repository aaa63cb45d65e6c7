//! Implex - order-independent aggregation of implementors-index shards
//!
//! Implex implements the registration and merge protocol behind an incrementally
//! loaded documentation index. Each documented capability (a trait or interface)
//! ships as an independent fragment that contributes one [`IndexShard`]: a mapping
//! from crate identifier to the pre-rendered implementor descriptors for that
//! capability. Fragments load in an order the index does not control, and the
//! consumer that renders the merged index may become ready before, between, or
//! after any of them.
//!
//! The [`IndexAggregator`] reconciles the two sides: shards published before a
//! consumer attaches are buffered in publish order; attaching drains the buffer
//! into the [`MergedIndex`] and delivers it; shards published afterwards are
//! merged and delivered immediately. No shard is ever dropped and none is merged
//! twice, regardless of interleaving.
//!
//! [`IndexRegistry`] wraps the aggregator in a cloneable, lock-guarded handle so
//! independent fragment call sites and the consumer share one aggregator whose
//! lifetime is established by an explicit constructor rather than ambient global
//! state.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod identifiers;
pub mod merged_index;
pub mod registry;
pub mod shard;

pub use aggregator::{AggregatorStats, ConsumerCallback, IndexAggregator};
pub use config::AggregatorConfig;
pub use error::ImplexError;
pub use identifiers::{CapabilityKey, CrateId};
pub use merged_index::MergedIndex;
pub use registry::{IndexRegistry, ShardPublisher};
pub use shard::{ImplementorDescriptor, IndexShard};

/// Type alias for Results using ImplexError
pub type Result<T> = std::result::Result<T, ImplexError>;

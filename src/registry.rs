//! Shared registry handle for fragments and the consumer
//!
//! The original protocol hung its aggregator off ambient page-global state.
//! Here the page-wide lifetime is made explicit: an [`IndexRegistry`] is
//! constructed once per page (or per test), cloned to every fragment call site
//! as a [`ShardPublisher`], and handed to the rendering layer for the single
//! `attach`. Internally the aggregator sits behind a `parking_lot::Mutex`, so
//! the serialization the host page's single-threaded turns provided for free
//! is preserved on multi-threaded hosts; the lock order defines publish order.

use crate::aggregator::{AggregatorStats, DeliveryGuard, IndexAggregator};
use crate::config::AggregatorConfig;
use crate::error::ImplexError;
use crate::merged_index::MergedIndex;
use crate::shard::IndexShard;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use tracing::warn;

struct RegistryInner {
    aggregator: Mutex<IndexAggregator>,
    /// Shared view of the aggregator's delivery guard, checked before locking
    /// so a callback that calls back into the registry on its own thread
    /// errors instead of deadlocking on the mutex. Other threads fall through
    /// and serialize on the lock.
    delivering: Arc<DeliveryGuard>,
}

/// Cloneable handle to one page-scoped aggregator
#[derive(Clone)]
pub struct IndexRegistry {
    inner: Arc<RegistryInner>,
}

impl IndexRegistry {
    /// Create a registry with the default configuration
    pub fn new() -> Self {
        Self::from_aggregator(IndexAggregator::new())
    }

    /// Create a registry with a validated configuration
    pub fn with_config(config: AggregatorConfig) -> Result<Self, ImplexError> {
        Ok(Self::from_aggregator(IndexAggregator::with_config(config)?))
    }

    fn from_aggregator(aggregator: IndexAggregator) -> Self {
        let delivering = aggregator.delivery_guard();
        Self {
            inner: Arc::new(RegistryInner {
                aggregator: Mutex::new(aggregator),
                delivering,
            }),
        }
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, IndexAggregator>, ImplexError> {
        if self.inner.delivering.held_by_current_thread() {
            warn!("rejecting {} invoked from inside the consumer callback", operation);
            return Err(ImplexError::reentrant_call(operation));
        }
        Ok(self.inner.aggregator.lock())
    }

    /// Hand out a publisher call site for one fragment
    pub fn publisher(&self) -> ShardPublisher {
        ShardPublisher {
            registry: self.clone(),
        }
    }

    /// Publish one shard into the shared aggregator
    pub fn publish(&self, shard: IndexShard) -> Result<(), ImplexError> {
        self.lock("publish")?.publish(shard)
    }

    /// Attach the consumer callback, draining any buffered shards
    pub fn attach<F>(&self, callback: F) -> Result<(), ImplexError>
    where
        F: FnMut(&MergedIndex) + Send + 'static,
    {
        self.lock("attach")?.attach(Box::new(callback))
    }

    /// Snapshot of the merged index accumulated so far
    ///
    /// Calling this from inside the consumer callback is rejected with
    /// [`ImplexError::ReentrantCall`]; the callback already receives the
    /// current index as its argument.
    pub fn merged(&self) -> Result<MergedIndex, ImplexError> {
        Ok(self.lock("merged")?.merged().clone())
    }

    /// Whether a consumer has attached
    pub fn is_attached(&self) -> Result<bool, ImplexError> {
        Ok(self.lock("is_attached")?.is_attached())
    }

    /// Current aggregator statistics
    pub fn stats(&self) -> Result<AggregatorStats, ImplexError> {
        Ok(self.lock("stats")?.stats())
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One fragment's fire-and-forget publish call site
///
/// Each fragment holds a clone and calls [`publish`] exactly once when it
/// finishes loading. The result is `Err` only for the re-entrancy contract
/// violation, so fragment call sites may ignore it.
///
/// [`publish`]: ShardPublisher::publish
#[derive(Clone)]
pub struct ShardPublisher {
    registry: IndexRegistry,
}

impl ShardPublisher {
    /// Announce this fragment's shard to the aggregator
    pub fn publish(&self, shard: IndexShard) -> Result<(), ImplexError> {
        self.registry.publish(shard)
    }
}

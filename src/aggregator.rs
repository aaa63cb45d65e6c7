//! Buffer-then-drain aggregation of published shards
//!
//! This module implements the core of the registration protocol: reconciling
//! an arbitrary publish order against a single, possibly later, consumer
//! attachment. Shards published before attachment are buffered in publish
//! order; `attach` drains the buffer into the merged index and delivers the
//! result; shards published after attachment are merged and delivered
//! immediately. The aggregator holds the only mutable protocol state, so the
//! whole mechanism is testable without simulating a host page.

use crate::config::AggregatorConfig;
use crate::error::ImplexError;
use crate::merged_index::MergedIndex;
use crate::shard::IndexShard;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

/// Marks the thread currently running the consumer callback
///
/// Re-entrancy is a property of one thread's call stack: only a call made from
/// the delivering thread itself can be inside the callback. Calls from other
/// threads while a delivery runs are ordinary contention and must serialize on
/// the aggregator's lock instead of being rejected.
#[derive(Default)]
pub(crate) struct DeliveryGuard {
    delivering: Mutex<Option<ThreadId>>,
}

impl DeliveryGuard {
    fn begin(&self) {
        *self.delivering.lock() = Some(thread::current().id());
    }

    fn end(&self) {
        *self.delivering.lock() = None;
    }

    /// True when the calling thread is the one running the consumer callback
    pub(crate) fn held_by_current_thread(&self) -> bool {
        *self.delivering.lock() == Some(thread::current().id())
    }
}

/// Callback invoked with the merged index after each delivery
///
/// The callback receives the full merged index rather than a delta, so a
/// consumer's render pass needs no merge logic of its own. Callbacks must not
/// call back into the aggregator synchronously; such calls are rejected with
/// [`ImplexError::ReentrantCall`].
pub type ConsumerCallback = Box<dyn FnMut(&MergedIndex) + Send>;

/// Snapshot of aggregator state for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregatorStats {
    /// Shards accepted by publish so far
    pub published_shards: usize,
    /// Shards buffered awaiting a consumer
    pub pending_shards: usize,
    /// Shards merged into the index
    pub merged_shards: usize,
    /// Crates with at least one merged descriptor
    pub merged_crates: usize,
    /// Descriptors merged across all crates
    pub total_descriptors: usize,
    /// Whether a consumer is attached
    pub attached: bool,
}

/// Order-independent fan-in of shards to one late-binding consumer
///
/// The aggregator moves through two phases. While no consumer is attached,
/// published shards are buffered and nothing is merged. `attach` switches
/// phase permanently: the backlog is merged in original publish order and
/// delivered, and every later publish merges and delivers immediately. No
/// shard is dropped and none is merged twice, whatever the interleaving of
/// publishes and the one attach.
pub struct IndexAggregator {
    /// Aggregation behavior knobs
    config: AggregatorConfig,
    /// Accumulated index across all merged shards
    merged: MergedIndex,
    /// Shards published before attachment, in publish order
    pending: Vec<IndexShard>,
    /// Consumer callback, present once attached
    consumer: Option<ConsumerCallback>,
    /// Identity of the thread running the consumer callback, while one is
    delivering: Arc<DeliveryGuard>,
    /// Shards accepted by publish, buffered or merged
    published_shards: usize,
}

impl IndexAggregator {
    /// Create an aggregator with the default configuration
    pub fn new() -> Self {
        Self::from_config(AggregatorConfig::default())
    }

    /// Create an aggregator with a validated configuration
    pub fn with_config(config: AggregatorConfig) -> Result<Self, ImplexError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: AggregatorConfig) -> Self {
        let pending = Vec::with_capacity(config.pending_capacity);
        Self {
            config,
            merged: MergedIndex::new(),
            pending,
            consumer: None,
            delivering: Arc::new(DeliveryGuard::default()),
            published_shards: 0,
        }
    }

    /// Accept one shard from a fragment
    ///
    /// Before attachment the shard is buffered; afterwards it is merged into
    /// the index and the consumer is invoked with the updated index. The only
    /// error path is a re-entrant call from inside the consumer callback.
    pub fn publish(&mut self, shard: IndexShard) -> Result<(), ImplexError> {
        if self.delivering.held_by_current_thread() {
            warn!("rejecting publish invoked from inside the consumer callback");
            return Err(ImplexError::reentrant_call("publish"));
        }

        self.published_shards += 1;

        if self.consumer.is_some() {
            self.merged.merge_shard(&shard);
            debug!(
                "merged shard for capability {} ({} shards total), delivering",
                shard.capability(),
                self.merged.merged_shards()
            );
            self.deliver();
        } else {
            debug!(
                "buffering shard for capability {} ({} pending) until a consumer attaches",
                shard.capability(),
                self.pending.len() + 1
            );
            self.pending.push(shard);
        }

        Ok(())
    }

    /// Attach the consumer and drain any buffered shards
    ///
    /// Buffered shards are merged in original publish order and the consumer
    /// is invoked once with the resulting index. When nothing was buffered the
    /// consumer is not invoked unless the configuration opts into an empty
    /// first delivery; the empty index remains observable through [`merged`].
    /// A second attach is rejected and the first consumer is kept.
    ///
    /// [`merged`]: IndexAggregator::merged
    pub fn attach(&mut self, callback: ConsumerCallback) -> Result<(), ImplexError> {
        if self.delivering.held_by_current_thread() {
            warn!("rejecting attach invoked from inside the consumer callback");
            return Err(ImplexError::reentrant_call("attach"));
        }

        if self.consumer.is_some() {
            warn!("rejecting second attach; keeping the first consumer");
            return Err(ImplexError::already_attached());
        }

        self.consumer = Some(callback);

        let backlog = std::mem::take(&mut self.pending);
        let drained = backlog.len();
        for shard in &backlog {
            self.merged.merge_shard(shard);
        }
        debug!("consumer attached, drained {} buffered shard(s)", drained);

        if drained > 0 || self.config.deliver_empty_on_attach {
            self.deliver();
        }

        Ok(())
    }

    /// Invoke the consumer with the current merged index
    fn deliver(&mut self) {
        if let Some(callback) = self.consumer.as_mut() {
            self.delivering.begin();
            callback(&self.merged);
            self.delivering.end();
        }
    }

    /// View the merged index accumulated so far
    pub fn merged(&self) -> &MergedIndex {
        &self.merged
    }

    /// Whether a consumer has attached
    pub fn is_attached(&self) -> bool {
        self.consumer.is_some()
    }

    /// Current aggregator statistics
    pub fn stats(&self) -> AggregatorStats {
        AggregatorStats {
            published_shards: self.published_shards,
            pending_shards: self.pending.len(),
            merged_shards: self.merged.merged_shards(),
            merged_crates: self.merged.crate_count(),
            total_descriptors: self.merged.descriptor_count(),
            attached: self.consumer.is_some(),
        }
    }

    /// Shared guard naming the thread inside the consumer callback, if any
    ///
    /// Wrappers that place the aggregator behind a lock check this guard
    /// before locking: a call from the delivering thread fails loudly instead
    /// of deadlocking, while calls from other threads serialize on the lock.
    pub(crate) fn delivery_guard(&self) -> Arc<DeliveryGuard> {
        Arc::clone(&self.delivering)
    }
}

impl Default for IndexAggregator {
    fn default() -> Self {
        Self::new()
    }
}

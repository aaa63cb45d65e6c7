//! Configuration structures for implex
//!
//! This module provides the configuration system for the aggregator, including
//! parameter validation and builder pattern implementation.

use crate::error::ImplexError;
use serde::{Deserialize, Serialize};

/// Configuration for aggregator behavior
///
/// The default configuration matches the observed protocol: buffered shards
/// are drained and delivered at attach, and an attach that finds no buffered
/// shards delivers nothing (the consumer reads the empty index through the
/// snapshot accessor instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Capacity hint for the pending-shard buffer
    pub pending_capacity: usize,
    /// Invoke the consumer once with the empty index when attach finds no
    /// buffered shards
    ///
    /// Off by default: absence of a delivery signals "no implementors yet".
    /// Consumers that want an unconditional first render opt in.
    pub deliver_empty_on_attach: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            pending_capacity: 16,
            deliver_empty_on_attach: false,
        }
    }
}

impl AggregatorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity hint for the pending-shard buffer
    pub fn pending_capacity(mut self, capacity: usize) -> Self {
        self.pending_capacity = capacity;
        self
    }

    /// Enable or disable delivery of the empty index at attach
    pub fn deliver_empty_on_attach(mut self, enabled: bool) -> Self {
        self.deliver_empty_on_attach = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ImplexError> {
        if self.pending_capacity == 0 {
            return Err(ImplexError::config_error(
                "pending_capacity",
                "must be greater than 0",
                "Set pending_capacity to the expected number of fragments (recommended: 16-256)",
            ));
        }

        Ok(())
    }

    /// Build the configuration after validation
    pub fn build(self) -> Result<Self, ImplexError> {
        self.validate()?;
        Ok(self)
    }
}

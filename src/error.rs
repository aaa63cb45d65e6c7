//! Error types for implex operations
//!
//! The error taxonomy is deliberately small: the aggregation protocol has no
//! recoverable runtime failures, only caller-contract violations that should
//! fail loudly instead of silently corrupting ordering guarantees.

use thiserror::Error;

/// Main error type for all implex operations
#[derive(Debug, Error)]
pub enum ImplexError {
    /// A consumer is already attached to the aggregator
    #[error("Consumer already attached: {reason}. {suggestion}")]
    AlreadyAttached { reason: String, suggestion: String },

    /// An aggregator operation was invoked from inside the consumer callback
    #[error("Re-entrant call: {operation} invoked from inside the consumer callback. {suggestion}")]
    ReentrantCall {
        operation: String,
        suggestion: String,
    },

    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImplexError {
    /// Create an already-attached error
    pub fn already_attached() -> Self {
        Self::AlreadyAttached {
            reason: "attach may be called at most once per aggregator".to_string(),
            suggestion: "Keep the first consumer; create a new aggregator if a different consumer is needed"
                .to_string(),
        }
    }

    /// Create a re-entrant call error for the named operation
    pub fn reentrant_call(operation: impl Into<String>) -> Self {
        Self::ReentrantCall {
            operation: operation.into(),
            suggestion: "Defer the call until the consumer callback has returned".to_string(),
        }
    }

    /// Create a detailed config error
    pub fn config_error(field: impl Into<String>, reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Config(format!("{} - {}: {}", field.into(), reason.into(), suggestion.into()))
    }

    /// Check if this error represents a caller-contract violation
    ///
    /// Contract violations indicate a bug in the host integration rather than a
    /// condition the aggregator can recover from.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::AlreadyAttached { .. } | Self::ReentrantCall { .. })
    }
}

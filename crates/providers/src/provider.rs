//! The provider trait
//!
//! A provider is an adapter to one external generation API. Providers are
//! stateless between calls apart from availability checks; everything a
//! call needs arrives in the input map and [`ExecuteOptions`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProviderError;

/// Input values for one provider call, keyed by handle/parameter ID
pub type ProviderInput = HashMap<String, serde_json::Value>;

/// Output values produced by one provider call, keyed by output handle ID
pub type ProviderOutputs = HashMap<String, serde_json::Value>;

/// Options for one provider call
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Overall deadline for the call. `None` leaves the provider's own
    /// configured default in force; the registry never enforces one.
    pub timeout: Option<Duration>,
    /// Cooperative cancellation flag. Honored only if the provider
    /// implementation checks it; there is no forced abort.
    pub abort: Option<Arc<AtomicBool>>,
}

impl ExecuteOptions {
    /// Whether the caller has requested cancellation
    pub fn is_aborted(&self) -> bool {
        self.abort
            .as_ref()
            .map(|flag| flag.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

/// Successful result of one provider call
#[derive(Debug, Clone)]
pub struct ProviderResult {
    /// ID of the provider that produced the result
    pub provider: String,
    /// Output values keyed by output handle ID
    pub outputs: ProviderOutputs,
    /// Cost the provider reports for the call, in credit units, when the
    /// backend exposes one. Stored for audit; billing uses the
    /// pre-execution estimate.
    pub actual_cost: Option<i64>,
}

impl ProviderResult {
    /// Create a result with the given outputs and no reported cost
    pub fn new(provider: impl Into<String>, outputs: ProviderOutputs) -> Self {
        Self {
            provider: provider.into(),
            outputs,
            actual_cost: None,
        }
    }

    /// Attach a provider-reported cost
    pub fn with_actual_cost(mut self, cost: i64) -> Self {
        self.actual_cost = Some(cost);
        self
    }
}

/// An adapter to one external generation backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier, used in mappings and transaction records
    fn id(&self) -> &str;

    /// Health check. A provider reporting unavailable is skipped by the
    /// fallback chain, not treated as a failure.
    async fn is_available(&self) -> bool;

    /// Validate input against this provider's own requirements before
    /// the call is made
    fn validate_input(&self, input: &ProviderInput) -> Result<(), ProviderError>;

    /// Perform the call
    async fn execute(
        &self,
        input: ProviderInput,
        options: &ExecuteOptions,
    ) -> Result<ProviderResult, ProviderError>;

    /// Estimate the cost of a call in credit units, if this provider can.
    ///
    /// `None` defers to the node type's configured cost formula.
    fn estimate_cost(&self, node_type: &str, input: &ProviderInput) -> Option<i64> {
        let _ = (node_type, input);
        None
    }
}

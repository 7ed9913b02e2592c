//! Provider registry and fallback-chain execution
//!
//! Maps each node type to an ordered list of interchangeable providers and
//! executes them with fallback-on-failure semantics: first success wins,
//! non-retryable errors abort the whole chain, and an exhausted chain
//! reports every attempt it made.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderAttempt, ProviderError};
use crate::provider::{ExecuteOptions, Provider, ProviderInput, ProviderResult};

/// Ordered provider list for one node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProviderMapping {
    /// The node type this mapping serves
    pub node_type: String,
    /// Provider tried first
    pub primary_provider: String,
    /// Providers tried in order after the primary
    #[serde(default)]
    pub fallback_providers: Vec<String>,
}

impl NodeProviderMapping {
    /// The full attempt order: primary followed by fallbacks
    pub fn chain(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_provider.as_str())
            .chain(self.fallback_providers.iter().map(|s| s.as_str()))
    }
}

/// Registry of providers and their node-type mappings
///
/// Constructed explicitly at startup and injected into the orchestrator;
/// not a process-wide singleton.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    mappings: HashMap<String, NodeProviderMapping>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own declared ID.
    ///
    /// Re-registration overwrites with a warning; last writer wins.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let id = provider.id().to_string();
        if self.providers.contains_key(&id) {
            log::warn!("provider '{}' registered twice; overwriting previous instance", id);
        }
        self.providers.insert(id, provider);
    }

    /// Declare the ordered attempt list for a node type
    pub fn set_node_mapping(
        &mut self,
        node_type: impl Into<String>,
        primary_provider: impl Into<String>,
        fallback_providers: Vec<String>,
    ) {
        let node_type = node_type.into();
        self.mappings.insert(
            node_type.clone(),
            NodeProviderMapping {
                node_type,
                primary_provider: primary_provider.into(),
                fallback_providers,
            },
        );
    }

    /// Get a registered provider by ID
    pub fn get(&self, provider_id: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(provider_id)
    }

    /// Get the mapping for a node type
    pub fn mapping(&self, node_type: &str) -> Option<&NodeProviderMapping> {
        self.mappings.get(node_type)
    }

    /// Whether any provider chain is configured for a node type
    pub fn has_mapping(&self, node_type: &str) -> bool {
        self.mappings.contains_key(node_type)
    }

    /// Execute a node type's provider chain.
    ///
    /// 1. Resolve the ordered provider list; an empty/missing list is a
    ///    configuration defect and fails immediately as non-retryable.
    /// 2. Skip providers that are unregistered or report unavailable
    ///    (logged, not failed).
    /// 3. Validate input against the provider's own requirements, then
    ///    call it.
    /// 4. First success wins; later providers are never consulted.
    /// 5. A non-retryable failure aborts the chain and surfaces as-is;
    ///    the input is at fault, so switching providers would not help.
    /// 6. Retryable failures are recorded and the next provider is tried.
    /// 7. An exhausted chain fails with every attempted provider and its
    ///    error enumerated.
    pub async fn execute_with_fallback(
        &self,
        node_type: &str,
        input: ProviderInput,
        options: &ExecuteOptions,
    ) -> Result<ProviderResult, ProviderError> {
        let Some(mapping) = self.mappings.get(node_type) else {
            return Err(ProviderError::unavailable(format!(
                "no providers configured for node type '{}'",
                node_type
            ))
            .with_retryable(false));
        };

        let mut attempts: Vec<ProviderAttempt> = Vec::new();

        for provider_id in mapping.chain() {
            let Some(provider) = self.providers.get(provider_id) else {
                log::warn!(
                    "provider '{}' mapped for '{}' but not registered; skipping",
                    provider_id,
                    node_type
                );
                continue;
            };

            if !provider.is_available().await {
                log::info!("provider '{}' unavailable; trying next in chain", provider_id);
                continue;
            }

            let call = async {
                provider.validate_input(&input)?;
                provider.execute(input.clone(), options).await
            };

            match call.await {
                Ok(mut result) => {
                    // The registry, not the provider, is authoritative for
                    // which ID produced the result.
                    result.provider = provider_id.to_string();
                    return Ok(result);
                }
                Err(err) if !err.retryable => {
                    log::warn!(
                        "provider '{}' failed non-retryably for '{}': {}",
                        provider_id,
                        node_type,
                        err
                    );
                    return Err(err);
                }
                Err(err) => {
                    log::warn!(
                        "provider '{}' failed for '{}', falling back: {}",
                        provider_id,
                        node_type,
                        err
                    );
                    attempts.push(ProviderAttempt {
                        provider: provider_id.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        Err(ProviderError::exhausted(attempts))
    }

    /// Estimate the cost of a call, delegating to the *primary* provider
    /// only. Fallbacks are assumed cost-equivalent for estimation, a
    /// known simplification.
    pub fn estimate_cost(&self, node_type: &str, input: &ProviderInput) -> Option<i64> {
        let mapping = self.mappings.get(node_type)?;
        self.providers
            .get(&mapping.primary_provider)?
            .estimate_cost(node_type, input)
    }
}

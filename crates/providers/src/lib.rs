//! Providers - generation backend abstraction for Skein
//!
//! Each node type that performs real work maps to an ordered list of
//! interchangeable providers. The registry executes that list with
//! fallback-on-failure semantics:
//!
//! - first success wins; later providers are never consulted
//! - a non-retryable error aborts the chain (the input is at fault)
//! - an exhausted chain reports every attempt it made
//!
//! Providers implement the [`Provider`] trait; the bundled
//! [`HttpProvider`] covers OpenAI-compatible endpoints.

pub mod error;
pub mod http;
pub mod provider;
pub mod registry;

// Re-export key types
pub use error::{ProviderAttempt, ProviderError, ProviderErrorCode};
pub use http::{HttpProvider, HttpProviderConfig};
pub use provider::{ExecuteOptions, Provider, ProviderInput, ProviderOutputs, ProviderResult};
pub use registry::{NodeProviderMapping, ProviderRegistry};

//! Provider error taxonomy
//!
//! Every provider failure carries a code from a fixed set plus its own
//! `retryable` flag. Fallback behavior is driven by the flag alone; the
//! code's default can be overridden per deployment, so a caller may e.g.
//! treat quota exhaustion as final without touching the chain logic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Enumerated provider failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderErrorCode {
    RateLimited,
    Timeout,
    InvalidInput,
    InvalidOutput,
    AuthenticationFailed,
    QuotaExceeded,
    ProviderUnavailable,
    ContentModeration,
    UnknownError,
}

impl ProviderErrorCode {
    /// Default retryability for this code.
    ///
    /// Non-retryable codes indicate the *input* is at fault, so switching
    /// providers would not help. Everything provider-side defaults to
    /// retryable and falls through the chain.
    pub fn default_retryable(&self) -> bool {
        match self {
            Self::InvalidInput | Self::ContentModeration => false,
            Self::RateLimited
            | Self::Timeout
            | Self::InvalidOutput
            | Self::AuthenticationFailed
            | Self::QuotaExceeded
            | Self::ProviderUnavailable
            | Self::UnknownError => true,
        }
    }

    /// Stable kebab-case name, matching the wire format
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate-limited",
            Self::Timeout => "timeout",
            Self::InvalidInput => "invalid-input",
            Self::InvalidOutput => "invalid-output",
            Self::AuthenticationFailed => "authentication-failed",
            Self::QuotaExceeded => "quota-exceeded",
            Self::ProviderUnavailable => "provider-unavailable",
            Self::ContentModeration => "content-moderation",
            Self::UnknownError => "unknown-error",
        }
    }
}

/// One failed attempt within a fallback chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    /// Provider that was tried
    pub provider: String,
    /// Its error message
    pub error: String,
}

/// A provider failure
///
/// Carries a machine-readable code, a human-readable message, and the
/// `retryable` flag that alone decides whether the fallback chain
/// continues past it.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{}: {message}", .code.as_str())]
#[serde(rename_all = "camelCase")]
pub struct ProviderError {
    /// Failure code from the enumerated set
    pub code: ProviderErrorCode,
    /// Whether trying another provider could help
    pub retryable: bool,
    /// Human-readable description
    pub message: String,
    /// When the whole chain was exhausted: every attempt that was made
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<ProviderAttempt>,
}

impl ProviderError {
    /// Create an error with the code's default retryability
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            retryable: code.default_retryable(),
            message: message.into(),
            attempts: Vec::new(),
        }
    }

    /// Override the retryable flag
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidInput, message)
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidOutput, message)
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::QuotaExceeded, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ProviderUnavailable, message)
    }

    pub fn content_moderation(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ContentModeration, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::UnknownError, message)
    }

    /// Build the chain-exhausted failure from every recorded attempt.
    ///
    /// The message concatenates each attempted provider and its error so
    /// the user sees the full story, not just the last failure.
    pub fn exhausted(attempts: Vec<ProviderAttempt>) -> Self {
        let summary = attempts
            .iter()
            .map(|a| format!("{}: {}", a.provider, a.error))
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            code: ProviderErrorCode::ProviderUnavailable,
            retryable: false,
            message: format!("all providers failed ({})", summary),
            attempts,
        }
    }
}

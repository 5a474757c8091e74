//! Error types for the SHAH price oracle

use thiserror::Error;

/// Errors that can occur when fetching a price from a single source
///
/// These never reach callers of `PriceOracle::get_price`; the resolver logs
/// them and moves on to the next source in priority order.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from provider
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider API error
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,

    /// Provider reported a zero, negative or non-finite price
    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    /// Provider requires a credential that was not configured
    #[error("Missing credentials for {0}")]
    MissingCredentials(&'static str),
}

impl ProviderError {
    /// Returns true if the failure came from the per-source deadline
    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderError::Timeout => true,
            ProviderError::NetworkError(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Errors raised while constructing an oracle
///
/// Construction is the only place the oracle is allowed to fail.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured URL does not parse
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    /// Cache duration must be positive
    #[error("Cache duration must be greater than zero")]
    InvalidCacheDuration,

    /// Fallback price must be a positive finite number
    #[error("Fallback price must be positive and finite, got {0}")]
    InvalidFallbackPrice(f64),

    /// Request timeout must be positive
    #[error("Request timeout must be greater than zero")]
    InvalidTimeout,

    /// An environment variable holds an unusable value
    #[error("Invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ConfigError {
    /// Creates an InvalidUrl error
    pub fn invalid_url(field: &'static str, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            field,
            reason: reason.to_string(),
        }
    }

    /// Creates an InvalidEnv error
    pub fn invalid_env(var: &'static str, reason: impl ToString) -> Self {
        Self::InvalidEnv {
            var,
            reason: reason.to_string(),
        }
    }
}

//! Classified send errors.
//!
//! Every failure that leaves the runtime is a [`SendError`] tagged with one
//! [`ErrorKind`]. Provider failures of any other shape pass through
//! [`normalize`] before retry or fallback logic looks at them.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed underlying cause attached to a classified error.
pub type Cause = Box<dyn StdError + Send + Sync + 'static>;

const UNKNOWN_PROVIDER_ERROR: &str = "Unknown provider error";

/// The closed set of error kinds the runtime branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    RateLimited,
    ProviderUnavailable,
    InvalidConfiguration,
    DomainNotVerified,
    AllProvidersFailed,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "RATE_LIMIT",
            ErrorKind::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorKind::InvalidConfiguration => "INVALID_CONFIGURATION",
            ErrorKind::DomainNotVerified => "DOMAIN_NOT_VERIFIED",
            ErrorKind::AllProvidersFailed => "ALL_PROVIDERS_FAILED",
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "Rate limit reached",
            ErrorKind::ProviderUnavailable => "Provider unavailable",
            ErrorKind::InvalidConfiguration => "Invalid provider configuration",
            ErrorKind::DomainNotVerified => "Domain not verified",
            ErrorKind::AllProvidersFailed => "All providers failed",
        }
    }

    /// Whether the failure is local to one provider, so that another attempt
    /// (on the same provider or the next one) may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::ProviderUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::RateLimited => write!(f, "rate-limited"),
            ErrorKind::ProviderUnavailable => write!(f, "provider-unavailable"),
            ErrorKind::InvalidConfiguration => write!(f, "invalid-configuration"),
            ErrorKind::DomainNotVerified => write!(f, "domain-not-verified"),
            ErrorKind::AllProvidersFailed => write!(f, "all-providers-failed"),
        }
    }
}

/// A classified email send failure.
///
/// The aggregate variant (`AllProvidersFailed`) carries the per-provider
/// errors of an exhausted fallback walk in attempt order.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SendError {
    kind: ErrorKind,
    message: String,
    provider: Option<String>,
    #[source]
    cause: Option<Cause>,
    errors: Vec<SendError>,
}

impl SendError {
    /// Create an error of `kind` with an explicit message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: None,
            cause: None,
            errors: Vec::new(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::with_default_message(ErrorKind::RateLimited).provider(provider)
    }

    pub fn unavailable(provider: impl Into<String>) -> Self {
        Self::with_default_message(ErrorKind::ProviderUnavailable).provider(provider)
    }

    pub fn invalid_configuration(provider: impl Into<String>) -> Self {
        Self::with_default_message(ErrorKind::InvalidConfiguration).provider(provider)
    }

    pub fn domain_not_verified(provider: impl Into<String>) -> Self {
        Self::with_default_message(ErrorKind::DomainNotVerified).provider(provider)
    }

    /// Aggregate of every error collected during a fallback walk.
    pub fn all_providers_failed(message: impl Into<String>, errors: Vec<SendError>) -> Self {
        Self {
            errors,
            ..Self::new(ErrorKind::AllProvidersFailed, message)
        }
    }

    fn with_default_message(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    /// Set the originating provider.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Replace the message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the underlying cause.
    pub fn cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn cause_ref(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Constituent errors of an aggregate, empty for any other kind.
    pub fn errors(&self) -> &[SendError] {
        &self.errors
    }

    pub fn is_aggregate(&self) -> bool {
        self.kind == ErrorKind::AllProvidersFailed
    }
}

/// Converts any provider failure into a [`SendError`].
///
/// Already-classified errors are returned unchanged. Anything else is
/// classified as `provider-unavailable`, attributed to `provider` and keeps
/// the original error as its cause. An error that renders no message at all
/// carries nothing worth keeping and becomes a generic
/// "Unknown provider error".
pub fn normalize(error: anyhow::Error, provider: Option<&str>) -> SendError {
    let error = match error.downcast::<SendError>() {
        Ok(classified) => return classified,
        Err(other) => other,
    };

    let message = error.to_string();
    let mut normalized = if message.trim().is_empty() {
        SendError::new(ErrorKind::ProviderUnavailable, UNKNOWN_PROVIDER_ERROR)
    } else {
        SendError::new(ErrorKind::ProviderUnavailable, message).cause(error)
    };
    if let Some(name) = provider {
        normalized = normalized.provider(name);
    }
    normalized
}

//! Provider abstraction for email delivery backends.
//!
//! Every backend (SES, SendGrid, SMTP, ...) is an [`EmailProvider`]: a stable
//! name and an async send. The runtime never looks inside a provider; it only
//! resolves which providers a request may use and in what order.

mod registry;
pub mod simulated;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::message::{EmailRequest, EmailResponse, ProviderSelection};

pub use registry::ProviderRegistry;
pub use simulated::{Behavior, SimulatedConfig, SimulatedProvider};

/// Trait for email delivery providers.
///
/// Failures should be a [`SendError`](crate::error::SendError) wrapped in
/// `anyhow::Error`; any other error is classified as `provider-unavailable`
/// by the runtime.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Unique name, used as the registry key and matched against
    /// [`EmailRequest::provider`].
    fn name(&self) -> &str;

    /// Deliver the request.
    async fn send(&self, request: &EmailRequest) -> Result<EmailResponse>;
}

/// Pick the providers a selection may use.
///
/// `Auto` keeps every provider in the given order. A named selection filters
/// by name, so an unknown name yields an empty list rather than an error.
pub fn select_providers(
    providers: &[Arc<dyn EmailProvider>],
    selection: &ProviderSelection,
) -> Vec<Arc<dyn EmailProvider>> {
    match selection {
        ProviderSelection::Auto => providers.to_vec(),
        ProviderSelection::Named(name) => providers
            .iter()
            .filter(|provider| provider.name() == name)
            .cloned()
            .collect(),
    }
}

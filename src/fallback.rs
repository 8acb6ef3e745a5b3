//! Fallback strategies across providers.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::error::{ErrorKind, SendError, normalize};
use crate::message::{EmailRequest, EmailResponse};
use crate::provider::EmailProvider;

const SEQUENTIAL_EXHAUSTED: &str = "All providers failed during sequential fallback";

/// Chooses which of the candidate providers handle a request.
///
/// Produces one response or a classified error; running out of providers is
/// reported as `all-providers-failed`.
#[async_trait]
pub trait FallbackStrategy: Send + Sync {
    async fn execute(
        &self,
        providers: &[Arc<dyn EmailProvider>],
        request: &EmailRequest,
    ) -> Result<EmailResponse, SendError>;
}

/// Tries providers one at a time, in order, until one succeeds.
///
/// `rate-limited` and `provider-unavailable` move on to the next provider.
/// Every other kind, `invalid-configuration` included, stops the walk and is
/// returned as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialFallback;

#[async_trait]
impl FallbackStrategy for SequentialFallback {
    #[tracing::instrument(skip_all)]
    async fn execute(
        &self,
        providers: &[Arc<dyn EmailProvider>],
        request: &EmailRequest,
    ) -> Result<EmailResponse, SendError> {
        let mut errors = Vec::new();

        for provider in providers {
            let error = match provider.send(request).await {
                Ok(response) => {
                    debug!("{}: delivered as {}", provider.name(), response.message_id);
                    return Ok(response);
                }
                Err(e) => normalize(e, Some(provider.name())),
            };

            match error.kind() {
                ErrorKind::InvalidConfiguration => return Err(error),
                ErrorKind::RateLimited | ErrorKind::ProviderUnavailable => {
                    warn!(
                        "{}: {} ({}), trying next provider",
                        provider.name(),
                        error,
                        error.kind()
                    );
                    errors.push(error);
                }
                _ => return Err(error),
            }
        }

        Err(SendError::all_providers_failed(SEQUENTIAL_EXHAUSTED, errors))
    }
}

//! The email runtime: provider registration and send dispatch.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::error::{ErrorKind, SendError};
use crate::events::{EventSink, LogSink, RuntimeEvent};
use crate::fallback::{FallbackStrategy, SequentialFallback};
use crate::message::{EmailRequest, EmailResponse, ProviderSelection};
use crate::provider::{EmailProvider, ProviderRegistry, select_providers};
use crate::retry::{NoRetry, RetryPolicy, RetryingProvider};

/// Routes email requests to registered providers.
///
/// A request naming a provider goes to that provider only (with retries).
/// An automatic request goes through the fallback strategy over every
/// registered provider, in registration order.
///
/// Sends may run concurrently. Registration replaces the registry snapshot in
/// one swap, so an in-flight send sees either the old or the new set.
pub struct EmailRuntime {
    registry: RwLock<Arc<ProviderRegistry>>,
    fallback: Arc<dyn FallbackStrategy>,
    retry_policy: Arc<dyn RetryPolicy>,
    events: Arc<dyn EventSink>,
}

impl EmailRuntime {
    /// Runtime with sequential fallback, no retries and the log sink.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// Register a provider under its name. A later registration with the
    /// same name replaces the earlier one.
    pub fn register_provider(&self, provider: Arc<dyn EmailProvider>) {
        let name = provider.name().to_string();
        {
            let mut guard = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            let mut next = ProviderRegistry::clone(&guard);
            next.register(provider);
            *guard = Arc::new(next);
        }
        self.events.emit(&RuntimeEvent::Registered { provider: name });
    }

    /// Names of the registered providers, in registration order.
    pub fn list_providers(&self) -> Vec<String> {
        self.snapshot().names()
    }

    /// Send a request through the provider(s) its selection resolves to.
    #[tracing::instrument(skip_all, fields(provider = %request.provider))]
    pub async fn send(&self, request: &EmailRequest) -> Result<EmailResponse, SendError> {
        let registry = self.snapshot();
        let candidates = select_providers(registry.providers(), &request.provider);

        if candidates.is_empty() {
            return Err(SendError::new(
                ErrorKind::ProviderUnavailable,
                format!("No provider available for selection: {}", request.provider),
            ));
        }

        let wrapped: Vec<RetryingProvider> = candidates
            .into_iter()
            .map(|provider| {
                RetryingProvider::new(provider, self.retry_policy.clone(), self.events.clone())
            })
            .collect();

        match &request.provider {
            ProviderSelection::Named(name) => {
                debug!("Sending through selected provider {}", name);
                wrapped[0].send_with_retry(request).await
            }
            ProviderSelection::Auto => {
                debug!("Sending with fallback over {} provider(s)", wrapped.len());
                let providers: Vec<Arc<dyn EmailProvider>> = wrapped
                    .into_iter()
                    .map(|p| Arc::new(p) as Arc<dyn EmailProvider>)
                    .collect();
                self.fallback.execute(&providers, request).await
            }
        }
    }

    fn snapshot(&self) -> Arc<ProviderRegistry> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for EmailRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailRuntime")
            .field("providers", &self.list_providers())
            .finish_non_exhaustive()
    }
}

impl Default for EmailRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`EmailRuntime`]; unset parts use the defaults.
#[derive(Default)]
pub struct RuntimeBuilder {
    fallback: Option<Arc<dyn FallbackStrategy>>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    events: Option<Arc<dyn EventSink>>,
}

impl RuntimeBuilder {
    pub fn fallback_strategy(mut self, strategy: Arc<dyn FallbackStrategy>) -> Self {
        self.fallback = Some(strategy);
        self
    }

    pub fn retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn build(self) -> EmailRuntime {
        EmailRuntime {
            registry: RwLock::new(Arc::new(ProviderRegistry::new())),
            fallback: self.fallback.unwrap_or_else(|| Arc::new(SequentialFallback)),
            retry_policy: self.retry_policy.unwrap_or_else(|| Arc::new(NoRetry)),
            events: self.events.unwrap_or_else(|| Arc::new(LogSink)),
        }
    }
}

//! Provider registry keyed by provider name.

use std::sync::Arc;

use super::EmailProvider;

/// Registered providers in registration order.
///
/// Registering a name that is already present replaces the earlier provider
/// in place, so it keeps its original position.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn EmailProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn EmailProvider>) {
        match self
            .providers
            .iter()
            .position(|existing| existing.name() == provider.name())
        {
            Some(index) => self.providers[index] = provider,
            None => self.providers.push(provider),
        }
    }

    /// Get a registered provider by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn EmailProvider>> {
        self.providers.iter().find(|provider| provider.name() == name)
    }

    /// Names of all registered providers, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// All registered providers, in registration order.
    pub fn providers(&self) -> &[Arc<dyn EmailProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

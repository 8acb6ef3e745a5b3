//! Behaviour-driven provider for local runs and tests.
//!
//! It performs no network I/O. Its configured [`Behavior`] decides whether a
//! send succeeds or fails with a particular classified error, which makes it
//! handy for exercising fallback chains from a config file.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};

use super::EmailProvider;
use crate::error::SendError;
use crate::message::{EmailRequest, EmailResponse};

/// Outcome every send of a simulated provider produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    #[default]
    Success,
    RateLimit,
    Unavailable,
    InvalidConfig,
    DomainNotVerified,
}

/// Configuration of a simulated provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedConfig {
    pub name: String,
    /// Sender used when the request has no `from`.
    pub from_email: String,
    #[serde(default)]
    pub behavior: Behavior,
}

impl SimulatedConfig {
    pub fn new(name: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            from_email: from_email.into(),
            behavior: Behavior::Success,
        }
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }
}

#[derive(Debug)]
pub struct SimulatedProvider {
    config: SimulatedConfig,
}

impl SimulatedProvider {
    /// Create a provider, rejecting configs without a name or sender.
    pub fn new(config: SimulatedConfig) -> Result<Self, SendError> {
        if config.name.trim().is_empty() || config.from_email.trim().is_empty() {
            let name = if config.name.trim().is_empty() {
                "simulated"
            } else {
                config.name.as_str()
            };
            return Err(SendError::invalid_configuration(name)
                .message(format!("{} config requires name and from_email", name)));
        }
        Ok(Self { config })
    }

    fn behavior_error(&self) -> Option<SendError> {
        let name = self.config.name.as_str();
        match self.config.behavior {
            Behavior::Success => None,
            Behavior::RateLimit => Some(
                SendError::rate_limited(name).message(format!("{} rate limit reached", name)),
            ),
            Behavior::Unavailable => Some(
                SendError::unavailable(name).message(format!("{} service unavailable", name)),
            ),
            Behavior::InvalidConfig => Some(
                SendError::invalid_configuration(name)
                    .message(format!("{} configuration is invalid", name)),
            ),
            Behavior::DomainNotVerified => Some(
                SendError::domain_not_verified(name)
                    .message(format!("{} domain is not verified", name)),
            ),
        }
    }

    fn message_id(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(8)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        format!("{}_{}_{}", self.config.name, millis, suffix)
    }
}

#[async_trait]
impl EmailProvider for SimulatedProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn send(&self, request: &EmailRequest) -> Result<EmailResponse> {
        if let Some(err) = self.behavior_error() {
            return Err(err.into());
        }

        let sender = request.from.as_deref().unwrap_or(&self.config.from_email);
        let (accepted, rejected): (Vec<String>, Vec<String>) = request
            .recipients()
            .into_iter()
            .partition(|recipient| recipient.contains('@'));

        if accepted.is_empty() {
            return Err(SendError::unavailable(&self.config.name)
                .message(format!("{} rejected all recipients", self.config.name))
                .into());
        }

        debug!(
            "{}: sending {:?} from {} to {} recipient(s)",
            self.config.name,
            request.subject,
            sender,
            accepted.len()
        );

        Ok(EmailResponse {
            provider: self.config.name.clone(),
            message_id: self.message_id(),
            accepted,
            rejected,
        })
    }
}

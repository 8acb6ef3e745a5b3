//! Runtime configuration loaded from a JSON file.
//!
//! ```json
//! {
//!   "retry": { "max_retries": 2, "base_delay_ms": 100, "max_delay_ms": 2000 },
//!   "providers": [
//!     { "name": "ses", "from_email": "noreply@example.com", "behavior": "rate_limit" },
//!     { "name": "smtp", "from_email": "noreply@example.com" }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::events::EventSink;
use crate::provider::{SimulatedConfig, SimulatedProvider};
use crate::retry::BackoffPolicy;
use crate::runtime::EmailRuntime;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Retry policy applied to every provider. Absent means never retry.
    #[serde(default)]
    pub retry: Option<BackoffPolicy>,

    /// Providers, registered in this order.
    #[serde(default)]
    pub providers: Vec<SimulatedConfig>,
}

impl Config {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build a runtime with every configured provider registered.
    ///
    /// Fails with `invalid-configuration` on the first invalid provider entry.
    pub fn build_runtime(&self, events: Arc<dyn EventSink>) -> Result<EmailRuntime> {
        let mut builder = EmailRuntime::builder().event_sink(events);
        if let Some(policy) = &self.retry {
            builder = builder.retry_policy(Arc::new(policy.clone()));
        }
        let runtime = builder.build();

        for provider in &self.providers {
            let provider = SimulatedProvider::new(provider.clone())?;
            runtime.register_provider(Arc::new(provider));
        }

        Ok(runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, SendError};
    use crate::events::LogSink;
    use crate::message::EmailRequest;
    use crate::provider::Behavior;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "retry": { "max_retries": 2, "base_delay_ms": 100 },
        "providers": [
            { "name": "ses", "from_email": "noreply@example.com", "behavior": "rate_limit" },
            { "name": "sendgrid", "from_email": "noreply@example.com", "behavior": "unavailable" },
            { "name": "smtp", "from_email": "noreply@example.com" }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::parse(SAMPLE).unwrap();

        let retry = config.retry.unwrap();
        assert_eq!(retry.max_retries, 2);
        assert_eq!(retry.base_delay_ms, 100);
        assert_eq!(retry.max_delay_ms, 30_000);
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.providers[0].behavior, Behavior::RateLimit);
        assert_eq!(config.providers[2].behavior, Behavior::Success);
    }

    #[test]
    fn test_parse_empty_object() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_reports_path() {
        let err = Config::load(Path::new("/nonexistent/mailroute.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_build_runtime_registers_in_order() {
        let runtime = Config::parse(SAMPLE)
            .unwrap()
            .build_runtime(Arc::new(LogSink))
            .unwrap();

        assert_eq!(runtime.list_providers(), vec!["ses", "sendgrid", "smtp"]);
    }

    #[test]
    fn test_build_runtime_rejects_invalid_provider() {
        let config = Config::parse(r#"{ "providers": [ { "name": "ses", "from_email": "" } ] }"#)
            .unwrap();

        let err = config.build_runtime(Arc::new(LogSink)).unwrap_err();
        let err = err.downcast_ref::<SendError>().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_runtime_falls_back() {
        let runtime = Config::parse(SAMPLE)
            .unwrap()
            .build_runtime(Arc::new(LogSink))
            .unwrap();

        let response = runtime
            .send(&EmailRequest::new("user@example.com", "Fallback test"))
            .await
            .unwrap();

        assert_eq!(response.provider, "smtp");
        assert_eq!(response.accepted, vec!["user@example.com"]);
    }
}

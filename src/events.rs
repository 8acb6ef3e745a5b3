//! Structured runtime events.

use log::{Level, log};

use crate::error::ErrorKind;

/// Something the runtime did that an observer may want to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A provider was registered (or replaced) under this name.
    Registered { provider: String },
    /// A provider send failed and is about to be retried after `delay_ms`.
    Retrying {
        provider: String,
        attempt: u32,
        delay_ms: u64,
        kind: ErrorKind,
    },
}

/// Receives runtime events.
///
/// Called inline before the corresponding action, so implementations must
/// not block on their own I/O.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RuntimeEvent);
}

/// Default sink writing events through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &RuntimeEvent) {
        let (level, line) = log_line(event);
        log!(level, "{}", line);
    }
}

fn log_line(event: &RuntimeEvent) -> (Level, String) {
    match event {
        RuntimeEvent::Registered { provider } => {
            (Level::Info, format!("Registered provider {}", provider))
        }
        RuntimeEvent::Retrying {
            provider,
            attempt,
            delay_ms,
            kind,
        } => (
            Level::Warn,
            format!(
                "{}: attempt {} failed ({}, {}), retrying in {}ms...",
                provider,
                attempt,
                kind,
                kind.code(),
                delay_ms
            ),
        ),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn test_log_sink_lines() {
        let registered = RuntimeEvent::Registered {
            provider: "ses".into(),
        };
        let retrying = RuntimeEvent::Retrying {
            provider: "ses".into(),
            attempt: 1,
            delay_ms: 250,
            kind: ErrorKind::RateLimited,
        };

        assert_eq!(
            log_line(&registered),
            (Level::Info, "Registered provider ses".to_string())
        );
        assert_eq!(
            log_line(&retrying),
            (
                Level::Warn,
                "ses: attempt 1 failed (rate-limited, RATE_LIMIT), retrying in 250ms...".to_string()
            )
        );

        LogSink.emit(&registered);
        LogSink.emit(&retrying);
    }
}

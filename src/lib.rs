//! mailroute - route outbound email through interchangeable providers.
//!
//! Providers are registered on an [`EmailRuntime`]. A request either names
//! one provider or lets the runtime walk every registered provider with a
//! [`FallbackStrategy`]; each provider attempt is retried per a
//! [`RetryPolicy`] before it counts as failed.

pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod message;
pub mod provider;
pub mod retry;
pub mod runtime;

pub use error::{ErrorKind, SendError, normalize};
pub use events::{EventSink, LogSink, RuntimeEvent};
pub use fallback::{FallbackStrategy, SequentialFallback};
pub use message::{EmailRequest, EmailResponse, ProviderSelection, Recipients, normalize_recipients};
pub use provider::{EmailProvider, ProviderRegistry, select_providers};
pub use retry::{BackoffPolicy, NoRetry, RetryPolicy, RetryingProvider};
pub use runtime::{EmailRuntime, RuntimeBuilder};

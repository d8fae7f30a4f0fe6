//! Construction-time configuration for the client.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::transport::RetryPolicy;

/// Single-slot observer for delivery failures on the queued path.
pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

pub const DEFAULT_BASE_URL: &str = "https://logstitch.io";
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

/// Client configuration. Immutable after construction.
///
/// Only `api_key` is required:
///
/// ```
/// use logstitch::Config;
///
/// let config = Config {
///     api_key: "ls_live_example".to_string(),
///     ..Config::default()
/// };
/// ```
#[derive(Clone)]
pub struct Config {
    /// API credential. Required; construction fails when empty.
    pub api_key: String,
    /// Base URL of the ingestion service. Trailing slashes are stripped.
    pub base_url: String,
    /// Queue length that triggers a size-based flush.
    pub batch_size: usize,
    /// Period of the timer-based flush.
    pub flush_interval: Duration,
    /// Hard cap on queued events; enqueues beyond it are dropped.
    pub max_queue_size: usize,
    /// When set, handled delivery failures are returned to the caller of
    /// `flush`/`close` instead of being routed to the error callback.
    pub strict: bool,
    /// Invoked with delivery failures from the queued path in non-strict
    /// mode. Failures are discarded when unset.
    pub on_error: Option<ErrorCallback>,
    /// Retry/backoff policy for the delivery transport.
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            strict: false,
            on_error: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("batch_size", &self.batch_size)
            .field("flush_interval", &self.flush_interval)
            .field("max_queue_size", &self.max_queue_size)
            .field("strict", &self.strict)
            .field("on_error", &self.on_error.is_some())
            .field("retry", &self.retry)
            .finish()
    }
}

impl Config {
    /// Validates required fields. Runs before any network activity.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("api_key is required".to_string()));
        }
        Ok(())
    }

    /// Base URL with trailing slashes stripped, so joined request URLs
    /// never contain a double slash at the path boundary.
    pub(crate) fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}

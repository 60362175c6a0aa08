//! Configuration for event logging.

use std::fmt;
use std::sync::Arc;

use crate::logger::{EventSink, Severity, TracingSink};

/// Configuration options for driver event logging.
///
/// # Example
///
/// ```rust
/// use sqlog::{LogConfig, Severity};
///
/// let config = LogConfig::default()
///     .with_base_level(Severity::new(-4))
///     .with_tx_prefix("txn:")
///     .with_warn_skip(true);
/// ```
#[derive(Clone)]
pub struct LogConfig {
    /// Where events go. `None` disables logging entirely.
    /// Default: [`TracingSink`]
    pub sink: Option<Arc<dyn EventSink>>,

    /// Offset added to every event severity before errors are applied.
    /// Default: `0`
    pub base_level: Severity,

    /// Prefix of every event name.
    /// Default: `"sql:"`
    pub prefix: String,

    /// Prefix of statement event names, after `prefix`.
    /// Default: `"stmt:"`
    pub stmt_prefix: String,

    /// Prefix of transaction event names, after `prefix`.
    /// Default: `"tx:"`
    pub tx_prefix: String,

    /// Whether events carry a `duration` attribute.
    /// Default: `true`
    pub log_duration: bool,

    /// Whether a "not implemented" result is logged as a warning instead of
    /// being dropped.
    /// Default: `false`
    pub warn_on_skip: bool,
}

impl fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogConfig")
            .field("sink", &self.sink.as_ref().map(|_| "EventSink"))
            .field("base_level", &self.base_level)
            .field("prefix", &self.prefix)
            .field("stmt_prefix", &self.stmt_prefix)
            .field("tx_prefix", &self.tx_prefix)
            .field("log_duration", &self.log_duration)
            .field("warn_on_skip", &self.warn_on_skip)
            .finish()
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            sink: Some(Arc::new(TracingSink)),
            base_level: Severity::INFO,
            prefix: "sql:".to_string(),
            stmt_prefix: "stmt:".to_string(),
            tx_prefix: "tx:".to_string(),
            log_duration: true,
            warn_on_skip: false,
        }
    }
}

impl LogConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with the event prefix set to `"<driver>:"`.
    pub fn for_driver(driver_name: &str) -> Self {
        Self::default().with_prefix(format!("{driver_name}:"))
    }

    /// Send events to a custom sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Disable logging. Calls are still forwarded.
    pub fn without_sink(mut self) -> Self {
        self.sink = None;
        self
    }

    /// Shift every event severity by `level`.
    pub fn with_base_level(mut self, level: Severity) -> Self {
        self.base_level = level;
        self
    }

    /// Set the prefix of every event name.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the statement event prefix, appended after the base prefix.
    pub fn with_stmt_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stmt_prefix = prefix.into();
        self
    }

    /// Set the transaction event prefix, appended after the base prefix.
    pub fn with_tx_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tx_prefix = prefix.into();
        self
    }

    /// Enable or disable the `duration` attribute.
    pub fn with_duration(mut self, enabled: bool) -> Self {
        self.log_duration = enabled;
        self
    }

    /// Report "not implemented" results as warnings instead of dropping them.
    pub fn with_warn_skip(mut self, enabled: bool) -> Self {
        self.warn_on_skip = enabled;
        self
    }

    /// Create a development-friendly configuration that also reports skipped
    /// fast paths as warnings.
    pub fn development() -> Self {
        Self {
            base_level: Severity::INFO,
            warn_on_skip: true,
            ..Self::default()
        }
    }

    /// Create a production configuration: routine events shifted down to
    /// DEBUG so only failures surface at the usual INFO filter.
    pub fn production() -> Self {
        Self {
            base_level: Severity::new(-4),
            warn_on_skip: false,
            ..Self::default()
        }
    }
}

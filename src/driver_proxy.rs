//! Logged driver and the extension trait that builds it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LogConfig;
use crate::conn::LoggedConn;
use crate::connector::LoggedConnector;
use crate::context::Context;
use crate::driver::{Conn, Connector, Driver, DriverContext};
use crate::error::{DriverError, Result};
use crate::logger::{Attr, Category, EventLogger, Severity};
use crate::uid::new_id;

/// A driver wrapped with event logging.
///
/// Advertises [`DriverContext`] only when the wrapped driver does.
pub struct LoggedDriver {
    driver: Arc<dyn Driver>,
    has_context: bool,
    logger: EventLogger,
}

impl LoggedDriver {
    pub fn new(driver: Arc<dyn Driver>, logger: EventLogger) -> Self {
        let has_context = driver.as_driver_context().is_some();
        Self {
            driver,
            has_context,
            logger,
        }
    }
}

impl fmt::Debug for LoggedDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggedDriver")
            .field("has_context", &self.has_context)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Driver for LoggedDriver {
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>> {
        let conn_id = Attr::string("connID", new_id());
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Conn, "open")
            .attr(conn_id.clone());

        let result = self.driver.open(name).await;
        call.finish(result.map(|conn| {
            Box::new(LoggedConn::new(conn, self.logger.with([conn_id]))) as Box<dyn Conn>
        }))
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        if self.has_context {
            Some(self)
        } else {
            None
        }
    }
}

impl DriverContext for LoggedDriver {
    fn open_connector(&self, name: &str) -> Result<Box<dyn Connector>> {
        let driver = self.driver.as_driver_context().ok_or(DriverError::Skip)?;
        let connector = driver.open_connector(name)?;
        Ok(Box::new(LoggedConnector::from_connector(
            connector,
            self.logger.clone(),
        )))
    }
}

/// Wrap `driver` so every connection it opens is logged.
pub fn wrap_driver(driver: Arc<dyn Driver>, config: LogConfig) -> Arc<dyn Driver> {
    Arc::new(LoggedDriver::new(driver, EventLogger::new(config)))
}

/// Extension trait for easy wrapping of drivers.
pub trait LoggingExt {
    /// Wrap this driver with default logging.
    fn with_logging(self) -> Arc<dyn Driver>;

    /// Wrap this driver with custom logging configuration.
    fn with_logging_config(self, config: LogConfig) -> Arc<dyn Driver>;
}

impl LoggingExt for Arc<dyn Driver> {
    fn with_logging(self) -> Arc<dyn Driver> {
        wrap_driver(self, LogConfig::default())
    }

    fn with_logging_config(self, config: LogConfig) -> Arc<dyn Driver> {
        wrap_driver(self, config)
    }
}

//! Opening a logged database by driver name.

use std::sync::Arc;

use crate::config::LogConfig;
use crate::connector::LoggedConnector;
use crate::context::Context;
use crate::driver::{Conn, Connector, Driver};
use crate::error::Result;
use crate::logger::EventLogger;
use crate::registry::DriverRegistry;

/// Handle returned by [`open`]: a logged stand-in for the driver's own
/// connection opener.
#[derive(Debug, Clone)]
pub struct Database {
    connector: Arc<LoggedConnector>,
}

impl Database {
    /// Open a new logged connection.
    pub async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>> {
        self.connector.connect(ctx).await
    }

    /// The unwrapped driver behind this database.
    pub fn driver(&self) -> Arc<dyn Driver> {
        self.connector.driver()
    }

    pub fn connector(&self) -> Arc<dyn Connector> {
        self.connector.clone()
    }
}

/// Open `dsn` with the driver registered as `driver_name`, logging every
/// connection, statement and transaction it produces.
///
/// Event names are prefixed with `"<driver_name>:"` unless `configure`
/// overrides the prefix. No connection is made until [`Database::connect`].
///
/// # Example
///
/// ```rust,ignore
/// let db = sqlog::open(&registry, "sqlite", "file::memory:", |cfg| {
///     cfg.with_tx_prefix("txn:").with_warn_skip(true)
/// })?;
/// let mut conn = db.connect(&Context::background()).await?;
/// ```
pub fn open(
    registry: &DriverRegistry,
    driver_name: &str,
    dsn: &str,
    configure: impl FnOnce(LogConfig) -> LogConfig,
) -> Result<Database> {
    let driver = registry.get(driver_name)?;
    let logger = EventLogger::new(configure(LogConfig::for_driver(driver_name)));

    let connector = match driver.as_driver_context() {
        Some(ctx_driver) => {
            LoggedConnector::from_connector(ctx_driver.open_connector(dsn)?, logger)
        }
        None => LoggedConnector::new(dsn, driver.clone(), logger),
    };

    tracing::debug!(driver = driver_name, "opened logged database");

    Ok(Database {
        connector: Arc::new(connector),
    })
}

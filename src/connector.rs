//! Logged connector.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::conn::LoggedConn;
use crate::driver::{Conn, Connector, Driver};
use crate::error::Result;
use crate::logger::{Attr, Category, EventLogger, Severity};
use crate::uid::new_id;

enum Source {
    /// Open each connection with `Driver::open(dsn)`.
    Driver { dsn: String, driver: Arc<dyn Driver> },
    /// Connector obtained once from a driver with two-phase open.
    Connector(Box<dyn Connector>),
}

/// A connector that logs every dial and wraps the resulting connections.
pub struct LoggedConnector {
    source: Source,
    logger: EventLogger,
}

impl LoggedConnector {
    /// Connector opening connections through `driver.open(dsn)`.
    pub fn new(dsn: impl Into<String>, driver: Arc<dyn Driver>, logger: EventLogger) -> Self {
        Self {
            source: Source::Driver {
                dsn: dsn.into(),
                driver,
            },
            logger,
        }
    }

    /// Connector delegating to a driver-supplied connector.
    pub fn from_connector(connector: Box<dyn Connector>, logger: EventLogger) -> Self {
        Self {
            source: Source::Connector(connector),
            logger,
        }
    }
}

impl fmt::Debug for LoggedConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            Source::Driver { .. } => "driver",
            Source::Connector(_) => "connector",
        };
        f.debug_struct("LoggedConnector")
            .field("source", &source)
            .field("logger", &self.logger)
            .finish()
    }
}

#[async_trait]
impl Connector for LoggedConnector {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>> {
        let conn_id = Attr::string("connID", new_id());
        let call = self
            .logger
            .call(ctx, Severity::INFO, Category::Conn, "connect")
            .attr(conn_id.clone());

        let result = match &self.source {
            Source::Driver { dsn, driver } => driver.open(dsn).await,
            Source::Connector(connector) => connector.connect(ctx).await,
        };

        call.finish(result.map(|conn| {
            Box::new(LoggedConn::new(conn, self.logger.with([conn_id]))) as Box<dyn Conn>
        }))
    }

    fn driver(&self) -> Arc<dyn Driver> {
        match &self.source {
            Source::Driver { driver, .. } => driver.clone(),
            Source::Connector(connector) => connector.driver(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;
    use crate::driver::DriverContext;
    use crate::logger::AttrValue;
    use crate::mock::{MockCaps, MockDriver, RecordingSink};

    fn logger(sink: &Arc<RecordingSink>) -> EventLogger {
        EventLogger::new(LogConfig::default().with_sink(sink.clone()))
    }

    #[tokio::test]
    async fn test_connect_logs_and_scopes_connection() {
        let driver = MockDriver::new(MockCaps::none());
        let sink = Arc::new(RecordingSink::default());
        let connector = LoggedConnector::new("mem://", Arc::new(driver.clone()), logger(&sink));

        let conn = connector.connect(&Context::background()).await.unwrap();
        conn.close().await.unwrap();

        assert_eq!(driver.journal(), vec!["open", "close"]);
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "sql:connect");
        assert!(events[0].attr("duration").is_some());
        assert_eq!(events[1].name, "sql:close");
        assert_eq!(events[0].attr("connID"), events[1].attr("connID"));
        assert!(matches!(events[0].attr("connID"), Some(AttrValue::Str(id)) if id.len() == 8));
    }

    #[tokio::test]
    async fn test_connect_failure_is_logged_and_forwarded() {
        let driver = MockDriver::failing(MockCaps::none(), &["open"]);
        let sink = Arc::new(RecordingSink::default());
        let connector = LoggedConnector::new("mem://", Arc::new(driver), logger(&sink));

        assert!(connector.connect(&Context::background()).await.is_err());

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::ERROR);
    }

    #[tokio::test]
    async fn test_wrapped_driver_connector() {
        let driver = MockDriver::new(MockCaps::all());
        let sink = Arc::new(RecordingSink::default());
        let inner = driver.open_connector("mem://").unwrap();
        let connector = LoggedConnector::from_connector(inner, logger(&sink));

        connector.connect(&Context::background()).await.unwrap();

        assert_eq!(driver.journal(), vec!["open_connector", "connect"]);
        assert_eq!(sink.names(), vec!["sql:connect"]);
    }

    #[test]
    fn test_driver_is_not_logged() {
        let driver: Arc<dyn Driver> = Arc::new(MockDriver::new(MockCaps::none()));
        let sink = Arc::new(RecordingSink::default());
        let connector = LoggedConnector::new("mem://", driver.clone(), logger(&sink));

        assert!(Arc::ptr_eq(&connector.driver(), &driver));
        assert!(sink.events().is_empty());
    }
}

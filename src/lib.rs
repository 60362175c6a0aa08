//! # sqlog
//!
//! Structured event logging for pluggable SQL drivers.
//!
//! `sqlog` sits between an application and a storage driver. Every lifecycle
//! call (connect, prepare, exec, query, begin, commit, rollback, close) is
//! forwarded unchanged to the driver and reported as one structured event.
//!
//! ## Features
//!
//! - **Transparent**: callers see exactly the results and errors the driver returns
//! - **Capability Preserving**: optional driver traits are advertised by the
//!   proxies only when the driver advertises them
//! - **Correlated Events**: connection, statement and transaction IDs link
//!   related events
//! - **Tracing Integration**: events are emitted through `tracing` by default
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sqlog::{Context, DriverRegistry};
//!
//! let mut registry = DriverRegistry::new();
//! registry.register("sqlite", Arc::new(MySqliteDriver::default()))?;
//!
//! let db = sqlog::open(&registry, "sqlite", "file::memory:", |cfg| cfg)?;
//! let mut conn = db.connect(&Context::background()).await?;
//! let mut stmt = conn.prepare("SELECT 1").await?;
//! stmt.exec(&[]).await?;
//! ```
//!
//! ## Configuration
//!
//! ```rust,ignore
//! use sqlog::{LogConfig, Severity};
//!
//! let db = sqlog::open(&registry, "sqlite", dsn, |cfg: LogConfig| {
//!     cfg.with_base_level(Severity::new(-4)) // shift everything down to DEBUG
//!         .with_duration(false)
//!         .with_warn_skip(true)
//! })?;
//! ```
//!
//! ## Event Attributes
//!
//! | Attribute | Description |
//! |-----------|-------------|
//! | `connID` | Connection correlation ID |
//! | `stmtID` | Statement correlation ID |
//! | `txID` | Transaction correlation ID |
//! | `query` | SQL text passed to prepare, exec or query |
//! | `args` | Argument values |
//! | `readOnly` | Whether a read-only transaction was requested |
//! | `duration` | Time spent in the call |
//! | `error` | Error returned by the driver |
//! | `abandoned` | The call was dropped before the driver returned |

mod config;
mod conn;
mod connector;
mod context;
mod database;
pub mod driver;
mod driver_proxy;
mod error;
mod logger;
mod registry;
mod stmt;
mod tx;
mod uid;

#[cfg(test)]
mod mock;

pub use config::LogConfig;
pub use conn::{ConnCapabilities, LoggedConn};
pub use connector::LoggedConnector;
pub use context::Context;
pub use database::{open, Database};
pub use driver_proxy::{wrap_driver, LoggedDriver, LoggingExt};
pub use error::{DriverError, Result};
pub use logger::{Attr, AttrValue, Category, Event, EventLogger, EventSink, Severity, TracingSink};
pub use registry::DriverRegistry;
pub use stmt::{LoggedStmt, StmtCapabilities};
pub use tx::LoggedTx;
pub use uid::new_id;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::driver::{
        Conn, ConnBeginTx, ConnPrepareContext, Connector, Driver, DriverContext, Execer,
        ExecerContext, NamedValueChecker, Pinger, Queryer, QueryerContext, Rows,
        SessionResetter, Stmt, StmtExecContext, StmtQueryContext, Tx,
    };
    pub use crate::{Context, DriverRegistry, LogConfig, LoggingExt};
}

//! The storage-driver contract the logging proxies consume.
//!
//! A driver implements the required traits ([`Driver`], [`Conn`], [`Stmt`],
//! [`Tx`], [`Rows`]) and may additionally implement any subset of the
//! optional capability traits. Capabilities are advertised through the
//! `as_*` accessors, which return `None` by default. Callers probe an
//! accessor to decide between a fast path and their own generic fallback,
//! so an accessor must only return `Some` when the capability really exists.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{AccessMode, IsolationLevel, Value};

use crate::context::Context;
use crate::error::{DriverError, Result};

/// An argument passed to a context-aware call.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// Parameter name, `None` for positional arguments.
    pub name: Option<String>,
    /// One-based position of the argument.
    pub ordinal: usize,
    pub value: Value,
}

impl NamedValue {
    /// Unnamed argument at `ordinal`.
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: None,
            ordinal,
            value: value.into(),
        }
    }

    /// Named argument (`:name`, `@name`, ...) at `ordinal`.
    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value: value.into(),
        }
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub last_insert_id: Option<i64>,
    pub rows_affected: u64,
}

/// Options for a context-aware transaction begin.
///
/// `None` fields request the driver default.
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    pub isolation_level: Option<IsolationLevel>,
    pub access_mode: Option<AccessMode>,
}

impl TxOptions {
    /// Request a specific isolation level.
    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }

    /// Request a read-only or read-write transaction.
    pub fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.access_mode = Some(mode);
        self
    }

    /// Whether a read-only transaction was requested.
    pub fn read_only(&self) -> bool {
        matches!(self.access_mode, Some(AccessMode::ReadOnly))
    }
}

/// A result set produced by a query.
pub trait Rows: Send {
    fn columns(&self) -> Vec<String>;

    /// Advance to the next row, `None` once the set is exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// Entry point of a storage driver.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a new connection. `name` is a driver-specific data source name.
    async fn open(&self, name: &str) -> Result<Box<dyn Conn>>;

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        None
    }
}

/// Two-phase open: parse the data source name once, connect many times.
pub trait DriverContext: Send + Sync {
    fn open_connector(&self, name: &str) -> Result<Box<dyn Connector>>;
}

/// A driver in a fixed configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, ctx: &Context) -> Result<Box<dyn Conn>>;

    fn driver(&self) -> Arc<dyn Driver>;
}

/// A connection, used by one caller at a time.
#[async_trait]
pub trait Conn: Send {
    async fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>>;

    async fn begin(&mut self) -> Result<Box<dyn Tx>>;

    async fn close(self: Box<Self>) -> Result<()>;

    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        None
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        None
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        None
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        None
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        None
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        None
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        None
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        None
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        None
    }
}

#[async_trait]
pub trait Pinger: Send {
    async fn ping(&mut self, ctx: &Context) -> Result<()>;
}

/// Direct execution without a prepared statement.
#[async_trait]
pub trait Execer: Send {
    async fn exec(&mut self, query: &str, args: &[Value]) -> Result<ExecResult>;
}

#[async_trait]
pub trait ExecerContext: Send {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<ExecResult>;
}

/// Direct query without a prepared statement.
#[async_trait]
pub trait Queryer: Send {
    async fn query(&mut self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>>;
}

#[async_trait]
pub trait QueryerContext: Send {
    async fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>>;
}

#[async_trait]
pub trait ConnPrepareContext: Send {
    async fn prepare_context(&mut self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>>;
}

/// Transaction begin honoring isolation level and access mode.
///
/// Implementations must return an error for options they cannot honor.
#[async_trait]
pub trait ConnBeginTx: Send {
    async fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> Result<Box<dyn Tx>>;
}

#[async_trait]
pub trait SessionResetter: Send {
    async fn reset_session(&mut self, ctx: &Context) -> Result<()>;
}

/// Argument validation and conversion ahead of execution.
///
/// Returning [`DriverError::Skip`] asks the caller to use its default
/// conversion.
pub trait NamedValueChecker: Send {
    fn check_named_value(&mut self, value: &mut NamedValue) -> Result<()>;
}

/// A prepared statement bound to a connection.
#[async_trait]
pub trait Stmt: Send {
    async fn close(self: Box<Self>) -> Result<()>;

    /// Number of placeholders, `None` when the driver cannot tell.
    fn num_input(&self) -> Option<usize>;

    async fn exec(&mut self, args: &[Value]) -> Result<ExecResult>;

    async fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>>;

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        None
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        None
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        None
    }
}

#[async_trait]
pub trait StmtExecContext: Send {
    async fn exec_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<ExecResult>;
}

#[async_trait]
pub trait StmtQueryContext: Send {
    async fn query_context(&mut self, ctx: &Context, args: &[NamedValue])
        -> Result<Box<dyn Rows>>;
}

#[async_trait]
pub trait Tx: Send {
    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Strip names from context-call arguments for a plain call.
///
/// Fails when any argument is named, since plain calls are positional only.
pub fn named_values_to_values(args: &[NamedValue]) -> Result<Vec<Value>> {
    args.iter()
        .map(|arg| match arg.name.as_deref() {
            Some(name) if !name.is_empty() => Err(DriverError::NamedParameters),
            _ => Ok(arg.value.clone()),
        })
        .collect()
}

//! Logged connection wrapper.
//!
//! [`LoggedConn`] forwards every call to the driver connection it owns and
//! emits one event per call. Its capability accessors mirror the wrapped
//! connection: an optional trait is advertised only when the driver
//! connection advertises it, so callers probing the proxy take the same
//! fast path or fallback they would take against the driver directly.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use sea_orm::Value;

use crate::context::Context;
use crate::driver::{
    Conn, ConnBeginTx, ConnPrepareContext, ExecResult, Execer, ExecerContext, NamedValue,
    NamedValueChecker, Pinger, Queryer, QueryerContext, Rows, SessionResetter, Stmt, Tx,
    TxOptions,
};
use crate::error::{DriverError, Result};
use crate::logger::{
    args_attr, named_args_attr, query_attr, Attr, Category, EventLogger, Severity,
};
use crate::stmt::LoggedStmt;
use crate::tx::LoggedTx;
use crate::uid::new_id;

/// Optional capabilities of a wrapped connection, probed once at wrap time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnCapabilities {
    pub ping: bool,
    pub exec: bool,
    pub exec_context: bool,
    pub query: bool,
    pub query_context: bool,
    pub prepare_context: bool,
    pub begin_tx: bool,
    pub reset_session: bool,
    pub check_named_value: bool,
}

impl ConnCapabilities {
    pub fn probe(conn: &mut dyn Conn) -> Self {
        Self {
            ping: conn.as_pinger().is_some(),
            exec: conn.as_execer().is_some(),
            exec_context: conn.as_execer_context().is_some(),
            query: conn.as_queryer().is_some(),
            query_context: conn.as_queryer_context().is_some(),
            prepare_context: conn.as_prepare_context().is_some(),
            begin_tx: conn.as_begin_tx().is_some(),
            reset_session: conn.as_session_resetter().is_some(),
            check_named_value: conn.as_named_value_checker().is_some(),
        }
    }
}

/// A driver connection wrapped with event logging.
///
/// Statements and transactions opened through it are wrapped too, each with
/// its own correlation ID added to this connection's logger.
pub struct LoggedConn {
    conn: Box<dyn Conn>,
    caps: ConnCapabilities,
    started: Instant,
    logger: EventLogger,
}

impl LoggedConn {
    pub fn new(mut conn: Box<dyn Conn>, logger: EventLogger) -> Self {
        let caps = ConnCapabilities::probe(conn.as_mut());
        Self {
            conn,
            caps,
            started: Instant::now(),
            logger,
        }
    }

    pub fn capabilities(&self) -> ConnCapabilities {
        self.caps
    }

    fn wrap_stmt(&self, stmt: Box<dyn Stmt>, query: &str, id: Attr) -> Box<dyn Stmt> {
        Box::new(LoggedStmt::new(stmt, query, self.logger.with([id])))
    }

    fn wrap_tx(&self, tx: Box<dyn Tx>, id: Attr) -> Box<dyn Tx> {
        Box::new(LoggedTx::new(tx, self.logger.with([id])))
    }
}

impl fmt::Debug for LoggedConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggedConn")
            .field("caps", &self.caps)
            .field("started", &self.started)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

// Plain prepare standing in for a context-aware one. The statement is closed
// again if the context finished while it was being prepared.
async fn prepare_fallback(
    conn: &mut dyn Conn,
    ctx: &Context,
    query: &str,
) -> Result<Box<dyn Stmt>> {
    let stmt = conn.prepare(query).await?;
    if let Some(err) = ctx.err() {
        let _ = stmt.close().await;
        return Err(err);
    }
    Ok(stmt)
}

// Plain begin standing in for a context-aware one. Options the plain call
// cannot honor are rejected before the driver is touched.
async fn begin_fallback(
    conn: &mut dyn Conn,
    ctx: &Context,
    opts: &TxOptions,
) -> Result<Box<dyn Tx>> {
    if opts.isolation_level.is_some() {
        return Err(DriverError::IsolationLevel);
    }
    if opts.read_only() {
        return Err(DriverError::ReadOnly);
    }

    let tx = conn.begin().await?;
    if let Some(err) = ctx.err() {
        let _ = tx.rollback().await;
        return Err(err);
    }
    Ok(tx)
}

#[async_trait]
impl Conn for LoggedConn {
    async fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>> {
        let stmt_id = Attr::string("stmtID", new_id());
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Conn, "prepare")
            .attr(stmt_id.clone())
            .attr(query_attr(query));

        let result = self.conn.prepare(query).await;
        call.finish(result.map(|stmt| self.wrap_stmt(stmt, query, stmt_id)))
    }

    async fn begin(&mut self) -> Result<Box<dyn Tx>> {
        let tx_id = Attr::string("txID", new_id());
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Conn, "begin")
            .since(None)
            .attr(tx_id.clone());

        let result = self.conn.begin().await;
        call.finish(result.map(|tx| self.wrap_tx(tx, tx_id)))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let LoggedConn {
            conn,
            started,
            logger,
            ..
        } = *self;
        let call = logger
            .call(&Context::background(), Severity::INFO, Category::Conn, "close")
            .since(Some(started));
        call.finish(conn.close().await)
    }

    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        if self.caps.ping {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        if self.caps.exec {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        if self.caps.exec_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        if self.caps.query {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        if self.caps.query_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        if self.caps.prepare_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        if self.caps.begin_tx {
            Some(self)
        } else {
            None
        }
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        if self.caps.reset_session {
            Some(self)
        } else {
            None
        }
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        if self.caps.check_named_value {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl Pinger for LoggedConn {
    async fn ping(&mut self, ctx: &Context) -> Result<()> {
        let call = self.logger.call(ctx, Severity::DEBUG, Category::Conn, "ping");
        let pinger = if self.caps.ping {
            self.conn.as_pinger()
        } else {
            None
        };
        let result = match pinger {
            Some(pinger) => pinger.ping(ctx).await,
            None => Ok(()),
        };
        call.finish(result)
    }
}

#[async_trait]
impl Execer for LoggedConn {
    async fn exec(&mut self, query: &str, args: &[Value]) -> Result<ExecResult> {
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Conn, "exec")
            .attr(query_attr(query))
            .attr(args_attr(args));
        let execer = if self.caps.exec {
            self.conn.as_execer()
        } else {
            None
        };
        let result = match execer {
            Some(execer) => execer.exec(query, args).await,
            None => Err(DriverError::Skip),
        };
        call.finish(result)
    }
}

#[async_trait]
impl ExecerContext for LoggedConn {
    async fn exec_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<ExecResult> {
        let call = self
            .logger
            .call(ctx, Severity::INFO, Category::Conn, "execContext")
            .attr(query_attr(query))
            .attr(named_args_attr(args));
        let execer = if self.caps.exec_context {
            self.conn.as_execer_context()
        } else {
            None
        };
        let result = match execer {
            Some(execer) => execer.exec_context(ctx, query, args).await,
            None => Err(DriverError::Skip),
        };
        call.finish(result)
    }
}

#[async_trait]
impl Queryer for LoggedConn {
    async fn query(&mut self, query: &str, args: &[Value]) -> Result<Box<dyn Rows>> {
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Conn, "query")
            .attr(query_attr(query))
            .attr(args_attr(args));
        let queryer = if self.caps.query {
            self.conn.as_queryer()
        } else {
            None
        };
        let result = match queryer {
            Some(queryer) => queryer.query(query, args).await,
            None => Err(DriverError::Skip),
        };
        call.finish(result)
    }
}

#[async_trait]
impl QueryerContext for LoggedConn {
    async fn query_context(
        &mut self,
        ctx: &Context,
        query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        let call = self
            .logger
            .call(ctx, Severity::INFO, Category::Conn, "queryContext")
            .attr(query_attr(query))
            .attr(named_args_attr(args));
        let queryer = if self.caps.query_context {
            self.conn.as_queryer_context()
        } else {
            None
        };
        let result = match queryer {
            Some(queryer) => queryer.query_context(ctx, query, args).await,
            None => Err(DriverError::Skip),
        };
        call.finish(result)
    }
}

#[async_trait]
impl ConnPrepareContext for LoggedConn {
    async fn prepare_context(&mut self, ctx: &Context, query: &str) -> Result<Box<dyn Stmt>> {
        let stmt_id = Attr::string("stmtID", new_id());
        let call = self
            .logger
            .call(ctx, Severity::INFO, Category::Conn, "prepareContext")
            .attr(stmt_id.clone())
            .attr(query_attr(query));

        let inner = if self.caps.prepare_context {
            self.conn.as_prepare_context()
        } else {
            None
        };
        let result = if let Some(conn) = inner {
            conn.prepare_context(ctx, query).await
        } else {
            prepare_fallback(self.conn.as_mut(), ctx, query).await
        };

        call.finish(result.map(|stmt| self.wrap_stmt(stmt, query, stmt_id)))
    }
}

#[async_trait]
impl ConnBeginTx for LoggedConn {
    async fn begin_tx(&mut self, ctx: &Context, opts: TxOptions) -> Result<Box<dyn Tx>> {
        let tx_id = Attr::string("txID", new_id());
        let call = self
            .logger
            .call(ctx, Severity::INFO, Category::Conn, "beginTx")
            .since(None)
            .attr(tx_id.clone())
            .attr(Attr::bool("readOnly", opts.read_only()));

        let inner = if self.caps.begin_tx {
            self.conn.as_begin_tx()
        } else {
            None
        };
        let result = if let Some(conn) = inner {
            conn.begin_tx(ctx, opts).await
        } else {
            begin_fallback(self.conn.as_mut(), ctx, &opts).await
        };

        call.finish(result.map(|tx| self.wrap_tx(tx, tx_id)))
    }
}

#[async_trait]
impl SessionResetter for LoggedConn {
    async fn reset_session(&mut self, ctx: &Context) -> Result<()> {
        let call = self
            .logger
            .call(ctx, Severity::DEBUG, Category::Conn, "resetSession")
            .since(None);
        let resetter = if self.caps.reset_session {
            self.conn.as_session_resetter()
        } else {
            None
        };
        let result = match resetter {
            Some(resetter) => resetter.reset_session(ctx).await,
            None => Ok(()),
        };
        call.finish(result)
    }
}

impl NamedValueChecker for LoggedConn {
    fn check_named_value(&mut self, value: &mut NamedValue) -> Result<()> {
        let checker = if self.caps.check_named_value {
            self.conn.as_named_value_checker()
        } else {
            None
        };
        match checker {
            Some(checker) => checker.check_named_value(value),
            None => Err(DriverError::Skip),
        }
    }
}

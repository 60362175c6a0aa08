//! Logged prepared statement wrapper.

use std::fmt;

use async_trait::async_trait;
use sea_orm::Value;

use crate::context::Context;
use crate::driver::{
    named_values_to_values, ExecResult, NamedValue, NamedValueChecker, Rows, Stmt,
    StmtExecContext, StmtQueryContext,
};
use crate::error::{DriverError, Result};
use crate::logger::{args_attr, named_args_attr, Category, EventLogger, Severity};

/// Optional capabilities of a wrapped statement, probed once at wrap time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StmtCapabilities {
    pub exec_context: bool,
    pub query_context: bool,
    pub check_named_value: bool,
}

impl StmtCapabilities {
    pub fn probe(stmt: &mut dyn Stmt) -> Self {
        Self {
            exec_context: stmt.as_exec_context().is_some(),
            query_context: stmt.as_query_context().is_some(),
            check_named_value: stmt.as_named_value_checker().is_some(),
        }
    }
}

/// Wraps a driver statement and logs every call under the statement prefix.
pub struct LoggedStmt {
    stmt: Box<dyn Stmt>,
    query: String,
    caps: StmtCapabilities,
    logger: EventLogger,
}

impl LoggedStmt {
    pub fn new(mut stmt: Box<dyn Stmt>, query: impl Into<String>, logger: EventLogger) -> Self {
        let caps = StmtCapabilities::probe(stmt.as_mut());
        Self {
            stmt,
            query: query.into(),
            caps,
            logger,
        }
    }

    /// The query text this statement was prepared from.
    pub fn sql(&self) -> &str {
        &self.query
    }

    pub fn capabilities(&self) -> StmtCapabilities {
        self.caps
    }
}

impl fmt::Debug for LoggedStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggedStmt")
            .field("query", &self.query)
            .field("caps", &self.caps)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stmt for LoggedStmt {
    async fn close(self: Box<Self>) -> Result<()> {
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Stmt, "close")
            .since(None);
        call.finish(self.stmt.close().await)
    }

    fn num_input(&self) -> Option<usize> {
        self.stmt.num_input()
    }

    async fn exec(&mut self, args: &[Value]) -> Result<ExecResult> {
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Stmt, "exec")
            .attr(args_attr(args));
        call.finish(self.stmt.exec(args).await)
    }

    async fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>> {
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Stmt, "query")
            .attr(args_attr(args));
        call.finish(self.stmt.query(args).await)
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.caps.exec_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.caps.query_context {
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

// Context-aware calls may not return `Skip`, so a statement without the
// capability runs the plain call once arguments convert and the context is live.
async fn exec_fallback(
    stmt: &mut dyn Stmt,
    ctx: &Context,
    args: &[NamedValue],
) -> Result<ExecResult> {
    let values = named_values_to_values(args)?;
    if let Some(err) = ctx.err() {
        return Err(err);
    }
    stmt.exec(&values).await
}

async fn query_fallback(
    stmt: &mut dyn Stmt,
    ctx: &Context,
    args: &[NamedValue],
) -> Result<Box<dyn Rows>> {
    let values = named_values_to_values(args)?;
    if let Some(err) = ctx.err() {
        return Err(err);
    }
    stmt.query(&values).await
}

#[async_trait]
impl StmtExecContext for LoggedStmt {
    async fn exec_context(&mut self, ctx: &Context, args: &[NamedValue]) -> Result<ExecResult> {
        let call = self
            .logger
            .call(ctx, Severity::INFO, Category::Stmt, "execContext")
            .attr(named_args_attr(args));

        let inner = if self.caps.exec_context {
            self.stmt.as_exec_context()
        } else {
            None
        };
        let result = if let Some(stmt) = inner {
            stmt.exec_context(ctx, args).await
        } else {
            exec_fallback(self.stmt.as_mut(), ctx, args).await
        };

        call.finish(result)
    }
}

#[async_trait]
impl StmtQueryContext for LoggedStmt {
    async fn query_context(
        &mut self,
        ctx: &Context,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        let call = self
            .logger
            .call(ctx, Severity::INFO, Category::Stmt, "queryContext")
            .attr(named_args_attr(args));

        let inner = if self.caps.query_context {
            self.stmt.as_query_context()
        } else {
            None
        };
        let result = if let Some(stmt) = inner {
            stmt.query_context(ctx, args).await
        } else {
            query_fallback(self.stmt.as_mut(), ctx, args).await
        };

        call.finish(result)
    }
}

impl NamedValueChecker for LoggedStmt {
    fn check_named_value(&mut self, value: &mut NamedValue) -> Result<()> {
        let checker = if self.caps.check_named_value {
            self.stmt.as_named_value_checker()
        } else {
            None
        };
        match checker {
            Some(checker) => checker.check_named_value(value),
            None => Err(DriverError::Skip),
        }
    }
}

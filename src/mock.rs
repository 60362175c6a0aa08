//! In-memory driver and recording sink used by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::Value;

use crate::context::Context;
use crate::driver::{
    Conn, ConnBeginTx, ConnPrepareContext, Connector, Driver, DriverContext, ExecResult, Execer,
    ExecerContext, NamedValue, NamedValueChecker, Pinger, Queryer, QueryerContext, Rows,
    SessionResetter, Stmt, StmtExecContext, StmtQueryContext, Tx, TxOptions,
};
use crate::error::{DriverError, Result};
use crate::logger::{Event, EventSink};

/// Optional capabilities the mock driver advertises.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockCaps {
    pub driver_context: bool,
    pub ping: bool,
    pub exec: bool,
    pub exec_context: bool,
    pub query: bool,
    pub query_context: bool,
    pub prepare_context: bool,
    pub begin_tx: bool,
    pub reset_session: bool,
    pub check_named_value: bool,
    pub stmt_exec_context: bool,
    pub stmt_query_context: bool,
    pub stmt_check_named_value: bool,
}

impl MockCaps {
    pub fn all() -> Self {
        Self {
            driver_context: true,
            ping: true,
            exec: true,
            exec_context: true,
            query: true,
            query_context: true,
            prepare_context: true,
            begin_tx: true,
            reset_session: true,
            check_named_value: true,
            stmt_exec_context: true,
            stmt_query_context: true,
            stmt_check_named_value: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default)]
struct MockState {
    caps: MockCaps,
    fail_on: Vec<&'static str>,
    stall_on: Vec<&'static str>,
    journal: Mutex<Vec<String>>,
}

impl MockState {
    fn record(&self, op: &'static str) -> Result<()> {
        self.journal.lock().unwrap().push(op.to_string());
        if self.fail_on.contains(&op) {
            return Err(DriverError::driver(std::io::Error::other(format!(
                "mock {op} failed"
            ))));
        }
        Ok(())
    }

    /// Never returns when `op` is listed in `stall_on`.
    async fn stall(&self, op: &'static str) {
        if self.stall_on.contains(&op) {
            std::future::pending::<()>().await;
        }
    }
}

/// Driver whose every real call is appended to a shared journal.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl MockDriver {
    pub fn new(caps: MockCaps) -> Self {
        Self::failing(caps, &[])
    }

    /// Driver whose listed operations return an error.
    pub fn failing(caps: MockCaps, fail_on: &[&'static str]) -> Self {
        Self {
            state: Arc::new(MockState {
                caps,
                fail_on: fail_on.to_vec(),
                stall_on: Vec::new(),
                journal: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Driver whose listed operations are recorded and then never complete.
    pub fn stalling(caps: MockCaps, stall_on: &[&'static str]) -> Self {
        Self {
            state: Arc::new(MockState {
                caps,
                fail_on: Vec::new(),
                stall_on: stall_on.to_vec(),
                journal: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Real calls made so far, in order.
    pub fn journal(&self) -> Vec<String> {
        self.state.journal.lock().unwrap().clone()
    }

    pub fn conn(&self) -> Box<dyn Conn> {
        Box::new(MockConn {
            state: self.state.clone(),
        })
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn open(&self, _name: &str) -> Result<Box<dyn Conn>> {
        self.state.record("open")?;
        Ok(self.conn())
    }

    fn as_driver_context(&self) -> Option<&dyn DriverContext> {
        if self.state.caps.driver_context {
            Some(self)
        } else {
            None
        }
    }
}

impl DriverContext for MockDriver {
    fn open_connector(&self, _name: &str) -> Result<Box<dyn Connector>> {
        self.state.record("open_connector")?;
        Ok(Box::new(MockConnector {
            driver: self.clone(),
        }))
    }
}

struct MockConnector {
    driver: MockDriver,
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _ctx: &Context) -> Result<Box<dyn Conn>> {
        self.driver.state.record("connect")?;
        Ok(self.driver.conn())
    }

    fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(self.driver.clone())
    }
}

struct MockConn {
    state: Arc<MockState>,
}

impl MockConn {
    fn stmt(&self) -> Box<dyn Stmt> {
        Box::new(MockStmt {
            state: self.state.clone(),
        })
    }

    fn tx(&self) -> Box<dyn Tx> {
        Box::new(MockTx {
            state: self.state.clone(),
        })
    }
}

#[async_trait]
impl Conn for MockConn {
    async fn prepare(&mut self, _query: &str) -> Result<Box<dyn Stmt>> {
        self.state.record("prepare")?;
        Ok(self.stmt())
    }

    async fn begin(&mut self) -> Result<Box<dyn Tx>> {
        self.state.record("begin")?;
        Ok(self.tx())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.record("close")
    }

    fn as_pinger(&mut self) -> Option<&mut dyn Pinger> {
        if self.state.caps.ping {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        if self.state.caps.exec {
            Some(self)
        } else {
            None
        }
    }

    fn as_execer_context(&mut self) -> Option<&mut dyn ExecerContext> {
        if self.state.caps.exec_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer(&mut self) -> Option<&mut dyn Queryer> {
        if self.state.caps.query {
            Some(self)
        } else {
            None
        }
    }

    fn as_queryer_context(&mut self) -> Option<&mut dyn QueryerContext> {
        if self.state.caps.query_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_prepare_context(&mut self) -> Option<&mut dyn ConnPrepareContext> {
        if self.state.caps.prepare_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_begin_tx(&mut self) -> Option<&mut dyn ConnBeginTx> {
        if self.state.caps.begin_tx {
            Some(self)
        } else {
            None
        }
    }

    fn as_session_resetter(&mut self) -> Option<&mut dyn SessionResetter> {
        if self.state.caps.reset_session {
            Some(self)
        } else {
            None
        }
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        if self.state.caps.check_named_value {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl Pinger for MockConn {
    async fn ping(&mut self, _ctx: &Context) -> Result<()> {
        self.state.record("ping")
    }
}

#[async_trait]
impl Execer for MockConn {
    async fn exec(&mut self, _query: &str, args: &[Value]) -> Result<ExecResult> {
        self.state.record("exec")?;
        Ok(ExecResult {
            last_insert_id: None,
            rows_affected: args.len() as u64,
        })
    }
}

#[async_trait]
impl ExecerContext for MockConn {
    async fn exec_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        args: &[NamedValue],
    ) -> Result<ExecResult> {
        self.state.record("exec_context")?;
        Ok(ExecResult {
            last_insert_id: Some(7),
            rows_affected: args.len() as u64,
        })
    }
}

#[async_trait]
impl Queryer for MockConn {
    async fn query(&mut self, _query: &str, args: &[Value]) -> Result<Box<dyn Rows>> {
        self.state.record("query")?;
        Ok(MockRows::single(args.to_vec()))
    }
}

#[async_trait]
impl QueryerContext for MockConn {
    async fn query_context(
        &mut self,
        _ctx: &Context,
        _query: &str,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        self.state.record("query_context")?;
        self.state.stall("query_context").await;
        Ok(MockRows::single(args.iter().map(|a| a.value.clone()).collect()))
    }
}

#[async_trait]
impl ConnPrepareContext for MockConn {
    async fn prepare_context(&mut self, _ctx: &Context, _query: &str) -> Result<Box<dyn Stmt>> {
        self.state.record("prepare_context")?;
        Ok(self.stmt())
    }
}

#[async_trait]
impl ConnBeginTx for MockConn {
    async fn begin_tx(&mut self, _ctx: &Context, _opts: TxOptions) -> Result<Box<dyn Tx>> {
        self.state.record("begin_tx")?;
        Ok(self.tx())
    }
}

#[async_trait]
impl SessionResetter for MockConn {
    async fn reset_session(&mut self, _ctx: &Context) -> Result<()> {
        self.state.record("reset_session")
    }
}

impl NamedValueChecker for MockConn {
    fn check_named_value(&mut self, value: &mut NamedValue) -> Result<()> {
        self.state.record("check_named_value")?;
        value.name = None;
        Ok(())
    }
}

struct MockStmt {
    state: Arc<MockState>,
}

#[async_trait]
impl Stmt for MockStmt {
    async fn close(self: Box<Self>) -> Result<()> {
        self.state.record("stmt.close")
    }

    fn num_input(&self) -> Option<usize> {
        Some(2)
    }

    async fn exec(&mut self, args: &[Value]) -> Result<ExecResult> {
        self.state.record("stmt.exec")?;
        self.state.stall("stmt.exec").await;
        Ok(ExecResult {
            last_insert_id: None,
            rows_affected: args.len() as u64,
        })
    }

    async fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>> {
        self.state.record("stmt.query")?;
        Ok(MockRows::single(args.to_vec()))
    }

    fn as_exec_context(&mut self) -> Option<&mut dyn StmtExecContext> {
        if self.state.caps.stmt_exec_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_query_context(&mut self) -> Option<&mut dyn StmtQueryContext> {
        if self.state.caps.stmt_query_context {
            Some(self)
        } else {
            None
        }
    }

    fn as_named_value_checker(&mut self) -> Option<&mut dyn NamedValueChecker> {
        if self.state.caps.stmt_check_named_value {
            Some(self)
        } else {
            None
        }
    }
}

#[async_trait]
impl StmtExecContext for MockStmt {
    async fn exec_context(&mut self, _ctx: &Context, args: &[NamedValue]) -> Result<ExecResult> {
        self.state.record("stmt.exec_context")?;
        Ok(ExecResult {
            last_insert_id: None,
            rows_affected: args.len() as u64,
        })
    }
}

#[async_trait]
impl StmtQueryContext for MockStmt {
    async fn query_context(
        &mut self,
        _ctx: &Context,
        args: &[NamedValue],
    ) -> Result<Box<dyn Rows>> {
        self.state.record("stmt.query_context")?;
        Ok(MockRows::single(args.iter().map(|a| a.value.clone()).collect()))
    }
}

impl NamedValueChecker for MockStmt {
    fn check_named_value(&mut self, _value: &mut NamedValue) -> Result<()> {
        self.state.record("stmt.check_named_value")
    }
}

struct MockTx {
    state: Arc<MockState>,
}

#[async_trait]
impl Tx for MockTx {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.state.record("commit")
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.state.record("rollback")
    }
}

struct MockRows {
    rows: VecDeque<Vec<Value>>,
}

impl MockRows {
    fn single(row: Vec<Value>) -> Box<dyn Rows> {
        Box::new(Self {
            rows: VecDeque::from([row]),
        })
    }
}

impl Rows for MockRows {
    fn columns(&self) -> Vec<String> {
        vec!["value".to_string()]
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }
}

impl EventSink for RecordingSink {
    fn log(&self, _ctx: &Context, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

//! Logged transaction wrapper.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;

use crate::context::Context;
use crate::driver::Tx;
use crate::error::Result;
use crate::logger::{Category, EventLogger, Severity};

/// Wraps a driver transaction. Commit and rollback events report the time
/// elapsed since the transaction was opened.
pub struct LoggedTx {
    tx: Box<dyn Tx>,
    started: Instant,
    logger: EventLogger,
}

impl LoggedTx {
    pub fn new(tx: Box<dyn Tx>, logger: EventLogger) -> Self {
        Self {
            tx,
            started: Instant::now(),
            logger,
        }
    }

    async fn finish(self, op: &str, commit: bool) -> Result<()> {
        let call = self
            .logger
            .call(&Context::background(), Severity::INFO, Category::Tx, op)
            .since(Some(self.started));

        let result = if commit {
            self.tx.commit().await
        } else {
            self.tx.rollback().await
        };

        call.finish(result)
    }
}

impl fmt::Debug for LoggedTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggedTx")
            .field("started", &self.started)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Tx for LoggedTx {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.finish("commit", true).await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.finish("rollback", false).await
    }
}

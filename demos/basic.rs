//! Basic example showing how to use sqlog.
//!
//! Run with: cargo run --example basic

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::Value;
use sqlog::driver::{ExecResult, Execer};
use sqlog::prelude::*;
use sqlog::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A toy driver that stores every executed statement in memory.
#[derive(Default)]
struct MemoryDriver {
    log: Arc<Mutex<Vec<String>>>,
}

struct MemoryConn {
    log: Arc<Mutex<Vec<String>>>,
}

struct MemoryStmt {
    query: String,
    log: Arc<Mutex<Vec<String>>>,
}

struct MemoryRows {
    rows: std::vec::IntoIter<Vec<Value>>,
}

struct MemoryTx;

impl MemoryConn {
    fn record(&self, query: &str) -> u64 {
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        log.push(query.to_string());
        log.len() as u64
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn open(&self, _name: &str) -> Result<Box<dyn Conn>> {
        Ok(Box::new(MemoryConn {
            log: self.log.clone(),
        }))
    }
}

#[async_trait]
impl Conn for MemoryConn {
    async fn prepare(&mut self, query: &str) -> Result<Box<dyn Stmt>> {
        Ok(Box::new(MemoryStmt {
            query: query.to_string(),
            log: self.log.clone(),
        }))
    }

    async fn begin(&mut self) -> Result<Box<dyn Tx>> {
        Ok(Box::new(MemoryTx))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    fn as_execer(&mut self) -> Option<&mut dyn Execer> {
        Some(self)
    }
}

#[async_trait]
impl Execer for MemoryConn {
    async fn exec(&mut self, query: &str, _args: &[Value]) -> Result<ExecResult> {
        let id = self.record(query);
        Ok(ExecResult {
            last_insert_id: Some(id as i64),
            rows_affected: 1,
        })
    }
}

#[async_trait]
impl Stmt for MemoryStmt {
    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    fn num_input(&self) -> Option<usize> {
        None
    }

    async fn exec(&mut self, _args: &[Value]) -> Result<ExecResult> {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(self.query.clone());
        Ok(ExecResult {
            last_insert_id: None,
            rows_affected: 1,
        })
    }

    async fn query(&mut self, args: &[Value]) -> Result<Box<dyn Rows>> {
        let log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        let rows: Vec<Vec<Value>> = log
            .iter()
            .map(|q| {
                let mut row = vec![Value::from(q.clone())];
                row.extend(args.iter().cloned());
                row
            })
            .collect();
        Ok(Box::new(MemoryRows {
            rows: rows.into_iter(),
        }))
    }
}

impl Rows for MemoryRows {
    fn columns(&self) -> Vec<String> {
        vec!["query".to_string()]
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.next())
    }
}

#[async_trait]
impl Tx for MemoryTx {
    async fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sqlog=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut registry = DriverRegistry::new();
    registry.register("memory", Arc::new(MemoryDriver::default()))?;

    // Option 1: Defaults, events named "memory:<op>"
    let db = sqlog::open(&registry, "memory", "mem://demo", |cfg| cfg)?;

    // Option 2: Development config (Skip results surface as warnings)
    // let db = sqlog::open(&registry, "memory", "mem://demo", |_| LogConfig::development());

    let ctx = Context::background();
    let mut conn = db.connect(&ctx).await?;

    if let Some(execer) = conn.as_execer() {
        execer
            .exec("INSERT INTO notes VALUES (?)", &[Value::from("hello")])
            .await?;
    }

    let mut stmt = conn.prepare("SELECT query FROM log").await?;
    let mut rows = stmt.query(&[]).await?;
    while let Some(row) = rows.next_row()? {
        tracing::info!(?row, "row");
    }
    stmt.close().await?;

    let tx = conn.begin().await?;
    tx.commit().await?;

    // Queryer is not implemented by the driver, so the proxy does not offer it either
    assert!(conn.as_queryer().is_none());

    conn.close().await?;

    tracing::info!("Done");
    Ok(())
}

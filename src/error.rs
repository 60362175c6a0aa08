//! Error type shared by the driver contract and the logging proxies.

use sea_orm::DbErr;

/// Result alias used throughout the crate.
pub type Result<T, E = DriverError> = std::result::Result<T, E>;

/// Errors produced by drivers and by the proxy fallback paths.
///
/// The proxies forward every driver error unchanged. The only errors they
/// originate themselves are the context errors and the option errors raised
/// while emulating a context-aware call on top of a plain one.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The optional fast path is not implemented; the caller should fall
    /// back to the generic path.
    #[error("driver: skip fast-path; continue as if unimplemented")]
    Skip,

    /// The connection is unusable and should be discarded by the pool.
    #[error("driver: bad connection")]
    BadConn,

    /// The caller's context was canceled.
    #[error("context canceled")]
    Canceled,

    /// The caller's context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("sql: driver does not support the use of Named Parameters")]
    NamedParameters,

    #[error("sql: driver does not support non-default isolation level")]
    IsolationLevel,

    #[error("sql: driver does not support read-only transactions")]
    ReadOnly,

    #[error("sql: unknown driver {0:?} (forgotten registration?)")]
    UnknownDriver(String),

    #[error("sql: register called twice for driver {0:?}")]
    DuplicateDriver(String),

    /// Error reported by a SeaORM-backed driver.
    #[error(transparent)]
    Db(#[from] DbErr),

    /// Any other error reported by the wrapped driver.
    #[error(transparent)]
    Driver(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl DriverError {
    /// Wrap an arbitrary driver error.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }

    /// Whether this is the "not implemented" sentinel.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    /// Whether this error came from a done context.
    pub fn is_context(&self) -> bool {
        matches!(self, Self::Canceled | Self::DeadlineExceeded)
    }
}

//! Caller-supplied cancellation context.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::DriverError;

/// Cancellation and deadline signal passed to context-aware driver calls.
///
/// Cloning is cheap and clones observe the same cancellation. Child contexts
/// created with [`Context::with_cancel`] or [`Context::with_timeout`] are
/// canceled together with their parent but never cancel it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Build a context around an existing cancellation token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a child context that can be canceled on its own.
    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child context that expires at `deadline` (or earlier if the
    /// parent already expires sooner).
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a child context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the context is canceled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// The reason the context is done, if it is.
    pub fn err(&self) -> Option<DriverError> {
        if self.token.is_cancelled() {
            return Some(DriverError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(DriverError::DeadlineExceeded),
            _ => None,
        }
    }
}

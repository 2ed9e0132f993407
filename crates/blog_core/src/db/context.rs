//! Caller-owned cancellation and deadline signal.
//!
//! # Responsibility
//! - Carry a cancel flag and optional deadline into every store-facing call.
//! - Let another thread abort an in-flight request through [`CancelHandle`].
//!
//! # Invariants
//! - Once tripped, a context stays tripped.
//! - Cancellation is observed at statement and row boundaries only.

use super::{DbError, DbResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation/deadline signal passed to every executor operation.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    canceled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

/// Cloneable handle used to cancel an [`ExecContext`] from elsewhere.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    canceled: Arc<AtomicBool>,
}

impl ExecContext {
    /// Context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            canceled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Returns a handle that cancels this context and all of its clones.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            canceled: Arc::clone(&self.canceled),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns an error when the caller has given up.
    pub fn check(&self) -> DbResult<()> {
        if self.canceled.load(Ordering::Acquire) {
            return Err(DbError::Canceled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(DbError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

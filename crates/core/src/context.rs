//! Cancellation and deadlines
//!
//! Every core operation takes an [`OpContext`]. The context is checked
//! before each store round-trip: a round-trip already in flight completes,
//! but no new one is issued once the handle is cancelled or the deadline
//! has passed. Nothing is rolled back, so a cancelled operation looks
//! exactly like a crash at that point and must be safe to retry.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// New, not-cancelled handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; visible to every clone
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Cancellation handle plus optional deadline
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancel: CancelHandle,
    deadline: Option<Instant>,
}

impl OpContext {
    /// Never cancelled, no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        OpContext {
            cancel: CancelHandle::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Builder: observe an existing cancellation handle
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Builder: set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The cancellation handle, for handing to another party
    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    /// Absolute deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Gate for the next round-trip.
    ///
    /// Cancellation is reported before deadline expiry.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

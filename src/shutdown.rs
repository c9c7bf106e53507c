//! Cooperative cancellation.
//! An `AbortFlag` is shared between the Ctrl-C handler, the planner and the
//! executor. Planning checks it between files, execution between actions;
//! nothing already applied is rolled back.
//!
//! Notes:
//! - Relaxed atomics are sufficient for a one-way "stop" flag.
//! - `request()` is safe to call from signal handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative stop (idempotent).
    #[inline]
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether a stop has been requested.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag so the owner can be reused for the next run.
    #[inline]
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

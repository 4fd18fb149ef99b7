//! Spin-flag locking for the central tier.
//!
//! Critical sections under a `SpinFlag` are short pointer rewires over a
//! bounded batch, so a test-and-set flag with a yield between attempts is
//! preferred over a sleeping mutex. The guard releases the flag on every
//! exit path.

use core::sync::atomic::{AtomicBool, Ordering};
use std::thread;

pub struct SpinFlag {
    locked: AtomicBool,
}

impl SpinFlag {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Acquire the flag, yielding the thread between failed attempts.
    #[inline]
    pub fn lock(&self) -> SpinFlagGuard<'_> {
        while self.locked.swap(true, Ordering::Acquire) {
            thread::yield_now();
        }
        SpinFlagGuard { flag: self }
    }
}

/// Releases the flag when dropped.
pub struct SpinFlagGuard<'a> {
    flag: &'a SpinFlag,
}

impl Drop for SpinFlagGuard<'_> {
    #[inline]
    fn drop(&mut self) {
        self.flag.locked.store(false, Ordering::Release);
    }
}

//! Synchronization utilities for robust mutex handling
//!
//! A panic while holding one of our locks leaves plain bookkeeping behind
//! (flags, handle lists), so a poisoned lock is recovered rather than
//! propagated. Public entry points must never panic because of it.

use std::sync::{Mutex, MutexGuard};

/// Lock `mutex`, recovering the guard if a previous holder panicked
///
/// `context` names the lock in the warning that is logged on recovery.
pub fn lock_recovering<'a, T: ?Sized>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!(
                "Recovered poisoned lock '{}': a previous holder panicked",
                context
            );
            poisoned.into_inner()
        }
    }
}

//! Validation engine, result store and change notification

pub mod executor;
pub mod notifier;
pub mod pending;
pub mod store;

pub use executor::ValidationEngine;
pub use notifier::{ChangeNotifier, Observer, SubscriptionId};
pub use pending::{PendingEvaluation, Scope};
pub use store::{Contribution, ResultStore, Transition};

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Rule code and observers run under catch_unwind, never while these locks are
// held, so a poisoned lock still guards consistent data.

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

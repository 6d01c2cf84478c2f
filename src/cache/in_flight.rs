//! In-flight fetch registrations.
//!
//! # Responsibilities
//! - Atomic check-and-set registration of a running fetch per key
//! - Hand concurrent callers the running fetch's completion signal
//! - Release the registration, then signal completion, exactly once
//!
//! # Design Decisions
//! - The completion signal is a fresh `watch` channel per registration;
//!   it is never reused for the next fetch of the same key
//! - Release happens in `Drop`, so a failed or panicking fetch still wakes
//!   its waiters
//! - The map lock is never held across an await

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;

/// Result of trying to register a fetch for a key.
pub enum Registration {
    /// No fetch was running; the caller now owns the registration.
    Acquired(FetchGuard),
    /// A fetch is already running; wait on this to learn when it finishes.
    Busy(Completion),
}

/// Table of keys with a fetch currently running.
#[derive(Clone, Default)]
pub struct InFlightTable {
    inner: Arc<DashMap<String, watch::Receiver<bool>>>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fetch for `key` unless one is already running.
    pub fn register(&self, key: &str) -> Registration {
        match self.inner.entry(key.to_string()) {
            Entry::Occupied(entry) => Registration::Busy(Completion {
                rx: entry.get().clone(),
            }),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(false);
                entry.insert(rx);
                Registration::Acquired(FetchGuard {
                    table: self.clone(),
                    key: key.to_string(),
                    tx,
                })
            }
        }
    }

    /// Whether a fetch for `key` is running.
    pub fn is_running(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Ownership of a key's registration. Dropping it releases the key and
/// then wakes every waiter.
pub struct FetchGuard {
    table: InFlightTable,
    key: String,
    tx: watch::Sender<bool>,
}

impl FetchGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.table.inner.remove(&self.key);
        // Err only means nobody is waiting.
        let _ = self.tx.send(true);
    }
}

/// Completion signal of someone else's fetch.
pub struct Completion {
    rx: watch::Receiver<bool>,
}

impl Completion {
    /// Wait until the fetch has released its registration.
    pub async fn wait(mut self) {
        // A closed channel means the guard is gone, which is completion too.
        let _ = self.rx.wait_for(|done| *done).await;
    }
}

//! Pending-request ledger.
//!
//! DESIGN
//! ======
//! Maps request identifier → one-shot slot for the raw response text. The
//! reader task fulfills slots; callers await the matching receiver.
//!
//! - Identifiers come from a pre-incremented counter, so the first query is 1
//!   and 0 stays reserved for the handshake.
//! - Entries are removed the moment they are fulfilled, evicted (timeout,
//!   abandoned caller) or failed (disconnect), so the map only ever holds
//!   in-flight requests.
//! - Failing a request means dropping its sender; the waiting receiver then
//!   observes a closed channel instead of hanging. Once closed, the ledger
//!   hands out slots that are already failed.
//!
//! The mutex is never held across an `.await`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

/// Receiving half of a pending request slot.
pub type Slot = oneshot::Receiver<String>;

#[derive(Default)]
struct Inner {
    pending: HashMap<u64, oneshot::Sender<String>>,
    closed: bool,
}

#[derive(Default)]
pub struct Ledger {
    last_id: AtomicU64,
    inner: Mutex<Inner>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier and record an unfulfilled slot under it.
    pub fn register(&self) -> (u64, Slot) {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        let mut inner = self.lock();
        if !inner.closed {
            inner.pending.insert(id, tx);
        }
        (id, rx)
    }

    /// Deliver raw response text to the request registered under `id`.
    ///
    /// Returns `false` when no such request is pending.
    pub fn fulfill(&self, id: u64, raw: String) -> bool {
        let Some(tx) = self.lock().pending.remove(&id) else {
            return false;
        };
        // The caller may have given up already; the entry is gone either way.
        let _ = tx.send(raw);
        true
    }

    /// Drop a pending request without delivering anything.
    pub fn evict(&self, id: u64) -> bool {
        self.lock().pending.remove(&id).is_some()
    }

    /// Fail every pending request and refuse new ones.
    ///
    /// Returns how many waiting requests were released.
    pub fn close(&self) -> usize {
        let drained = {
            let mut inner = self.lock();
            inner.closed = true;
            std::mem::take(&mut inner.pending)
        };
        drained.len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.lock().pending.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;

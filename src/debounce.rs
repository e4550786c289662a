// src/debounce.rs
//
// Single-slot pending timer. Each trigger cancels whatever is pending and
// schedules a fresh delay, so a burst of mutation events collapses into one
// reprocessing pass. Only one slot exists; overlapping fires are impossible.
//
// Callers that observe a pass still in flight when the timer fires should
// simply trigger again — re-arming is the whole serialization story.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `action` to run after the delay, cancelling any pending
    /// schedule first.
    pub fn trigger<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(mut slot) = self.pending.lock() else {
            return;
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
        let delay = self.delay;
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Cancel without rescheduling.
    pub fn cancel(&self) {
        let Ok(mut slot) = self.pending.lock() else {
            return;
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Is a fire currently scheduled?
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|slot| slot.as_ref().map(|h| !h.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

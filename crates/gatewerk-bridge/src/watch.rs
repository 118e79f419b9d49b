// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Repeating polling watches standing in for push-style native callbacks.
//
// Each watch is an independent timer task keyed by a caller-visible id.
// Clearing a watch aborts its task before releasing the id, so no further
// tick callbacks run once `clear` has returned.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use gatewerk_core::types::WatchId;

/// Registry of repeating watch tasks.
///
/// All methods must be called within a tokio runtime; the tasks themselves
/// run on that runtime's timer.
#[derive(Default)]
pub struct WatchRegistry {
    watches: Mutex<HashMap<WatchId, JoinHandle<()>>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a repeating watch. `tick` runs every `period`, first firing
    /// one period after registration.
    pub fn watch(&self, period: Duration, mut tick: impl FnMut() + Send + 'static) -> WatchId {
        let id = WatchId::new();
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The interval yields immediately once; consume that tick so the
            // first callback lands a full period out.
            timer.tick().await;
            loop {
                timer.tick().await;
                tick();
            }
        });
        self.lock().insert(id, handle);
        debug!(watch = %id, period_ms = period.as_millis() as u64, "watch started");
        id
    }

    /// Stop a watch: its task is aborted before the id is released, so no
    /// tick runs after this returns. Unknown ids are a silent no-op.
    pub fn clear(&self, id: &WatchId) {
        if let Some(handle) = self.lock().remove(id) {
            handle.abort();
            debug!(watch = %id, "watch cleared");
        }
    }

    /// Abort every active watch (shutdown path).
    pub fn clear_all(&self) {
        let mut watches = self.lock();
        for (_, handle) in watches.drain() {
            handle.abort();
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WatchId, JoinHandle<()>>> {
        self.watches.lock().expect("watch registry poisoned")
    }
}

impl Drop for WatchRegistry {
    fn drop(&mut self) {
        self.clear_all();
    }
}

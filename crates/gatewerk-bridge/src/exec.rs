// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Correlated call dispatch.
//
// The native boundary may answer a call inline (in-process host) or resolve
// it later through the callback entry points. Both paths share the same
// delivery logic, so callers never need to know which one happened. A
// pending record is removed on first delivery unless the result asks to
// keep the callback (streaming watch pattern).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, warn};

use gatewerk_core::error::{GatewerkError, Result};
use gatewerk_core::types::{CallId, CallStatus, PluginResult};

use crate::host::NativeHost;

/// Continuation invoked with the decoded result payload. An `Err` is
/// logged with call context by the bridge and never propagates further.
pub type Continuation = Box<dyn FnMut(&Value) -> Result<()> + Send>;

struct PendingCall {
    success: Option<Continuation>,
    fail: Option<Continuation>,
    issued_at: DateTime<Utc>,
}

/// Which of a pending call's two continuations a resolution targets.
#[derive(Clone, Copy)]
enum Delivery {
    Success,
    Fail,
}

/// Tracks outstanding native calls and routes resolutions back to their
/// callers, exactly once each unless the result keeps the callback alive.
pub struct CallBridge {
    host: Arc<dyn NativeHost>,
    pending: Mutex<HashMap<CallId, PendingCall>>,
    /// Process-wide sequence shared by every service namespace.
    next_seq: AtomicU64,
    /// Log resolutions for unknown ids. Races make these expected, so the
    /// default is silence.
    log_unmatched: bool,
}

impl CallBridge {
    pub fn new(host: Arc<dyn NativeHost>) -> Self {
        Self::with_options(host, false)
    }

    pub fn with_options(host: Arc<dyn NativeHost>, log_unmatched: bool) -> Self {
        Self {
            host,
            pending: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            log_unmatched,
        }
    }

    /// Number of calls currently awaiting resolution.
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Issue a native call.
    ///
    /// Returns the decoded payload when the host answered inline with OK,
    /// `None` when the host will resolve later or reported an error (the
    /// error reaches `fail` as data, never the caller). Serialisation and
    /// decode failures are logged and cleaned up, never raised.
    pub fn exec(
        &self,
        success: Option<Continuation>,
        fail: Option<Continuation>,
        service: &str,
        action: &str,
        args: &[Value],
    ) -> Option<Value> {
        let id = CallId::new(service, self.next_seq.fetch_add(1, Ordering::Relaxed));

        if success.is_some() || fail.is_some() {
            self.lock_pending().insert(
                id.clone(),
                PendingCall {
                    success,
                    fail,
                    issued_at: Utc::now(),
                },
            );
        }

        let args_json = match serde_json::to_string(args) {
            Ok(json) => json,
            Err(e) => {
                error!(call = %id, error = %e, "failed to serialise call arguments");
                self.lock_pending().remove(&id);
                return None;
            }
        };

        let raw = self.host.invoke(service, action, &id, &args_json);
        if raw.is_empty() {
            // Host resolves later through callback_success / callback_error.
            debug!(call = %id, service, action, "call deferred to native resolution");
            return None;
        }

        let result: PluginResult = match serde_json::from_str(&raw) {
            Ok(result) => result,
            Err(e) => {
                let e = GatewerkError::Decode(e.to_string());
                error!(call = %id, error = %e, "inline result rejected");
                self.lock_pending().remove(&id);
                return None;
            }
        };

        match result.status {
            CallStatus::Ok => {
                self.resolve(&id, &result, Delivery::Success);
                Some(result.message)
            }
            CallStatus::NoResult => {
                if !result.keep_callback {
                    self.lock_pending().remove(&id);
                }
                None
            }
            status => {
                warn!(call = %id, status = ?status, "inline error result");
                self.resolve(&id, &result, Delivery::Fail);
                None
            }
        }
    }

    /// Native-side success resolution. May arrive any number of times for
    /// any id; unknown or stale ids are ignored. The success continuation
    /// only runs for an OK status, but retention is honoured either way.
    pub fn callback_success(&self, id: &CallId, result: &PluginResult) {
        if !self.resolve(id, result, Delivery::Success) {
            self.note_unmatched(id);
        }
    }

    /// Native-side error resolution. The payload always reaches the fail
    /// continuation, whatever the error category. Unknown ids are ignored.
    pub fn callback_error(&self, id: &CallId, result: &PluginResult) {
        if !self.resolve(id, result, Delivery::Fail) {
            self.note_unmatched(id);
        }
    }

    /// Explicitly discard a pending call: a late resolution for this id
    /// becomes a no-op. Does not cancel work on the native side.
    pub fn discard(&self, id: &CallId) {
        if self.lock_pending().remove(id).is_some() {
            debug!(call = %id, "pending call discarded");
        }
    }

    /// Shared delivery logic for the inline and deferred paths. Returns
    /// false when the id is unknown. The record is taken out of the table
    /// while its continuation runs, so reentrant calls observe a consistent
    /// table, and is re-inserted when the result keeps the callback.
    fn resolve(&self, id: &CallId, result: &PluginResult, delivery: Delivery) -> bool {
        let Some(mut call) = self.lock_pending().remove(id) else {
            return false;
        };

        let continuation = match delivery {
            Delivery::Success if result.status == CallStatus::Ok => call.success.as_mut(),
            Delivery::Success => None,
            Delivery::Fail => call.fail.as_mut(),
        };
        if let Some(continuation) = continuation {
            if let Err(e) = continuation(&result.message) {
                match delivery {
                    Delivery::Success => error!(call = %id, error = %e, "error in success callback"),
                    Delivery::Fail => error!(call = %id, error = %e, "error in error callback"),
                }
            }
        }

        if result.keep_callback {
            self.lock_pending().insert(id.clone(), call);
        } else {
            let elapsed_ms = (Utc::now() - call.issued_at).num_milliseconds();
            debug!(call = %id, elapsed_ms, "call resolved");
        }
        true
    }

    fn note_unmatched(&self, id: &CallId) {
        if self.log_unmatched {
            debug!(call = %id, "resolution for unknown call id ignored");
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<CallId, PendingCall>> {
        self.pending.lock().expect("pending-call table poisoned")
    }
}

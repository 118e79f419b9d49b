// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simulated native host for the demo binary.
//
// Answers device-info queries inline, defers echo calls to a spawned task
// that resolves them through the runtime a moment later, and rejects
// everything else — enough surface to drive the full startup handshake
// and both resolution paths without a real WebView.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use gatewerk_bridge::NativeHost;
use gatewerk_core::types::{CallId, CallStatus, PluginResult};
use gatewerk_runtime::Runtime;

pub struct SimulatedHost {
    /// Set after the runtime is built (the runtime owns the host, so the
    /// back-reference has to arrive late).
    runtime: Mutex<Option<Runtime>>,
}

impl SimulatedHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            runtime: Mutex::new(None),
        })
    }

    /// Attach the runtime this host resolves deferred calls through.
    pub fn attach(&self, runtime: Runtime) {
        *self.runtime.lock().expect("runtime slot poisoned") = Some(runtime);
    }

    fn runtime(&self) -> Option<Runtime> {
        self.runtime.lock().expect("runtime slot poisoned").clone()
    }
}

impl NativeHost for SimulatedHost {
    fn invoke(&self, service: &str, action: &str, call_id: &CallId, args_json: &str) -> String {
        debug!(service, action, call = %call_id, "simulated host invoked");
        match (service, action) {
            ("Device", "getInfo") => PluginResult::ok(json!({
                "name": "gatewerk-sim",
                "platform": std::env::consts::OS,
                "version": env!("CARGO_PKG_VERSION"),
            }))
            .encode(),

            ("Echo", "roundtrip") => {
                // Resolve later, like a true native callback would.
                let Some(runtime) = self.runtime() else {
                    warn!("echo call before runtime attach");
                    return PluginResult::error(CallStatus::Error, "host not attached").encode();
                };
                let id = call_id.clone();
                let payload = args_json.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(25)).await;
                    let message = serde_json::from_str(&payload)
                        .unwrap_or_else(|_| json!({ "raw": payload }));
                    runtime.callback_success(&id, &PluginResult::ok(message));
                });
                String::new()
            }

            _ => {
                warn!(service, action, "unknown simulated service");
                PluginResult::error(CallStatus::InvalidAction, "unknown service").encode()
            }
        }
    }
}

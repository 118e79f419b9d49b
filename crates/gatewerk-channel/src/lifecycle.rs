// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Startup sequencing built from channels.
//
// Required order: page_parsed + native_ready (either order) join into the
// constructor run, all_constructed fires immediately after, and a second
// join across all_constructed plus every registered feature-readiness gate
// releases the single device_ready fire. A declared gate that never signals
// holds device_ready forever; hanging on a missing dependency is preferred
// over firing a false ready.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use gatewerk_core::error::Result;

use crate::channel::{Channel, HandlerId};

/// Orders the startup handshake and owns the lifecycle channels.
/// Cheaply clonable; all clones share one state.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<LifecycleInner>,
}

struct LifecycleInner {
    page_parsed: Channel,
    native_ready: Channel,
    /// Constructor callbacks are parked here and run when it fires.
    init: Channel,
    all_constructed: Channel,
    device_ready: Channel,
    resume: Channel,
    pause: Channel,
    /// Named feature gates holding up device_ready, in registration order.
    gates: Mutex<Vec<(String, Channel)>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let lifecycle = Self {
            inner: Arc::new(LifecycleInner {
                page_parsed: Channel::new("page-parsed"),
                native_ready: Channel::new("native-ready"),
                init: Channel::new("init"),
                all_constructed: Channel::new("all-constructed"),
                device_ready: Channel::new("device-ready"),
                resume: Channel::new("resume"),
                pause: Channel::new("pause"),
                gates: Mutex::new(Vec::new()),
            }),
        };

        let wired = lifecycle.clone();
        Channel::join(
            &[
                lifecycle.inner.page_parsed.clone(),
                lifecycle.inner.native_ready.clone(),
            ],
            move || wired.bootstrap(),
        );
        lifecycle
    }

    /// Runs once both startup gates are in: constructors first, then the
    /// second join across every readiness gate registered so far.
    fn bootstrap(&self) {
        info!("startup gates satisfied, running constructors");
        self.inner.init.fire(&[]);
        self.inner.all_constructed.fire(&[]);

        let mut waits = vec![self.inner.all_constructed.clone()];
        {
            let gates = self.inner.gates.lock().expect("gate table poisoned");
            waits.extend(gates.iter().map(|(_, channel)| channel.clone()));
        }
        let device_ready = self.inner.device_ready.clone();
        Channel::join(&waits, move || {
            info!("all readiness gates fired, device ready");
            device_ready.fire(&[]);
        });
    }

    // -- Startup signals (fired by the hosting environment) ------------------

    /// The hosting document finished parsing.
    pub fn page_parsed(&self) {
        self.inner.page_parsed.fire(&[]);
    }

    /// The native host reported readiness. May arrive before or after
    /// `page_parsed`; the startup join is order-independent.
    pub fn native_ready(&self) {
        self.inner.native_ready.fire(&[]);
    }

    /// The host brought the application to the foreground.
    pub fn resume(&self) {
        self.inner.resume.fire(&[]);
    }

    /// The host sent the application to the background.
    pub fn pause(&self) {
        self.inner.pause.fire(&[]);
    }

    // -- Constructors --------------------------------------------------------

    /// Queue a one-shot initializer to run once the startup join completes
    /// (immediately, if it already has). Failures are logged per
    /// constructor and never stop the others.
    pub fn add_constructor(&self, constructor: impl FnOnce() -> Result<()> + Send + 'static) {
        let mut slot = Some(constructor);
        let _ = self.inner.init.subscribe_once(move |_| {
            if let Some(constructor) = slot.take() {
                if let Err(e) = constructor() {
                    error!(error = %e, "constructor failed");
                }
            }
            true
        });
    }

    // -- Feature readiness gates ---------------------------------------------

    /// Declare that `feature` must signal `ready` before device_ready can
    /// fire. Must happen before the startup join completes (typically from
    /// a constructor or earlier). Duplicate declarations are ignored.
    pub fn wait_for(&self, feature: &str) {
        if feature.is_empty() {
            warn!("feature gate with empty name rejected");
            return;
        }
        let mut gates = self.inner.gates.lock().expect("gate table poisoned");
        if gates.iter().any(|(name, _)| name == feature) {
            warn!(feature, "feature gate already registered");
            return;
        }
        debug!(feature, "feature gate registered");
        gates.push((feature.to_string(), Channel::new(feature)));
    }

    /// Signal that `feature` finished initialising. Unknown names are a
    /// logged no-op.
    pub fn ready(&self, feature: &str) {
        let gate = {
            let gates = self.inner.gates.lock().expect("gate table poisoned");
            gates
                .iter()
                .find(|(name, _)| name == feature)
                .map(|(_, channel)| channel.clone())
        };
        match gate {
            Some(channel) => {
                debug!(feature, "feature gate fired");
                channel.fire(&[]);
            }
            None => debug!(feature, "ready signal for unregistered feature ignored"),
        }
    }

    // -- Public lifecycle events ---------------------------------------------

    /// Run `handler` once the device is ready. If device_ready has already
    /// fired, `handler` runs synchronously right now; there is never a
    /// second real fire.
    pub fn on_device_ready(&self, handler: impl FnOnce() + Send + 'static) {
        let mut slot = Some(handler);
        let _ = self.inner.device_ready.subscribe_once(move |_| {
            if let Some(handler) = slot.take() {
                handler();
            }
            true
        });
    }

    /// Subscribe to resume events. A subscriber arriving after a resume has
    /// fired is invoked immediately, then again on each later resume.
    pub fn on_resume(&self, handler: impl FnMut(&[Value]) -> bool + Send + 'static) -> HandlerId {
        self.inner.resume.subscribe_replay(handler)
    }

    /// Subscribe to pause events. No replay for late subscribers.
    pub fn on_pause(&self, handler: impl FnMut(&[Value]) -> bool + Send + 'static) -> HandlerId {
        self.inner.pause.subscribe(handler)
    }

    pub fn is_device_ready(&self) -> bool {
        self.inner.device_ready.is_fired()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

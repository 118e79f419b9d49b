// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central runtime facade — wires the lifecycle sequencer, the call bridge,
// and the watch registry together and exposes the operations device
// features and the hosting environment are allowed to use.
//
// All fields are cheaply cloneable (Arc-wrapped) so the struct can be
// passed into plugin constructors and continuations without lifetime
// issues.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use gatewerk_bridge::{CallBridge, Continuation, NativeHost, StubHost, WatchRegistry};
use gatewerk_channel::{HandlerId, Lifecycle};
use gatewerk_core::RuntimeConfig;
use gatewerk_core::types::{CallId, PluginResult, WatchId};

use crate::plugins::{DevicePlugin, PluginRegistry};

/// Shared runtime handle. Clones share all state.
#[derive(Clone)]
pub struct Runtime {
    lifecycle: Lifecycle,
    bridge: Arc<CallBridge>,
    watches: Arc<WatchRegistry>,
    plugins: Arc<PluginRegistry>,
    config: Arc<RuntimeConfig>,
}

impl Runtime {
    /// Build a runtime over the given native host. Call once at startup.
    pub fn new(host: Arc<dyn NativeHost>, config: RuntimeConfig) -> Self {
        let bridge = CallBridge::with_options(host, config.log_unmatched_resolutions);
        info!("runtime initialised");
        Self {
            lifecycle: Lifecycle::new(),
            bridge: Arc::new(bridge),
            watches: Arc::new(WatchRegistry::new()),
            plugins: Arc::new(PluginRegistry::new()),
            config: Arc::new(config),
        }
    }

    /// Stub-host runtime for tests and headless builds.
    pub fn headless(config: RuntimeConfig) -> Self {
        Self::new(Arc::new(StubHost), config)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    // -- Plugins -------------------------------------------------------------

    /// Record a plugin and queue its `initialize` as a startup constructor.
    /// Duplicate service names keep the first registration; no constructor
    /// is queued for the duplicate.
    pub fn register_plugin(&self, plugin: Arc<dyn DevicePlugin>) {
        if !self.plugins.register(plugin.clone()) {
            return;
        }
        let runtime = self.clone();
        self.lifecycle
            .add_constructor(move || plugin.initialize(&runtime));
    }

    pub fn plugin(&self, service: &str) -> Option<Arc<dyn DevicePlugin>> {
        self.plugins.get(service)
    }

    // -- Native calls --------------------------------------------------------

    /// Issue a correlated native call. See `CallBridge::exec`.
    pub fn exec(
        &self,
        success: Option<Continuation>,
        fail: Option<Continuation>,
        service: &str,
        action: &str,
        args: &[Value],
    ) -> Option<Value> {
        self.bridge.exec(success, fail, service, action, args)
    }

    /// Native-side success resolution entry point.
    pub fn callback_success(&self, id: &CallId, result: &PluginResult) {
        self.bridge.callback_success(id, result);
    }

    /// Native-side error resolution entry point.
    pub fn callback_error(&self, id: &CallId, result: &PluginResult) {
        self.bridge.callback_error(id, result);
    }

    /// Drop a pending call so a late resolution becomes a no-op.
    pub fn discard(&self, id: &CallId) {
        self.bridge.discard(id);
    }

    pub fn pending_calls(&self) -> usize {
        self.bridge.pending_count()
    }

    // -- Startup signals and lifecycle events --------------------------------

    pub fn page_parsed(&self) {
        self.lifecycle.page_parsed();
    }

    pub fn native_ready(&self) {
        self.lifecycle.native_ready();
    }

    pub fn resume(&self) {
        self.lifecycle.resume();
    }

    pub fn pause(&self) {
        self.lifecycle.pause();
    }

    pub fn add_constructor(
        &self,
        constructor: impl FnOnce() -> gatewerk_core::error::Result<()> + Send + 'static,
    ) {
        self.lifecycle.add_constructor(constructor);
    }

    /// Declare a named readiness gate holding up device_ready.
    pub fn wait_for(&self, feature: &str) {
        self.lifecycle.wait_for(feature);
    }

    /// Signal a named readiness gate.
    pub fn ready(&self, feature: &str) {
        self.lifecycle.ready(feature);
    }

    pub fn on_device_ready(&self, handler: impl FnOnce() + Send + 'static) {
        self.lifecycle.on_device_ready(handler);
    }

    pub fn on_resume(
        &self,
        handler: impl FnMut(&[Value]) -> bool + Send + 'static,
    ) -> HandlerId {
        self.lifecycle.on_resume(handler)
    }

    pub fn on_pause(
        &self,
        handler: impl FnMut(&[Value]) -> bool + Send + 'static,
    ) -> HandlerId {
        self.lifecycle.on_pause(handler)
    }

    pub fn is_device_ready(&self) -> bool {
        self.lifecycle.is_device_ready()
    }

    // -- Watches -------------------------------------------------------------

    /// Start a polling watch on the configured default period.
    pub fn watch(&self, tick: impl FnMut() + Send + 'static) -> WatchId {
        self.watch_every(
            Duration::from_millis(self.config.default_watch_period_ms),
            tick,
        )
    }

    /// Start a polling watch on an explicit period.
    pub fn watch_every(&self, period: Duration, tick: impl FnMut() + Send + 'static) -> WatchId {
        self.watches.watch(period, tick)
    }

    /// Stop a watch; no tick runs after this returns.
    pub fn clear_watch(&self, id: &WatchId) {
        self.watches.clear(id);
    }

    pub fn active_watches(&self) -> usize {
        self.watches.active_count()
    }

    /// Stop every watch (shutdown path).
    pub fn shutdown(&self) {
        info!("runtime shutting down, clearing watches");
        self.watches.clear_all();
    }
}

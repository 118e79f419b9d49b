// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin registry.
//
// Device features register under a service name; the name doubles as the
// call-id namespace the feature uses on the bridge. First registration
// wins, later ones are logged and dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use gatewerk_core::error::Result;

use crate::runtime::Runtime;

/// A device feature living on top of the core. It may declare readiness
/// gates, issue native calls, and start watches through the runtime handle
/// handed to `initialize`.
pub trait DevicePlugin: Send + Sync {
    /// Service name; also the call-id namespace this feature uses.
    fn service(&self) -> &str;

    /// Runs as a startup constructor once the page and the native host are
    /// both ready.
    fn initialize(&self, runtime: &Runtime) -> Result<()>;
}

/// Name-to-plugin table.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Mutex<HashMap<String, Arc<dyn DevicePlugin>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. Returns `false` (and logs) when the name is
    /// already taken; the original registration stays.
    pub fn register(&self, plugin: Arc<dyn DevicePlugin>) -> bool {
        let name = plugin.service().to_string();
        let mut plugins = self.lock();
        if plugins.contains_key(&name) {
            warn!(plugin = %name, "plugin already registered, keeping the first");
            return false;
        }
        debug!(plugin = %name, "plugin registered");
        plugins.insert(name, plugin);
        true
    }

    pub fn get(&self, service: &str) -> Option<Arc<dyn DevicePlugin>> {
        self.lock().get(service).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn DevicePlugin>>> {
        self.plugins.lock().expect("plugin table poisoned")
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gatewerk — Process-wide runtime facade.
//
// One Runtime instance is constructed at startup and owns the lifecycle
// sequencer, the call bridge, the watch registry, and the plugin table.
// Device features hold clones of it and reach everything through the
// operations exposed here; the underlying tables are never handed out.

pub mod plugins;
pub mod runtime;

pub use plugins::{DevicePlugin, PluginRegistry};
pub use runtime::Runtime;

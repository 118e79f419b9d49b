// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gatewerk — Correlated call dispatch across the native host boundary.
//
// Every outbound call gets a fresh id, the caller's continuations are
// parked under it, and the native side resolves them later (or inline).
// The polling-watch registry lives here too: repeating timer tasks stand
// in for push-style native callbacks.

pub mod exec;
pub mod host;
pub mod stub;
pub mod watch;

pub use exec::{CallBridge, Continuation};
pub use host::NativeHost;
pub use stub::StubHost;
pub use watch::WatchRegistry;

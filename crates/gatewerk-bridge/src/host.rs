// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The native invocation boundary.

use gatewerk_core::types::CallId;

/// Synchronous-looking entry into the native plugin host.
///
/// The host may answer inline or defer: an empty return string means the
/// call will be resolved later through the bridge's resolution entry
/// points, anything else is a JSON-encoded result envelope
/// (`{"status", "message", "keepCallback"}`) that the bridge decodes
/// exactly once.
pub trait NativeHost: Send + Sync {
    fn invoke(&self, service: &str, action: &str, call_id: &CallId, args_json: &str) -> String;
}

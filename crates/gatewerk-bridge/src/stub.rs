// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub host for headless builds where no native plugin host is attached.
//
// Every invocation is answered with an ERROR envelope — real hosts live in
// the embedding application.

use gatewerk_core::types::{CallId, CallStatus, PluginResult};

use crate::host::NativeHost;

/// No-op host answering every invocation with an error result.
pub struct StubHost;

impl NativeHost for StubHost {
    fn invoke(&self, service: &str, action: &str, _call_id: &CallId, _args_json: &str) -> String {
        tracing::warn!(service, action, "native invocation on stub host");
        PluginResult::error(CallStatus::InvalidAction, "no native host attached").encode()
    }
}

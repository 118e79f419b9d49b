// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Gatewerk bridge: call identifiers, watch
// handles, and the result envelope exchanged with the native host.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for an outstanding native call.
///
/// Composed of the issuing service token plus a process-wide counter
/// (e.g. `Geolocation14`), so concurrent calls from different features can
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(String);

impl CallId {
    pub fn new(service: &str, seq: u64) -> Self {
        Self(format!("{service}{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-visible handle for a repeating polling watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchId(pub Uuid);

impl WatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status codes carried in the native result envelope.
///
/// The wire format is the bare integer. Callers only need to distinguish
/// `Ok` / `NoResult` / error-with-payload; the specific error category is
/// passed through opaquely to the fail continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CallStatus {
    NoResult,
    Ok,
    ClassNotFound,
    IllegalAccess,
    Instantiation,
    MalformedUrl,
    Io,
    InvalidAction,
    Json,
    Error,
}

impl CallStatus {
    /// Anything other than `Ok` and `NoResult` is an error category.
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::NoResult | Self::Ok)
    }
}

impl From<CallStatus> for u8 {
    fn from(status: CallStatus) -> u8 {
        match status {
            CallStatus::NoResult => 0,
            CallStatus::Ok => 1,
            CallStatus::ClassNotFound => 2,
            CallStatus::IllegalAccess => 3,
            CallStatus::Instantiation => 4,
            CallStatus::MalformedUrl => 5,
            CallStatus::Io => 6,
            CallStatus::InvalidAction => 7,
            CallStatus::Json => 8,
            CallStatus::Error => 9,
        }
    }
}

impl TryFrom<u8> for CallStatus {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, String> {
        match value {
            0 => Ok(CallStatus::NoResult),
            1 => Ok(CallStatus::Ok),
            2 => Ok(CallStatus::ClassNotFound),
            3 => Ok(CallStatus::IllegalAccess),
            4 => Ok(CallStatus::Instantiation),
            5 => Ok(CallStatus::MalformedUrl),
            6 => Ok(CallStatus::Io),
            7 => Ok(CallStatus::InvalidAction),
            8 => Ok(CallStatus::Json),
            9 => Ok(CallStatus::Error),
            other => Err(format!("unknown call status {other}")),
        }
    }
}

/// Result envelope returned by the native side, either inline from
/// `NativeHost::invoke` or through the resolution entry points.
///
/// `keep_callback` requests that the pending call stay resolvable after
/// this result is delivered (streaming watch pattern).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginResult {
    pub status: CallStatus,
    #[serde(default)]
    pub message: Value,
    #[serde(default, rename = "keepCallback")]
    pub keep_callback: bool,
}

impl PluginResult {
    pub fn ok(message: impl Into<Value>) -> Self {
        Self {
            status: CallStatus::Ok,
            message: message.into(),
            keep_callback: false,
        }
    }

    pub fn no_result() -> Self {
        Self {
            status: CallStatus::NoResult,
            message: Value::Null,
            keep_callback: false,
        }
    }

    pub fn error(status: CallStatus, message: impl Into<Value>) -> Self {
        Self {
            status,
            message: message.into(),
            keep_callback: false,
        }
    }

    /// Request retention of the pending call after delivery.
    pub fn keep(mut self) -> Self {
        self.keep_callback = true;
        self
    }

    /// Wire encoding as handed back by `NativeHost::invoke`.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("result envelope is always serialisable")
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime configuration.

use serde::{Deserialize, Serialize};

/// Persistent runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Period for polling watches when the caller does not specify one.
    pub default_watch_period_ms: u64,
    /// Log resolutions arriving for unknown call ids. Races make these
    /// expected, so the default is silence.
    pub log_unmatched_resolutions: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_watch_period_ms: 10_000,
            log_unmatched_resolutions: false,
        }
    }
}

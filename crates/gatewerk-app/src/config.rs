// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Config file persistence for the demo host.

use std::path::Path;

use gatewerk_core::RuntimeConfig;
use gatewerk_core::error::Result;

const CONFIG_FILE: &str = "gatewerk.json";

/// Load the runtime config from `dir`, or `None` when absent or unreadable.
pub fn load_config(dir: &Path) -> Option<RuntimeConfig> {
    let path = dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

/// Persist the runtime config to `dir`.
pub fn persist_config(dir: &Path, config: &RuntimeConfig) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = RuntimeConfig {
            default_watch_period_ms: 250,
            log_unmatched_resolutions: true,
        };
        persist_config(dir.path(), &config).expect("persist");

        let loaded = load_config(dir.path()).expect("load");
        assert_eq!(loaded.default_watch_period_ms, 250);
        assert!(loaded.log_unmatched_resolutions);
    }

    #[test]
    fn missing_config_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_config(dir.path()).is_none());
    }
}

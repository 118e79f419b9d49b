// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gatewerk — WebView device-API bridge demo host.
//
// Entry point. Initialises logging, loads config, wires a runtime over the
// simulated native host, and drives a full startup handshake: plugin
// constructor, readiness gate, device-ready, an async echo round trip, and
// a short polling watch.

mod config;
mod sim;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tracing::info;

use gatewerk_core::RuntimeConfig;
use gatewerk_core::error::Result;
use gatewerk_runtime::{DevicePlugin, Runtime};

use sim::SimulatedHost;

/// Sample feature: holds device-ready on its gate until the device info
/// query has come back from the host.
struct DeviceInfoPlugin;

impl DevicePlugin for DeviceInfoPlugin {
    fn service(&self) -> &str {
        "Device"
    }

    fn initialize(&self, runtime: &Runtime) -> Result<()> {
        runtime.wait_for("device-info");
        let handle = runtime.clone();
        runtime.exec(
            Some(Box::new(move |details| {
                info!(device = %details, "device info received");
                handle.ready("device-info");
                Ok(())
            })),
            None,
            "Device",
            "getInfo",
            &[],
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Gatewerk demo starting");

    let data_dir = std::env::current_dir()?;
    let config = config::load_config(&data_dir).unwrap_or_else(|| {
        let config = RuntimeConfig::default();
        if let Err(e) = config::persist_config(&data_dir, &config) {
            tracing::warn!(error = %e, "could not persist default config");
        }
        config
    });

    let host = SimulatedHost::new();
    let runtime = Runtime::new(host.clone(), config);
    host.attach(runtime.clone());

    runtime.register_plugin(Arc::new(DeviceInfoPlugin));

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    runtime.on_device_ready(move || {
        let _ = ready_tx.send(());
    });

    // The hosting environment reports in; order would not matter.
    runtime.page_parsed();
    runtime.native_ready();

    ready_rx.await.expect("device ready never fired");
    info!("device ready");

    // Async round trip through the deferred resolution path.
    let (echo_tx, echo_rx) = tokio::sync::oneshot::channel();
    let echo_tx = Mutex::new(Some(echo_tx));
    runtime.exec(
        Some(Box::new(move |message| {
            if let Some(tx) = echo_tx.lock().expect("echo signal").take() {
                let _ = tx.send(message.clone());
            }
            Ok(())
        })),
        None,
        "Echo",
        "roundtrip",
        &[json!("hello from the page")],
    );
    let echoed = echo_rx.await.expect("echo never resolved");
    info!(%echoed, "echo resolved");

    // A short polling watch, then a clean shutdown.
    let watch_id = runtime.watch_every(Duration::from_millis(100), || {
        info!("watch tick");
    });
    tokio::time::sleep(Duration::from_millis(350)).await;
    runtime.clear_watch(&watch_id);

    runtime.shutdown();
    info!("Gatewerk demo complete");
    Ok(())
}

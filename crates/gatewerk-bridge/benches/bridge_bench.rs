// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for call dispatch in the gatewerk-bridge crate.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use gatewerk_bridge::{CallBridge, NativeHost};
use gatewerk_core::types::{CallId, PluginResult};

/// Host double answering every call inline with OK.
struct InlineHost;

impl NativeHost for InlineHost {
    fn invoke(&self, _service: &str, _action: &str, _call_id: &CallId, _args_json: &str) -> String {
        PluginResult::ok("pong").encode()
    }
}

/// Host double deferring every call to async resolution.
struct DeferringHost;

impl NativeHost for DeferringHost {
    fn invoke(&self, _service: &str, _action: &str, _call_id: &CallId, _args_json: &str) -> String {
        String::new()
    }
}

/// Benchmark the inline round trip: allocate an id, serialise arguments,
/// decode the envelope, and deliver to the success continuation.
fn bench_exec_inline_ok(c: &mut Criterion) {
    let bridge = CallBridge::new(Arc::new(InlineHost));
    let args = [json!({"detail": true}), json!(42)];

    c.bench_function("exec_inline_ok", |b| {
        b.iter(|| {
            let returned = bridge.exec(
                Some(Box::new(|message| {
                    black_box(message);
                    Ok(())
                })),
                None,
                "Device",
                "ping",
                black_box(&args),
            );
            black_box(returned);
        });
    });
}

/// Benchmark the deferred path: issue then resolve by id, the shape every
/// true native callback takes.
fn bench_exec_deferred_resolution(c: &mut Criterion) {
    c.bench_function("exec_deferred_then_resolve", |b| {
        let bridge = CallBridge::new(Arc::new(DeferringHost));
        let mut seq = 0u64;

        b.iter(|| {
            bridge.exec(
                Some(Box::new(|message| {
                    black_box(message);
                    Ok(())
                })),
                None,
                "Geolocation",
                "getCurrentPosition",
                &[],
            );
            // Ids are allocated in sequence by a single bridge.
            let id = CallId::new("Geolocation", seq);
            seq += 1;
            bridge.callback_success(&id, &PluginResult::ok(json!({"lat": 51.5})));
        });
    });
}

criterion_group!(benches, bench_exec_inline_ok, bench_exec_deferred_resolution);
criterion_main!(benches);

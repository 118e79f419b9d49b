// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gatewerk — Signal channels and startup sequencing.
//
// A Channel is a named pub/sub gate that remembers its first fire, so late
// subscribers can be replayed instead of waiting forever. The Lifecycle
// sequencer composes channels into the startup handshake that ends in a
// single device-ready fire.

pub mod channel;
pub mod lifecycle;

pub use channel::{Channel, HandlerId};
pub use lifecycle::Lifecycle;

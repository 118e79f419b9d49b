// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Gatewerk.

use thiserror::Error;

/// Top-level error type for all Gatewerk operations.
#[derive(Debug, Error)]
pub enum GatewerkError {
    // -- Channel / lifecycle --
    #[error("constructor failed: {0}")]
    Constructor(String),

    // -- Call bridge --
    #[error("callback failed: {0}")]
    Callback(String),

    #[error("malformed native result: {0}")]
    Decode(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GatewerkError>;

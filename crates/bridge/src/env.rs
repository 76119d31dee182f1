// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Reads a variable, treating unset and non-unicode values alike.
pub fn lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Returns the value of `VOICE_BRIDGE_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    lookup(vars::VOICE_BRIDGE_CONFIG)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

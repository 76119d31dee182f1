// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::var("OUT_DIR")?;
    let path = std::path::Path::new(&out_dir).join("env_vars.rs");
    let mut f = std::fs::File::create(path)?;

    let vars = [
        "VOICE_BRIDGE_CONFIG",
        "VOICE_BRIDGE_URL",
        "VOICE_BRIDGE_SESSION_ID",
        "VOICE_BRIDGE_INITIAL_RECONNECT_DELAY_MS",
        "VOICE_BRIDGE_MAX_RECONNECT_DELAY_MS",
        "VOICE_BRIDGE_MAX_RECONNECTS",
        "VOICE_BRIDGE_HEARTBEAT_INTERVAL_MS",
        "VOICE_BRIDGE_HEARTBEAT_TIMEOUT_MS",
        "VOICE_BRIDGE_WRITE_TIMEOUT_MS",
        "VOICE_BRIDGE_READ_TIMEOUT_MS",
        "VOICE_BRIDGE_HANDSHAKE_TIMEOUT_MS",
        "VOICE_BRIDGE_MAX_PENDING",
        "VOICE_BRIDGE_CONNECT_ON_SEND",
    ];

    for name in &vars {
        writeln!(f, "pub const {name}: &str = \"{name}\";")?;
    }

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}

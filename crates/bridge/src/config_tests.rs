// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::io::Write;

use yare::parameterized;

use super::*;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults() {
    let config = BridgeConfig::default();
    assert_eq!(config.url, "ws://localhost:8765");
    assert_eq!(config.session_id, "default");
    assert_eq!(config.initial_reconnect_delay, Duration::from_secs(1));
    assert_eq!(config.max_reconnect_delay, Duration::from_secs(30));
    assert_eq!(config.max_reconnects, 10);
    assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    assert_eq!(config.heartbeat_timeout, Duration::from_secs(60));
    assert_eq!(config.write_timeout, Duration::from_secs(10));
    assert_eq!(config.read_timeout, Duration::from_secs(120));
    assert_eq!(config.handshake_timeout, Duration::from_secs(10));
    assert_eq!(config.max_pending_messages, 50);
    assert_eq!(config.interrupt_capacity, 10);
    assert!(!config.connect_on_send);
    config.validate().unwrap();
}

#[test]
fn new_overrides_only_url() {
    let config = BridgeConfig::new("wss://voice.example:9000/stream");
    assert_eq!(config.url, "wss://voice.example:9000/stream");
    assert_eq!(config.max_pending_messages, 50);
}

#[test]
fn load_partial_file_fills_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
url = "ws://10.0.0.5:8765"
session_id = "kitchen"
max_reconnects = 0
heartbeat_interval_ms = 5000
heartbeat_timeout_ms = 15000
"#
    )
    .unwrap();

    let config = BridgeConfig::load(file.path()).unwrap();

    assert_eq!(config.url, "ws://10.0.0.5:8765");
    assert_eq!(config.session_id, "kitchen");
    assert_eq!(config.max_reconnects, 0);
    assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
    assert_eq!(config.heartbeat_timeout, Duration::from_secs(15));
    assert_eq!(config.write_timeout, Duration::from_secs(10));
    config.validate().unwrap();
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BridgeConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn unknown_field_is_parse_error() {
    let err = BridgeConfig::from_toml_str("heartbeat = 3").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn wrong_type_is_parse_error() {
    let err = BridgeConfig::from_toml_str(r#"max_reconnects = "many""#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn env_overrides_fields() {
    let lookup = env_of(&[
        ("VOICE_BRIDGE_URL", "ws://orchestrator:8765"),
        ("VOICE_BRIDGE_SESSION_ID", "desk"),
        ("VOICE_BRIDGE_INITIAL_RECONNECT_DELAY_MS", "250"),
        ("VOICE_BRIDGE_MAX_RECONNECT_DELAY_MS", "4000"),
        ("VOICE_BRIDGE_MAX_RECONNECTS", "3"),
        ("VOICE_BRIDGE_HEARTBEAT_INTERVAL_MS", "1000"),
        ("VOICE_BRIDGE_HEARTBEAT_TIMEOUT_MS", "3000"),
        ("VOICE_BRIDGE_WRITE_TIMEOUT_MS", "500"),
        ("VOICE_BRIDGE_READ_TIMEOUT_MS", "10000"),
        ("VOICE_BRIDGE_HANDSHAKE_TIMEOUT_MS", "2000"),
        ("VOICE_BRIDGE_MAX_PENDING", "3"),
        ("VOICE_BRIDGE_CONNECT_ON_SEND", "true"),
    ]);

    let config = BridgeConfig::default().apply_env_with(lookup).unwrap();

    assert_eq!(config.url, "ws://orchestrator:8765");
    assert_eq!(config.session_id, "desk");
    assert_eq!(config.initial_reconnect_delay, Duration::from_millis(250));
    assert_eq!(config.max_reconnect_delay, Duration::from_secs(4));
    assert_eq!(config.max_reconnects, 3);
    assert_eq!(config.heartbeat_interval, Duration::from_secs(1));
    assert_eq!(config.heartbeat_timeout, Duration::from_secs(3));
    assert_eq!(config.write_timeout, Duration::from_millis(500));
    assert_eq!(config.read_timeout, Duration::from_secs(10));
    assert_eq!(config.handshake_timeout, Duration::from_secs(2));
    assert_eq!(config.max_pending_messages, 3);
    assert!(config.connect_on_send);
    config.validate().unwrap();
}

#[test]
fn empty_env_values_are_ignored() {
    let lookup = env_of(&[("VOICE_BRIDGE_URL", "  "), ("VOICE_BRIDGE_MAX_PENDING", "")]);
    let config = BridgeConfig::default().apply_env_with(lookup).unwrap();
    assert_eq!(config, BridgeConfig::default());
}

#[parameterized(
    bad_number = { "VOICE_BRIDGE_MAX_RECONNECTS", "three" },
    negative = { "VOICE_BRIDGE_MAX_PENDING", "-1" },
    fractional_ms = { "VOICE_BRIDGE_WRITE_TIMEOUT_MS", "1.5" },
    bad_flag = { "VOICE_BRIDGE_CONNECT_ON_SEND", "maybe" },
)]
fn invalid_env_value(var: &str, value: &str) {
    let err = BridgeConfig::default()
        .apply_env_with(env_of(&[(var, value)]))
        .unwrap_err();
    match err {
        ConfigError::InvalidValue { var: got, value: v } => {
            assert_eq!(got, var);
            assert_eq!(v, value);
        }
        other => panic!("expected InvalidValue, got {:?}", other),
    }
}

#[parameterized(
    one = { "1", true },
    yes = { "YES", true },
    off = { "off", false },
    zero = { "0", false },
)]
fn connect_on_send_flag(value: &str, expected: bool) {
    let config = BridgeConfig::default()
        .apply_env_with(env_of(&[("VOICE_BRIDGE_CONNECT_ON_SEND", value)]))
        .unwrap();
    assert_eq!(config.connect_on_send, expected);
}

#[parameterized(
    http_url = { |c: &mut BridgeConfig| c.url = "http://localhost:8765".into() },
    zero_initial_delay = { |c: &mut BridgeConfig| c.initial_reconnect_delay = Duration::ZERO },
    max_below_initial = { |c: &mut BridgeConfig| c.max_reconnect_delay = Duration::from_millis(500) },
    zero_interval = { |c: &mut BridgeConfig| c.heartbeat_interval = Duration::ZERO },
    timeout_equals_interval = { |c: &mut BridgeConfig| c.heartbeat_timeout = Duration::from_secs(30) },
    timeout_below_interval = { |c: &mut BridgeConfig| c.heartbeat_timeout = Duration::from_secs(10) },
    read_timeout_too_short = { |c: &mut BridgeConfig| c.read_timeout = Duration::from_secs(90) },
    zero_write_timeout = { |c: &mut BridgeConfig| c.write_timeout = Duration::ZERO },
    zero_pending = { |c: &mut BridgeConfig| c.max_pending_messages = 0 },
    zero_interrupt_capacity = { |c: &mut BridgeConfig| c.interrupt_capacity = 0 },
)]
fn validate_rejects(mutate: fn(&mut BridgeConfig)) {
    let mut config = BridgeConfig::default();
    mutate(&mut config);
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn validate_rejects_heartbeat_window_overflow() {
    let mut config = BridgeConfig::default();
    config.heartbeat_interval = Duration::from_secs(u64::MAX / 2 + 1);
    config.heartbeat_timeout = Duration::MAX;
    config.read_timeout = Duration::MAX;

    match config.validate() {
        Err(ConfigError::Invalid(msg)) => assert!(msg.contains("out of range"), "{}", msg),
        other => panic!("expected invalid config, got {:?}", other),
    }
}

#[test]
fn backoff_follows_config() {
    let mut config = BridgeConfig::default();
    config.initial_reconnect_delay = Duration::from_secs(1);
    config.max_reconnect_delay = Duration::from_secs(8);
    let backoff = config.backoff();
    assert_eq!(backoff.delay(4), Duration::from_secs(8));
    assert_eq!(backoff.delay(6), Duration::from_secs(8));
}

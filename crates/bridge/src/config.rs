// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bridge configuration.
//!
//! Values come from defaults, optionally a TOML file (durations in
//! milliseconds), then `VOICE_BRIDGE_*` environment variables, in that order
//! of increasing precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;
use crate::env::{self, vars};

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Runtime configuration of a [`VoiceBridge`](crate::VoiceBridge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Orchestrator endpoint (`ws://` or `wss://`).
    pub url: String,
    /// Stamped into the metadata of every outbound frame.
    pub session_id: String,
    pub initial_reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    /// Reconnection attempts before giving up. 0 means unbounded.
    pub max_reconnects: u32,
    pub heartbeat_interval: Duration,
    /// Silence after which the link is considered dead. Must exceed the interval.
    pub heartbeat_timeout: Duration,
    pub write_timeout: Duration,
    pub read_timeout: Duration,
    pub handshake_timeout: Duration,
    /// Capacity of the queue used while reconnecting.
    pub max_pending_messages: usize,
    /// Capacity of the dedicated interrupt channel.
    pub interrupt_capacity: usize,
    /// Start a background connect when `send` finds the bridge disconnected.
    pub connect_on_send: bool,
}

/// On-disk form of [`BridgeConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default = "default_initial_reconnect_delay_ms")]
    pub initial_reconnect_delay_ms: u64,
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: u32,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    #[serde(default = "default_max_pending_messages")]
    pub max_pending_messages: usize,
    #[serde(default = "default_interrupt_capacity")]
    pub interrupt_capacity: usize,
    #[serde(default)]
    pub connect_on_send: bool,
}

fn default_url() -> String {
    "ws://localhost:8765".to_string()
}

fn default_session_id() -> String {
    "default".to_string()
}

fn default_initial_reconnect_delay_ms() -> u64 {
    1_000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}

fn default_max_reconnects() -> u32 {
    10
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    60_000
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

fn default_read_timeout_ms() -> u64 {
    120_000
}

fn default_handshake_timeout_ms() -> u64 {
    10_000
}

fn default_max_pending_messages() -> usize {
    50
}

fn default_interrupt_capacity() -> usize {
    10
}

impl Default for ConfigFile {
    fn default() -> Self {
        ConfigFile {
            url: default_url(),
            session_id: default_session_id(),
            initial_reconnect_delay_ms: default_initial_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            max_reconnects: default_max_reconnects(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            max_pending_messages: default_max_pending_messages(),
            interrupt_capacity: default_interrupt_capacity(),
            connect_on_send: false,
        }
    }
}

impl From<ConfigFile> for BridgeConfig {
    fn from(file: ConfigFile) -> Self {
        BridgeConfig {
            url: file.url,
            session_id: file.session_id,
            initial_reconnect_delay: Duration::from_millis(file.initial_reconnect_delay_ms),
            max_reconnect_delay: Duration::from_millis(file.max_reconnect_delay_ms),
            max_reconnects: file.max_reconnects,
            heartbeat_interval: Duration::from_millis(file.heartbeat_interval_ms),
            heartbeat_timeout: Duration::from_millis(file.heartbeat_timeout_ms),
            write_timeout: Duration::from_millis(file.write_timeout_ms),
            read_timeout: Duration::from_millis(file.read_timeout_ms),
            handshake_timeout: Duration::from_millis(file.handshake_timeout_ms),
            max_pending_messages: file.max_pending_messages,
            interrupt_capacity: file.interrupt_capacity,
            connect_on_send: file.connect_on_send,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        ConfigFile::default().into()
    }
}

impl BridgeConfig {
    /// Default configuration pointed at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        BridgeConfig {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Loads a TOML config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.into())
    }

    /// Defaults, then the file named by `VOICE_BRIDGE_CONFIG` if any, then
    /// the environment, validated.
    pub fn from_env() -> Result<Self> {
        let base = match env::config_path() {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        let config = base.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from `VOICE_BRIDGE_*` variables.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_with(env::lookup)
    }

    /// Overrides fields using `lookup` to read variables.
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(vars::VOICE_BRIDGE_URL) {
            self.url = url;
        }
        if let Some(session_id) = get(vars::VOICE_BRIDGE_SESSION_ID) {
            self.session_id = session_id;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_INITIAL_RECONNECT_DELAY_MS) {
            self.initial_reconnect_delay =
                parse_millis(vars::VOICE_BRIDGE_INITIAL_RECONNECT_DELAY_MS, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_MAX_RECONNECT_DELAY_MS) {
            self.max_reconnect_delay = parse_millis(vars::VOICE_BRIDGE_MAX_RECONNECT_DELAY_MS, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_MAX_RECONNECTS) {
            self.max_reconnects = parse_num(vars::VOICE_BRIDGE_MAX_RECONNECTS, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_HEARTBEAT_INTERVAL_MS) {
            self.heartbeat_interval = parse_millis(vars::VOICE_BRIDGE_HEARTBEAT_INTERVAL_MS, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_HEARTBEAT_TIMEOUT_MS) {
            self.heartbeat_timeout = parse_millis(vars::VOICE_BRIDGE_HEARTBEAT_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_WRITE_TIMEOUT_MS) {
            self.write_timeout = parse_millis(vars::VOICE_BRIDGE_WRITE_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_READ_TIMEOUT_MS) {
            self.read_timeout = parse_millis(vars::VOICE_BRIDGE_READ_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_HANDSHAKE_TIMEOUT_MS) {
            self.handshake_timeout = parse_millis(vars::VOICE_BRIDGE_HANDSHAKE_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_MAX_PENDING) {
            self.max_pending_messages = parse_num(vars::VOICE_BRIDGE_MAX_PENDING, &v)?;
        }
        if let Some(v) = get(vars::VOICE_BRIDGE_CONNECT_ON_SEND) {
            self.connect_on_send = parse_flag(vars::VOICE_BRIDGE_CONNECT_ON_SEND, &v)?;
        }
        Ok(self)
    }

    /// Checks values and the relations between them.
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(invalid(format!(
                "url '{}' must start with ws:// or wss://",
                self.url
            )));
        }
        if self.initial_reconnect_delay.is_zero() {
            return Err(invalid("initial reconnect delay must be positive"));
        }
        if self.max_reconnect_delay < self.initial_reconnect_delay {
            return Err(invalid(
                "max reconnect delay must not be below the initial delay",
            ));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(invalid("heartbeat interval must be positive"));
        }
        if self.heartbeat_timeout <= self.heartbeat_interval {
            return Err(invalid(format!(
                "heartbeat timeout ({:?}) must exceed the heartbeat interval ({:?})",
                self.heartbeat_timeout, self.heartbeat_interval
            )));
        }
        let Some(probe_window) = self.heartbeat_interval.checked_add(self.heartbeat_timeout) else {
            return Err(invalid("heartbeat interval plus timeout is out of range"));
        };
        if self.read_timeout <= probe_window {
            return Err(invalid(format!(
                "read timeout ({:?}) must exceed heartbeat interval plus timeout ({:?})",
                self.read_timeout, probe_window
            )));
        }
        if self.write_timeout.is_zero() || self.handshake_timeout.is_zero() {
            return Err(invalid("write and handshake timeouts must be positive"));
        }
        if self.max_pending_messages == 0 {
            return Err(invalid("pending queue capacity must be at least 1"));
        }
        if self.interrupt_capacity == 0 {
            return Err(invalid("interrupt channel capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_reconnect_delay, self.max_reconnect_delay)
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn parse_num<N: std::str::FromStr>(var: &'static str, value: &str) -> Result<N> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        })
}

fn parse_millis(var: &'static str, value: &str) -> Result<Duration> {
    parse_num::<u64>(var, value).map(Duration::from_millis)
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

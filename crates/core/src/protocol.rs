// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSON frames exchanged with the voice orchestrator.
//!
//! Every frame is a JSON object with a required `type` discriminant. The
//! orchestrator is loose about where it puts optional fields: some arrive
//! top-level, some nested in `metadata`. [`Envelope`] mirrors the raw shape,
//! and the typed [`InboundMessage`] / [`OutboundMessage`] enums are built from
//! it with the top-level value winning over the `metadata` fallback.
//!
//! Unknown `type` values decode to [`InboundMessage::Unknown`] rather than
//! failing, so newer orchestrators can add message kinds freely.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};
use crate::interrupt::{from_unix_seconds, to_unix_seconds, InterruptKind, InterruptSignal};

/// Free-form key/value map carried by `metadata`, `details` and config frames.
pub type Metadata = Map<String, Value>;

/// Wire names of every known message type.
pub mod kinds {
    pub const TRANSCRIPT: &str = "transcript";
    pub const INTERRUPT: &str = "interrupt";
    pub const STATUS: &str = "status";
    pub const SYNTHESIZING: &str = "synthesizing";
    pub const COMPLETE: &str = "complete";
    pub const VAD_START: &str = "vad_start";
    pub const VAD_END: &str = "vad_end";
    pub const AUDIO_OUT: &str = "audio_out";
    pub const ERROR: &str = "error";
    pub const WAKE_WORD: &str = "wake_word";

    pub const SYNTHESIZE: &str = "synthesize";
    pub const CANCEL: &str = "cancel";
    pub const PLAY_AUDIO: &str = "play_audio";
    pub const CONFIG: &str = "config";
    pub const CLOSE_STREAM: &str = "close_stream";

    /// Whether `kind` is a type the orchestrator is known to send.
    pub fn is_inbound(kind: &str) -> bool {
        matches!(
            kind,
            TRANSCRIPT
                | INTERRUPT
                | STATUS
                | SYNTHESIZING
                | COMPLETE
                | VAD_START
                | VAD_END
                | AUDIO_OUT
                | ERROR
                | WAKE_WORD
        )
    }
}

/// Raw frame shape shared by both directions.
///
/// Optional fields are read leniently: a value of the wrong JSON shape is
/// dropped instead of failing the whole frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub is_final: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub interrupt_type: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub details: Option<Metadata>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Some orchestrator builds send numeric codes.
    #[serde(default, deserialize_with = "lenient_code", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Base64 audio for `audio_out` and `play_audio`.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub vad_threshold: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model_size: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub wake_word: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    /// Unix time in float seconds.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Envelope {
    /// Creates an envelope carrying only its discriminant.
    pub fn new(kind: impl Into<String>) -> Self {
        Envelope {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes an envelope from JSON. Fails when `type` is missing.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    fn meta_str(&self, key: &str) -> Option<String> {
        self.meta(key).and_then(Value::as_str).map(str::to_string)
    }

    fn meta_f64(&self, key: &str) -> Option<f64> {
        self.meta(key).and_then(Value::as_f64)
    }
}

/// Speech-to-text result.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub is_final: bool,
    pub confidence: f64,
    pub language: Option<String>,
}

/// Interrupt raised by the orchestrator (for example on barge-in).
#[derive(Debug, Clone, PartialEq)]
pub struct InterruptNotice {
    pub reason: String,
    pub interrupt_type: String,
}

/// Pipeline state report (idle, listening, processing, speaking).
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub state: String,
    pub details: Metadata,
}

/// Text-to-speech synthesis has started.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesizing {
    pub text: String,
    pub voice_id: Option<String>,
    pub provider: Option<String>,
}

impl Synthesizing {
    /// The first 50 characters of the text, for logging.
    pub fn preview(&self) -> String {
        const LIMIT: usize = 50;
        if self.text.chars().count() <= LIMIT {
            return self.text.clone();
        }
        let head: String = self.text.chars().take(LIMIT).collect();
        format!("{}...", head)
    }
}

/// Text-to-speech synthesis has finished.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub duration_ms: u64,
    pub provider: Option<String>,
    pub voice_id: Option<String>,
}

impl Completion {
    pub fn duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.duration_ms)
    }
}

/// A chunk of synthesized audio, kept as the opaque base64 string it arrived as.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub data: String,
}

impl AudioChunk {
    /// Decodes the base64 payload.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.data)
            .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))
    }
}

/// Error reported by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorError {
    pub message: String,
    pub code: Option<String>,
    pub details: Metadata,
}

/// Wake word detected before full transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct WakeWord {
    pub word: String,
    pub confidence: f64,
    /// Audio captured before the detection, base64 encoded.
    pub audio_base64: Option<String>,
}

/// Messages received from the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Transcript(Transcript),
    Interrupt(InterruptNotice),
    Status(StatusUpdate),
    Synthesizing(Synthesizing),
    Complete(Completion),
    VadStart,
    VadEnd,
    AudioOut(AudioChunk),
    Error(OrchestratorError),
    WakeWord(WakeWord),
    /// A type this client does not know. Carries the raw `type` value.
    Unknown(String),
}

impl InboundMessage {
    /// Parses a raw frame. Only malformed JSON or a missing `type` fail.
    ///
    /// The `type` is read on its own first, so the payload of an unknown
    /// type is never interpreted.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let Tag { kind } = Tag::deserialize(&value)?;
        if !kinds::is_inbound(&kind) {
            return Ok(InboundMessage::Unknown(kind));
        }
        Ok(Self::from_envelope(Envelope::deserialize(value)?))
    }

    /// Builds the typed message, applying the `metadata` fallbacks.
    pub fn from_envelope(env: Envelope) -> Self {
        match env.kind.as_str() {
            kinds::TRANSCRIPT => InboundMessage::Transcript(Transcript {
                confidence: env
                    .confidence
                    .or_else(|| env.meta_f64("confidence"))
                    .unwrap_or(0.0),
                language: env.language.clone().or_else(|| env.meta_str("language")),
                is_final: env.is_final.unwrap_or(false),
                text: env.text.unwrap_or_default(),
            }),
            kinds::INTERRUPT => InboundMessage::Interrupt(InterruptNotice {
                interrupt_type: env
                    .interrupt_type
                    .clone()
                    .or_else(|| env.meta_str("interrupt_type"))
                    .unwrap_or_else(|| "unknown".to_string()),
                reason: env.reason.unwrap_or_default(),
            }),
            kinds::STATUS => {
                let state = env
                    .status
                    .clone()
                    .filter(|s| !s.is_empty())
                    .or_else(|| env.meta_str("state"))
                    .unwrap_or_default();
                InboundMessage::Status(StatusUpdate {
                    state,
                    details: env.details.or(env.metadata).unwrap_or_default(),
                })
            }
            kinds::SYNTHESIZING => InboundMessage::Synthesizing(Synthesizing {
                voice_id: env.voice_id.clone().or_else(|| env.meta_str("voice_id")),
                provider: env.provider.clone().or_else(|| env.meta_str("provider")),
                text: env.text.unwrap_or_default(),
            }),
            kinds::COMPLETE => {
                let duration_ms = env
                    .duration_ms
                    .or_else(|| env.meta_f64("duration_ms"))
                    .unwrap_or(0.0);
                InboundMessage::Complete(Completion {
                    duration_ms: duration_ms.max(0.0).round() as u64,
                    provider: env.provider.clone().or_else(|| env.meta_str("provider")),
                    voice_id: env.voice_id.clone().or_else(|| env.meta_str("voice_id")),
                })
            }
            kinds::VAD_START => InboundMessage::VadStart,
            kinds::VAD_END => InboundMessage::VadEnd,
            kinds::AUDIO_OUT => InboundMessage::AudioOut(AudioChunk {
                data: env.data.unwrap_or_default(),
            }),
            kinds::ERROR => {
                let message = env
                    .error
                    .clone()
                    .filter(|e| !e.is_empty())
                    .or_else(|| env.reason.clone())
                    .unwrap_or_default();
                InboundMessage::Error(OrchestratorError {
                    message,
                    code: env.code,
                    details: env.details.unwrap_or_default(),
                })
            }
            kinds::WAKE_WORD => InboundMessage::WakeWord(WakeWord {
                word: env
                    .wake_word
                    .clone()
                    .or_else(|| env.meta_str("wake_word"))
                    .unwrap_or_default(),
                confidence: env
                    .confidence
                    .or_else(|| env.meta_f64("confidence"))
                    .unwrap_or(0.0),
                audio_base64: env
                    .audio_base64
                    .clone()
                    .or_else(|| env.meta_str("audio_base64")),
            }),
            _ => InboundMessage::Unknown(env.kind),
        }
    }

    /// The wire `type` of this message.
    pub fn kind(&self) -> &str {
        match self {
            InboundMessage::Transcript(_) => kinds::TRANSCRIPT,
            InboundMessage::Interrupt(_) => kinds::INTERRUPT,
            InboundMessage::Status(_) => kinds::STATUS,
            InboundMessage::Synthesizing(_) => kinds::SYNTHESIZING,
            InboundMessage::Complete(_) => kinds::COMPLETE,
            InboundMessage::VadStart => kinds::VAD_START,
            InboundMessage::VadEnd => kinds::VAD_END,
            InboundMessage::AudioOut(_) => kinds::AUDIO_OUT,
            InboundMessage::Error(_) => kinds::ERROR,
            InboundMessage::WakeWord(_) => kinds::WAKE_WORD,
            InboundMessage::Unknown(kind) => kind,
        }
    }

    /// Builds the canonical envelope, with every field top-level.
    pub fn to_envelope(&self) -> Envelope {
        let mut env = Envelope::new(self.kind());
        match self {
            InboundMessage::Transcript(t) => {
                env.text = Some(t.text.clone());
                env.is_final = Some(t.is_final);
                env.confidence = Some(t.confidence);
                env.language = t.language.clone();
            }
            InboundMessage::Interrupt(i) => {
                env.reason = Some(i.reason.clone());
                env.interrupt_type = Some(i.interrupt_type.clone());
            }
            InboundMessage::Status(s) => {
                env.status = Some(s.state.clone());
                env.details = non_empty(&s.details);
            }
            InboundMessage::Synthesizing(s) => {
                env.text = Some(s.text.clone());
                env.voice_id = s.voice_id.clone();
                env.provider = s.provider.clone();
            }
            InboundMessage::Complete(c) => {
                env.duration_ms = Some(c.duration_ms as f64);
                env.provider = c.provider.clone();
                env.voice_id = c.voice_id.clone();
            }
            InboundMessage::AudioOut(a) => {
                env.data = Some(a.data.clone());
            }
            InboundMessage::Error(e) => {
                env.error = Some(e.message.clone());
                env.code = e.code.clone();
                env.details = non_empty(&e.details);
            }
            InboundMessage::WakeWord(w) => {
                env.wake_word = Some(w.word.clone());
                env.confidence = Some(w.confidence);
                env.audio_base64 = w.audio_base64.clone();
            }
            InboundMessage::VadStart | InboundMessage::VadEnd | InboundMessage::Unknown(_) => {}
        }
        env
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String> {
        self.to_envelope().to_json()
    }
}

/// Messages sent to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Speak the given text.
    Synthesize { text: String },
    /// Stop current playback.
    Cancel,
    /// Play pre-rendered audio bytes.
    PlayAudio { audio: Vec<u8>, format: String },
    /// Pipeline settings.
    Config(Metadata),
    /// Interrupt echoed upstream.
    Interrupt(InterruptSignal),
    /// Shutdown notice sent before closing the stream.
    CloseStream,
}

impl OutboundMessage {
    /// Creates a Synthesize message.
    pub fn synthesize(text: impl Into<String>) -> Self {
        OutboundMessage::Synthesize { text: text.into() }
    }

    /// Creates a PlayAudio message.
    pub fn play_audio(audio: impl Into<Vec<u8>>, format: impl Into<String>) -> Self {
        OutboundMessage::PlayAudio {
            audio: audio.into(),
            format: format.into(),
        }
    }

    /// The wire `type` of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Synthesize { .. } => kinds::SYNTHESIZE,
            OutboundMessage::Cancel => kinds::CANCEL,
            OutboundMessage::PlayAudio { .. } => kinds::PLAY_AUDIO,
            OutboundMessage::Config(_) => kinds::CONFIG,
            OutboundMessage::Interrupt(_) => kinds::INTERRUPT,
            OutboundMessage::CloseStream => kinds::CLOSE_STREAM,
        }
    }

    /// Builds the envelope for this message.
    ///
    /// `now` stamps every message except interrupts, which carry their own time.
    pub fn to_envelope(&self, session_id: &str, now: DateTime<Utc>) -> Envelope {
        let mut env = Envelope::new(self.kind());
        env.timestamp = Some(to_unix_seconds(now));
        let mut metadata = Metadata::new();
        metadata.insert("session_id".to_string(), Value::from(session_id));

        match self {
            OutboundMessage::Synthesize { text } => {
                env.text = Some(text.clone());
            }
            OutboundMessage::Cancel | OutboundMessage::CloseStream => {}
            OutboundMessage::PlayAudio { audio, format } => {
                env.data = Some(BASE64.encode(audio));
                metadata.insert("format".to_string(), Value::from(format.as_str()));
            }
            OutboundMessage::Config(settings) => {
                // voice, vad_threshold, model_size and language are also read top-level
                env.voice = str_setting(settings, "voice");
                env.vad_threshold = settings.get("vad_threshold").and_then(Value::as_f64);
                env.model_size = str_setting(settings, "model_size");
                env.language = str_setting(settings, "language");
                env.metadata = Some(settings.clone());
                return env;
            }
            OutboundMessage::Interrupt(signal) => {
                env.reason = Some(signal.reason.clone());
                env.interrupt_type = Some(signal.kind.to_string());
                env.timestamp = Some(to_unix_seconds(signal.timestamp));
                for (key, value) in &signal.metadata {
                    metadata.insert(key.clone(), value.clone());
                }
                metadata.insert(
                    "interrupt_type".to_string(),
                    Value::from(signal.kind.as_str()),
                );
            }
        }

        env.metadata = Some(metadata);
        env
    }

    /// Serializes the message to a JSON frame stamped with the current time.
    pub fn encode(&self, session_id: &str) -> Result<String> {
        self.to_envelope(session_id, Utc::now()).to_json()
    }

    /// Rebuilds an outbound message from its envelope.
    pub fn from_envelope(env: Envelope) -> Result<Self> {
        match env.kind.as_str() {
            kinds::SYNTHESIZE => {
                let text = env.text.ok_or_else(|| missing(kinds::SYNTHESIZE, "text"))?;
                Ok(OutboundMessage::Synthesize { text })
            }
            kinds::CANCEL => Ok(OutboundMessage::Cancel),
            kinds::CLOSE_STREAM => Ok(OutboundMessage::CloseStream),
            kinds::PLAY_AUDIO => {
                let format = env.meta_str("format").unwrap_or_default();
                let data = env.data.ok_or_else(|| missing(kinds::PLAY_AUDIO, "data"))?;
                let audio = BASE64
                    .decode(data)
                    .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))?;
                Ok(OutboundMessage::PlayAudio { audio, format })
            }
            kinds::CONFIG => Ok(OutboundMessage::Config(env.metadata.unwrap_or_default())),
            kinds::INTERRUPT => {
                let kind_label = env
                    .interrupt_type
                    .clone()
                    .or_else(|| env.meta_str("interrupt_type"))
                    .unwrap_or_else(|| "unknown".to_string());
                let timestamp = env
                    .timestamp
                    .and_then(from_unix_seconds)
                    .ok_or_else(|| missing(kinds::INTERRUPT, "timestamp"))?;
                let mut metadata = env.metadata.unwrap_or_default();
                metadata.remove("session_id");
                metadata.remove("interrupt_type");
                Ok(OutboundMessage::Interrupt(InterruptSignal {
                    kind: InterruptKind::from_label(&kind_label),
                    reason: env.reason.unwrap_or_default(),
                    timestamp,
                    metadata,
                }))
            }
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }

    /// Parses an outbound frame.
    pub fn decode(raw: &str) -> Result<Self> {
        Self::from_envelope(Envelope::from_json(raw)?)
    }
}

#[derive(Deserialize)]
struct Tag {
    #[serde(rename = "type")]
    kind: String,
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_code<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(code) => Some(code),
        Value::Number(code) => Some(code.to_string()),
        _ => None,
    })
}

fn str_setting(settings: &Metadata, key: &str) -> Option<String> {
    settings.get(key).and_then(Value::as_str).map(str::to_string)
}

fn non_empty(map: &Metadata) -> Option<Metadata> {
    (!map.is_empty()).then(|| map.clone())
}

fn missing(kind: &str, field: &'static str) -> ProtocolError {
    ProtocolError::MissingField {
        kind: kind.to_string(),
        field,
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

fn details(value: Value) -> Metadata {
    value.as_object().cloned().unwrap()
}

fn fixed_time() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_250).unwrap()
}

// Every known inbound variant survives serialize -> parse unchanged.
#[parameterized(
    transcript = { InboundMessage::Transcript(Transcript { text: "hello there".into(), is_final: true, confidence: 0.92, language: Some("en".into()) }) },
    transcript_interim = { InboundMessage::Transcript(Transcript { text: "hel".into(), is_final: false, confidence: 0.0, language: None }) },
    interrupt = { InboundMessage::Interrupt(InterruptNotice { reason: "user spoke".into(), interrupt_type: "barge_in".into() }) },
    status = { InboundMessage::Status(StatusUpdate { state: "listening".into(), details: details(json!({"mic": "on", "level": 3})) }) },
    synthesizing = { InboundMessage::Synthesizing(Synthesizing { text: "Sure, one moment".into(), voice_id: Some("af_sky".into()), provider: Some("kokoro".into()) }) },
    complete = { InboundMessage::Complete(Completion { duration_ms: 1840, provider: Some("kokoro".into()), voice_id: None }) },
    vad_start = { InboundMessage::VadStart },
    vad_end = { InboundMessage::VadEnd },
    audio_out = { InboundMessage::AudioOut(AudioChunk { data: "AAEC".into() }) },
    error = { InboundMessage::Error(OrchestratorError { message: "stt backend down".into(), code: Some("E_STT".into()), details: details(json!({"component": "stt", "recoverable": true})) }) },
    wake_word = { InboundMessage::WakeWord(WakeWord { word: "hey_cortex".into(), confidence: 0.81, audio_base64: Some("UklGRg==".into()) }) },
    wake_word_no_audio = { InboundMessage::WakeWord(WakeWord { word: "hey_cortex".into(), confidence: 0.5, audio_base64: None }) },
)]
fn inbound_roundtrip(msg: InboundMessage) {
    let json = msg.to_json().unwrap();
    let parsed = InboundMessage::parse(&json).unwrap();
    assert_eq!(msg, parsed);
}

// Every known outbound variant survives encode -> decode unchanged.
#[parameterized(
    synthesize = { OutboundMessage::synthesize("Good morning") },
    cancel = { OutboundMessage::Cancel },
    play_audio = { OutboundMessage::play_audio(vec![0u8, 1, 2, 254, 255], "wav") },
    config = { OutboundMessage::Config(details(json!({"voice": "af_sky", "vad_threshold": 0.4, "mode": "listening"}))) },
    interrupt = { OutboundMessage::Interrupt(InterruptSignal::new(InterruptKind::BargeIn, "user spoke").with_timestamp(fixed_time()).with_metadata("source", "vad")) },
    interrupt_other_kind = { OutboundMessage::Interrupt(InterruptSignal::new(InterruptKind::Other("custom".into()), "").with_timestamp(fixed_time())) },
    close_stream = { OutboundMessage::CloseStream },
)]
fn outbound_roundtrip(msg: OutboundMessage) {
    let json = msg.encode("session-1").unwrap();
    let parsed = OutboundMessage::decode(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[test]
fn unknown_type_is_not_an_error() {
    let msg = InboundMessage::parse(r#"{"type":"emotion","primary":"happy"}"#).unwrap();
    assert_eq!(msg, InboundMessage::Unknown("emotion".to_string()));
    assert_eq!(msg.kind(), "emotion");
}

#[parameterized(
    object_data = { r#"{"type":"progress","data":{"pct":50}}"# },
    iso_timestamp = { r#"{"type":"progress","timestamp":"2026-10-18T00:00:00Z"}"# },
    list_metadata = { r#"{"type":"progress","metadata":["a","b"]}"# },
    string_confidence = { r#"{"type":"progress","confidence":"high"}"# },
)]
fn unknown_type_payload_is_not_interpreted(raw: &str) {
    let msg = InboundMessage::parse(raw).unwrap();
    assert_eq!(msg, InboundMessage::Unknown("progress".to_string()));
}

#[test]
fn numeric_error_code_is_kept_as_text() {
    let raw = r#"{"type":"error","error":"tts down","code":503}"#;
    let InboundMessage::Error(e) = InboundMessage::parse(raw).unwrap() else {
        unreachable!("expected error");
    };
    assert_eq!(e.message, "tts down");
    assert_eq!(e.code.as_deref(), Some("503"));
}

#[test]
fn mistyped_optional_field_is_dropped() {
    let raw = r#"{"type":"transcript","text":"hi","confidence":"high","is_final":"yes"}"#;
    let InboundMessage::Transcript(t) = InboundMessage::parse(raw).unwrap() else {
        unreachable!("expected transcript");
    };
    assert_eq!(t.text, "hi");
    assert_eq!(t.confidence, 0.0);
    assert!(!t.is_final);
}

#[test]
fn missing_type_is_an_error() {
    let err = InboundMessage::parse(r#"{"text":"hello"}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::Json(_)));
}

#[test]
fn malformed_json_is_an_error() {
    assert!(InboundMessage::parse("not json").is_err());
}

#[test]
fn transcript_reads_metadata_fallbacks() {
    let raw = r#"{"type":"transcript","text":"hi","is_final":true,"metadata":{"confidence":0.7,"language":"de"}}"#;
    let msg = InboundMessage::parse(raw).unwrap();
    assert_eq!(
        msg,
        InboundMessage::Transcript(Transcript {
            text: "hi".into(),
            is_final: true,
            confidence: 0.7,
            language: Some("de".into()),
        })
    );
}

#[test]
fn top_level_field_wins_over_metadata() {
    let raw = r#"{"type":"transcript","text":"hi","confidence":0.9,"metadata":{"confidence":0.1}}"#;
    let InboundMessage::Transcript(t) = InboundMessage::parse(raw).unwrap() else {
        unreachable!("expected transcript");
    };
    assert_eq!(t.confidence, 0.9);
    assert!(!t.is_final);
}

#[test]
fn interrupt_type_defaults_to_unknown() {
    let msg = InboundMessage::parse(r#"{"type":"interrupt","reason":"noise"}"#).unwrap();
    assert_eq!(
        msg,
        InboundMessage::Interrupt(InterruptNotice {
            reason: "noise".into(),
            interrupt_type: "unknown".into(),
        })
    );
}

#[test]
fn status_falls_back_to_metadata_state_and_details() {
    let raw = r#"{"type":"status","metadata":{"state":"speaking","queue":2}}"#;
    let InboundMessage::Status(s) = InboundMessage::parse(raw).unwrap() else {
        unreachable!("expected status");
    };
    assert_eq!(s.state, "speaking");
    assert_eq!(s.details["queue"], 2);
}

#[test]
fn error_falls_back_to_reason() {
    let raw = r#"{"type":"error","reason":"tts timeout","code":"E_TTS"}"#;
    let InboundMessage::Error(e) = InboundMessage::parse(raw).unwrap() else {
        unreachable!("expected error");
    };
    assert_eq!(e.message, "tts timeout");
    assert_eq!(e.code.as_deref(), Some("E_TTS"));
}

#[test]
fn complete_reads_duration_from_metadata() {
    let raw = r#"{"type":"complete","metadata":{"duration_ms":512.4,"provider":"piper","voice_id":"amy"}}"#;
    let InboundMessage::Complete(c) = InboundMessage::parse(raw).unwrap() else {
        unreachable!("expected complete");
    };
    assert_eq!(c.duration_ms, 512);
    assert_eq!(c.duration(), std::time::Duration::from_millis(512));
    assert_eq!(c.provider.as_deref(), Some("piper"));
    assert_eq!(c.voice_id.as_deref(), Some("amy"));
}

#[test]
fn wake_word_reads_metadata_fallbacks() {
    let raw = r#"{"type":"wake_word","metadata":{"wake_word":"hey_henry","confidence":0.66,"audio_base64":"AAA="}}"#;
    let InboundMessage::WakeWord(w) = InboundMessage::parse(raw).unwrap() else {
        unreachable!("expected wake word");
    };
    assert_eq!(w.word, "hey_henry");
    assert_eq!(w.confidence, 0.66);
    assert_eq!(w.audio_base64.as_deref(), Some("AAA="));
}

#[test]
fn audio_chunk_decodes_payload() {
    let chunk = AudioChunk {
        data: "AAEC".to_string(),
    };
    assert_eq!(chunk.decode().unwrap(), vec![0, 1, 2]);

    let bad = AudioChunk {
        data: "***".to_string(),
    };
    assert!(matches!(bad.decode(), Err(ProtocolError::InvalidPayload(_))));
}

#[test]
fn synthesizing_preview_truncates_long_text() {
    let short = Synthesizing {
        text: "short".into(),
        voice_id: None,
        provider: None,
    };
    assert_eq!(short.preview(), "short");

    let long = Synthesizing {
        text: "x".repeat(80),
        voice_id: None,
        provider: None,
    };
    assert_eq!(long.preview(), format!("{}...", "x".repeat(50)));
}

#[test]
fn outbound_json_format() {
    let env = OutboundMessage::synthesize("hi").to_envelope("s1", fixed_time());
    let json = env.to_json().unwrap();
    assert!(json.contains("\"type\":\"synthesize\""));
    assert!(json.contains("\"text\":\"hi\""));
    assert!(json.contains("\"session_id\":\"s1\""));
    assert_eq!(env.timestamp, Some(1_700_000_000.25));

    let json = OutboundMessage::play_audio(vec![1, 2, 3], "mp3")
        .encode("s1")
        .unwrap();
    assert!(json.contains("\"data\":\"AQID\""));
    assert!(json.contains("\"format\":\"mp3\""));
}

#[test]
fn config_lifts_known_keys() {
    let settings = details(json!({"voice": "am_adam", "vad_threshold": 0.3, "model_size": "base", "language": "en", "mode": "idle"}));
    let env = OutboundMessage::Config(settings.clone()).to_envelope("s1", fixed_time());
    assert_eq!(env.voice.as_deref(), Some("am_adam"));
    assert_eq!(env.vad_threshold, Some(0.3));
    assert_eq!(env.model_size.as_deref(), Some("base"));
    assert_eq!(env.language.as_deref(), Some("en"));
    assert_eq!(env.metadata, Some(settings));
}

#[test]
fn interrupt_envelope_carries_kind_and_session() {
    let signal = InterruptSignal::new(InterruptKind::WakeWord, "hey")
        .with_timestamp(fixed_time())
        .with_metadata("score", 0.9);
    let env = OutboundMessage::Interrupt(signal).to_envelope("s9", Utc::now());
    assert_eq!(env.kind, "interrupt");
    assert_eq!(env.interrupt_type.as_deref(), Some("wake_word"));
    assert_eq!(env.timestamp, Some(1_700_000_000.25));
    let metadata = env.metadata.unwrap();
    assert_eq!(metadata["session_id"], "s9");
    assert_eq!(metadata["interrupt_type"], "wake_word");
    assert_eq!(metadata["score"], 0.9);
}

#[parameterized(
    unknown = { r#"{"type":"transcript"}"#, "transcript" },
    bogus = { r#"{"type":"bogus"}"#, "bogus" },
)]
fn outbound_decode_rejects_inbound_only_types(raw: &str, kind: &str) {
    match OutboundMessage::decode(raw) {
        Err(ProtocolError::UnknownType(k)) => assert_eq!(k, kind),
        other => unreachable!("unexpected decode result: {:?}", other),
    }
}

#[test]
fn synthesize_requires_text() {
    let err = OutboundMessage::decode(r#"{"type":"synthesize"}"#).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::MissingField { field: "text", .. }
    ));
}

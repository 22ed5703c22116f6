//! Unit tests for Events API envelope parsing.

use grocer_bot::models::envelope::{CallbackEvent, EventEnvelope};
use grocer_bot::AppError;

#[test]
fn url_verification_carries_challenge() {
    let body = br#"{"token":"x","challenge":"3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P","type":"url_verification"}"#;
    let envelope = EventEnvelope::parse(body).expect("parses");
    assert_eq!(
        envelope,
        EventEnvelope::UrlVerification {
            challenge: "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P".into()
        }
    );
}

#[test]
fn event_callback_extracts_mention_fields() {
    let body = br#"{
        "token": "x",
        "team_id": "T1",
        "type": "event_callback",
        "event_id": "Ev08MFMKH6",
        "event_time": 1700000000,
        "authorizations": [{"user_id": "UBOT"}],
        "event": {
            "type": "app_mention",
            "user": "U061F7AUR",
            "text": "<@U0LAN0Z89> milk, bread",
            "ts": "1515449522.000016",
            "channel": "C0LAN2Q65",
            "event_ts": "1515449522000016",
            "blocks": []
        }
    }"#;

    let EventEnvelope::EventCallback { event_id, event } =
        EventEnvelope::parse(body).expect("parses")
    else {
        panic!("expected event_callback");
    };
    assert_eq!(event_id, "Ev08MFMKH6");
    assert!(event.is_mention());
    assert_eq!(event.user.as_deref(), Some("U061F7AUR"));
    assert_eq!(event.channel.as_deref(), Some("C0LAN2Q65"));
    assert_eq!(event.text.as_deref(), Some("<@U0LAN0Z89> milk, bread"));
    assert_eq!(event.reply_thread(), Some("1515449522.000016"));
}

#[test]
fn reply_thread_prefers_parent_thread() {
    let event = CallbackEvent {
        kind: "app_mention".into(),
        ts: Some("1700000001.000200".into()),
        thread_ts: Some("1700000000.000100".into()),
        ..CallbackEvent::default()
    };
    assert_eq!(event.reply_thread(), Some("1700000000.000100"));
}

#[test]
fn non_mention_event_is_not_a_mention() {
    let body = br#"{"type":"event_callback","event_id":"Ev1","event":{"type":"message","text":"hello"}}"#;
    let EventEnvelope::EventCallback { event, .. } = EventEnvelope::parse(body).expect("parses")
    else {
        panic!("expected event_callback");
    };
    assert!(!event.is_mention());
}

#[test]
fn unknown_envelope_type_is_unsupported() {
    let body = br#"{"type":"app_rate_limited","minute_rate_limited":1518467820}"#;
    assert_eq!(
        EventEnvelope::parse(body).expect("parses"),
        EventEnvelope::Unsupported
    );
}

#[test]
fn callback_without_event_id_is_payload_error() {
    let body = br#"{"type":"event_callback","event":{"type":"app_mention"}}"#;
    assert!(matches!(
        EventEnvelope::parse(body),
        Err(AppError::Payload(_))
    ));
}

#[test]
fn invalid_json_is_payload_error() {
    assert!(matches!(
        EventEnvelope::parse(b"token=abc&type=url_verification"),
        Err(AppError::Payload(_))
    ));
}

#[test]
fn missing_type_is_payload_error() {
    assert!(matches!(
        EventEnvelope::parse(br#"{"challenge":"abc"}"#),
        Err(AppError::Payload(_))
    ));
}

use marketplace_bookings::domain::webhook::{parse_envelope, parse_event, GatewayEvent};
use marketplace_bookings::service::webhook_processor::{payload_digest, sign_payload, verify_signature};

#[test]
fn signature_round_trip() {
    let body = br#"{"id":"evt_1","type":"hold.succeeded","hold_ref":"pi_1"}"#;
    let signature = sign_payload("secret", body).unwrap();
    assert!(verify_signature("secret", body, &signature));
}

#[test]
fn tampered_body_is_rejected() {
    let body = br#"{"id":"evt_1","type":"hold.succeeded","hold_ref":"pi_1"}"#;
    let signature = sign_payload("secret", body).unwrap();
    let tampered = br#"{"id":"evt_1","type":"hold.succeeded","hold_ref":"pi_2"}"#;
    assert!(!verify_signature("secret", tampered, &signature));
}

#[test]
fn wrong_secret_is_rejected() {
    let body = b"payload";
    let signature = sign_payload("secret", body).unwrap();
    assert!(!verify_signature("other-secret", body, &signature));
}

#[test]
fn garbage_signature_is_rejected() {
    assert!(!verify_signature("secret", b"payload", "not-hex"));
    assert!(!verify_signature("secret", b"payload", ""));
}

#[test]
fn parses_hold_succeeded() {
    let raw = br#"{"id":"evt_42","type":"hold.succeeded","hold_ref":"pi_abc"}"#;
    let envelope = parse_envelope(raw).unwrap();
    assert_eq!(envelope.id, "evt_42");
    assert_eq!(envelope.event_type, "hold.succeeded");

    match parse_event(raw).unwrap() {
        GatewayEvent::HoldSucceeded { id, hold_ref } => {
            assert_eq!(id, "evt_42");
            assert_eq!(hold_ref, "pi_abc");
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn parses_hold_failed_with_failure_details() {
    let raw = br#"{"id":"evt_43","type":"hold.failed","hold_ref":"pi_abc","failure_code":"card_declined","failure_message":"insufficient funds"}"#;
    match parse_event(raw).unwrap() {
        GatewayEvent::HoldFailed {
            failure_code,
            failure_message,
            ..
        } => {
            assert_eq!(failure_code.as_deref(), Some("card_declined"));
            assert_eq!(failure_message.as_deref(), Some("insufficient funds"));
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn parses_requires_action_without_url() {
    let raw = br#"{"id":"evt_44","type":"hold.requires_action","hold_ref":"pi_abc"}"#;
    match parse_event(raw).unwrap() {
        GatewayEvent::HoldRequiresAction { action_url, .. } => assert!(action_url.is_none()),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn unknown_event_type_still_has_an_identity() {
    let raw = br#"{"id":"evt_45","type":"payout.created","account":"acct_1"}"#;
    let envelope = parse_envelope(raw).unwrap();
    assert_eq!(envelope.event_type, "payout.created");
    assert!(matches!(parse_event(raw).unwrap(), GatewayEvent::Unknown));
    assert!(parse_event(raw).unwrap().hold_ref().is_none());
}

#[test]
fn missing_required_field_fails_parse() {
    let raw = br#"{"id":"evt_46","type":"hold.succeeded"}"#;
    assert!(parse_event(raw).is_err());
}

#[test]
fn digest_is_stable_and_content_sensitive() {
    let a = payload_digest(b"one");
    assert_eq!(a, payload_digest(b"one"));
    assert_ne!(a, payload_digest(b"two"));
    assert_eq!(a.len(), 64);
}

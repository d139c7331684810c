use chrono::Utc;
use marketplace_bookings::domain::error::CoreError;
use marketplace_bookings::domain::escrow::{Escrow, EscrowStatus};
use marketplace_bookings::gateway::GatewayError;
use marketplace_bookings::service::settlement_service::{actor_may_settle, counterparty};
use uuid::Uuid;

fn escrow(customer_id: Uuid, provider_id: Uuid) -> Escrow {
    let now = Utc::now();
    Escrow {
        escrow_id: Uuid::new_v4(),
        booking_id: Uuid::new_v4(),
        customer_id,
        provider_id,
        amount_minor: 20_000,
        currency: "USD".to_string(),
        external_ref: Some("pi_test".to_string()),
        status: EscrowStatus::Held,
        held_at: Some(now),
        failed_at: None,
        cancelled_at: None,
        processed_at: None,
        processed_by: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn only_parties_to_the_booking_may_settle() {
    let customer = Uuid::new_v4();
    let provider = Uuid::new_v4();
    let escrow = escrow(customer, provider);

    assert!(actor_may_settle(&escrow, customer));
    assert!(actor_may_settle(&escrow, provider));
    assert!(!actor_may_settle(&escrow, Uuid::new_v4()));
}

#[test]
fn counterparty_is_the_other_side() {
    let customer = Uuid::new_v4();
    let provider = Uuid::new_v4();
    let escrow = escrow(customer, provider);

    assert_eq!(counterparty(&escrow, customer), provider);
    assert_eq!(counterparty(&escrow, provider), customer);
}

#[test]
fn gateway_errors_map_to_the_retryable_code() {
    for err in [
        GatewayError::Timeout,
        GatewayError::Http {
            status: 502,
            body: "bad gateway".to_string(),
        },
        GatewayError::Network("connection reset".to_string()),
    ] {
        let core: CoreError = err.into();
        assert_eq!(core.code(), "EXTERNAL_GATEWAY_ERROR");
    }
}

#[test]
fn error_codes_are_stable() {
    assert_eq!(CoreError::Validation("x".into()).code(), "VALIDATION");
    assert_eq!(CoreError::Conflict("x".into()).code(), "CONFLICT");
    assert_eq!(CoreError::InvalidState("x".into()).code(), "INVALID_STATE");
    assert_eq!(CoreError::NotAuthorized("x".into()).code(), "NOT_AUTHORIZED");
    assert_eq!(CoreError::NotFound("x".into()).code(), "NOT_FOUND");
    assert_eq!(CoreError::SecurityViolation.code(), "SECURITY_VIOLATION");
    let transition = CoreError::InvalidTransition {
        entity: "escrow",
        id: "e1".to_string(),
        from: "HELD".to_string(),
        to: "RELEASED".to_string(),
    };
    assert_eq!(transition.code(), "INVALID_TRANSITION");
}

#[test]
fn internal_errors_never_leak_details() {
    let err = CoreError::Internal(anyhow::anyhow!("connection to 10.0.0.5 refused"));
    let envelope = err.envelope();
    assert_eq!(envelope.error.code, "INTERNAL_ERROR");
    assert_eq!(envelope.error.message, "internal error");
}

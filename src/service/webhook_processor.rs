use crate::domain::booking::BookingStatus;
use crate::domain::error::{CoreError, CoreResult};
use crate::domain::escrow::Escrow;
use crate::domain::webhook::{parse_envelope, parse_event, GatewayEvent};
use crate::repo::bookings_repo::BookingsRepo;
use crate::repo::escrows_repo::EscrowsRepo;
use crate::repo::notifications_outbox_repo::NotificationsOutboxRepo;
use crate::repo::webhook_events_repo::WebhookEventsRepo;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, Transaction};

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over the raw body, hex signature, constant-time comparison.
pub fn verify_signature(secret: &str, raw_body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&signature).is_ok()
}

pub fn sign_payload(secret: &str, raw_body: &[u8]) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid hmac key: {e}"))?;
    mac.update(raw_body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn payload_digest(raw_body: &[u8]) -> String {
    hex::encode(Sha256::digest(raw_body))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WebhookOutcome {
    pub received: bool,
    pub duplicate: bool,
}

#[derive(Clone)]
pub struct WebhookProcessor {
    pub pool: PgPool,
    pub escrows_repo: EscrowsRepo,
    pub webhook_secret: String,
}

impl WebhookProcessor {
    /// Verify, dedup, apply. The event record and every transition it
    /// gates commit in one transaction, so a redelivery either sees the
    /// record (no-op) or nothing happened at all.
    pub async fn process(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> CoreResult<WebhookOutcome> {
        let signature = signature.ok_or(CoreError::SecurityViolation)?;
        if !verify_signature(&self.webhook_secret, raw_body, signature) {
            return Err(CoreError::SecurityViolation);
        }

        let envelope = parse_envelope(raw_body)
            .map_err(|e| CoreError::Validation(format!("malformed event payload: {e}")))?;
        let event = parse_event(raw_body)
            .map_err(|e| CoreError::Validation(format!("malformed event payload: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::Internal(e.into()))?;

        let fresh = WebhookEventsRepo::record_tx(
            &mut tx,
            &envelope.id,
            &envelope.event_type,
            &payload_digest(raw_body),
        )
        .await
        .map_err(CoreError::Internal)?;

        if !fresh {
            tracing::info!(event_id = %envelope.id, "duplicate gateway event, no-op");
            tx.rollback().await.map_err(|e| CoreError::Internal(e.into()))?;
            return Ok(WebhookOutcome {
                received: true,
                duplicate: true,
            });
        }

        self.apply(&mut tx, &envelope.id, &envelope.event_type, &event)
            .await?;

        tx.commit().await.map_err(|e| CoreError::Internal(e.into()))?;
        Ok(WebhookOutcome {
            received: true,
            duplicate: false,
        })
    }

    async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event_id: &str,
        event_type: &str,
        event: &GatewayEvent,
    ) -> CoreResult<()> {
        let Some(hold_ref) = event.hold_ref() else {
            tracing::warn!(event_id, event_type, "unhandled gateway event type, recorded and dropped");
            return Ok(());
        };

        // A hold we never issued signals gateway/internal desync. Surfaced
        // to operators and dropped; retrying cannot repair it.
        let Some(escrow) = self
            .escrows_repo
            .find_by_external_ref(hold_ref)
            .await
            .map_err(CoreError::Internal)?
        else {
            tracing::error!(
                event_id,
                event_type,
                hold_ref,
                reconciliation = true,
                "gateway event references unknown hold, dropping"
            );
            return Ok(());
        };

        match event {
            GatewayEvent::HoldSucceeded { .. } => {
                match EscrowsRepo::mark_held_tx(tx, escrow.escrow_id).await {
                    Ok(held) => {
                        self.confirm_booking(tx, &held).await?;
                        let payload = serde_json::json!({
                            "booking_id": held.booking_id,
                            "escrow_id": held.escrow_id,
                            "amount_minor": held.amount_minor,
                            "currency": held.currency,
                        });
                        NotificationsOutboxRepo::enqueue_tx(
                            tx,
                            held.customer_id,
                            "booking.confirmed",
                            payload.clone(),
                        )
                        .await
                        .map_err(CoreError::Internal)?;
                        NotificationsOutboxRepo::enqueue_tx(
                            tx,
                            held.provider_id,
                            "booking.confirmed",
                            payload,
                        )
                        .await
                        .map_err(CoreError::Internal)?;
                    }
                    Err(e) => return swallow_transition(e, event_id),
                }
            }
            GatewayEvent::HoldFailed {
                failure_code,
                failure_message,
                ..
            } => {
                match EscrowsRepo::mark_failed_tx(tx, escrow.escrow_id).await {
                    Ok(failed) => {
                        self.cancel_booking(tx, &failed).await?;
                        NotificationsOutboxRepo::enqueue_tx(
                            tx,
                            failed.customer_id,
                            "payment.failed",
                            serde_json::json!({
                                "booking_id": failed.booking_id,
                                "escrow_id": failed.escrow_id,
                                "failure_code": failure_code,
                                "failure_message": failure_message,
                            }),
                        )
                        .await
                        .map_err(CoreError::Internal)?;
                    }
                    Err(e) => return swallow_transition(e, event_id),
                }
            }
            GatewayEvent::HoldCancelled { .. } => {
                match EscrowsRepo::mark_cancelled_tx(tx, escrow.escrow_id).await {
                    Ok(cancelled) => {
                        self.cancel_booking(tx, &cancelled).await?;
                        NotificationsOutboxRepo::enqueue_tx(
                            tx,
                            cancelled.customer_id,
                            "payment.cancelled",
                            serde_json::json!({
                                "booking_id": cancelled.booking_id,
                                "escrow_id": cancelled.escrow_id,
                            }),
                        )
                        .await
                        .map_err(CoreError::Internal)?;
                    }
                    Err(e) => return swallow_transition(e, event_id),
                }
            }
            GatewayEvent::HoldRequiresAction { action_url, .. } => {
                // no state transition for this one
                NotificationsOutboxRepo::enqueue_tx(
                    tx,
                    escrow.customer_id,
                    "payment.action_required",
                    serde_json::json!({
                        "booking_id": escrow.booking_id,
                        "escrow_id": escrow.escrow_id,
                        "action_url": action_url,
                    }),
                )
                .await
                .map_err(CoreError::Internal)?;
            }
            // already handled by the hold_ref filter above
            GatewayEvent::Unknown => {}
        }

        Ok(())
    }

    async fn confirm_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        escrow: &Escrow,
    ) -> CoreResult<()> {
        let result = BookingsRepo::transition_tx(
            tx,
            escrow.booking_id,
            BookingStatus::Confirmed,
            BookingStatus::allowed_from(BookingStatus::Confirmed),
        )
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e @ CoreError::InvalidTransition { .. }) => {
                tracing::debug!(booking_id = %escrow.booking_id, "{e}");
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    async fn cancel_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        escrow: &Escrow,
    ) -> CoreResult<()> {
        let result = BookingsRepo::transition_tx(
            tx,
            escrow.booking_id,
            BookingStatus::Cancelled,
            BookingStatus::allowed_from(BookingStatus::Cancelled),
        )
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e @ CoreError::InvalidTransition { .. }) => {
                tracing::debug!(booking_id = %escrow.booking_id, "{e}");
                Ok(())
            }
            Err(other) => Err(other),
        }
    }
}

/// Guard failures under redelivery are the expected outcome, not an error.
fn swallow_transition(err: CoreError, event_id: &str) -> CoreResult<()> {
    match err {
        CoreError::InvalidTransition { .. } => {
            tracing::debug!(event_id, "{err}");
            Ok(())
        }
        other => Err(other),
    }
}

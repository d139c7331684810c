use crate::domain::booking::BookingStatus;
use crate::domain::error::{CoreError, CoreResult};
use crate::domain::escrow::{Escrow, EscrowStatus, SettlementAction};
use crate::gateway::PaymentGatewayClient;
use crate::repo::bookings_repo::BookingsRepo;
use crate::repo::escrows_repo::EscrowsRepo;
use crate::repo::notifications_outbox_repo::NotificationsOutboxRepo;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Pure authorization rule: the booking's customer or provider may settle.
pub fn actor_may_settle(escrow: &Escrow, actor_id: Uuid) -> bool {
    escrow.customer_id == actor_id || escrow.provider_id == actor_id
}

/// The party to notify once the actor has settled.
pub fn counterparty(escrow: &Escrow, actor_id: Uuid) -> Uuid {
    if actor_id == escrow.customer_id {
        escrow.provider_id
    } else {
        escrow.customer_id
    }
}

#[derive(Clone)]
pub struct SettlementService {
    pub pool: PgPool,
    pub escrows_repo: EscrowsRepo,
    pub gateway: Arc<dyn PaymentGatewayClient>,
}

impl SettlementService {
    /// Release = capture the external hold, refund = void it. The gateway
    /// call completes before any local transition; a gateway failure leaves
    /// the escrow HELD and is surfaced as retryable.
    pub async fn settle(
        &self,
        escrow_id: Uuid,
        action: SettlementAction,
        actor_id: Uuid,
    ) -> CoreResult<Escrow> {
        let escrow = self
            .escrows_repo
            .find(escrow_id)
            .await
            .map_err(CoreError::Internal)?
            .ok_or_else(|| CoreError::NotFound("escrow not found".to_string()))?;

        if !actor_may_settle(&escrow, actor_id) {
            return Err(CoreError::NotAuthorized(
                "actor is not a party to this booking".to_string(),
            ));
        }
        if escrow.status != EscrowStatus::Held {
            return Err(CoreError::InvalidState(format!(
                "escrow is {}, settlement requires HELD",
                escrow.status.as_str()
            )));
        }
        let Some(external_ref) = escrow.external_ref.clone() else {
            tracing::error!(
                escrow_id = %escrow.escrow_id,
                reconciliation = true,
                "HELD escrow has no external hold reference"
            );
            return Err(CoreError::InvalidState(
                "escrow has no external hold reference".to_string(),
            ));
        };

        match action {
            SettlementAction::Release => self.gateway.capture(&external_ref).await?,
            SettlementAction::Refund => self.gateway.void(&external_ref).await?,
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::Internal(e.into()))?;

        let settled =
            match EscrowsRepo::mark_settled_tx(&mut tx, escrow.escrow_id, action, actor_id).await {
                Ok(settled) => settled,
                Err(CoreError::InvalidTransition { .. }) => {
                    // The external capture/void already happened but the
                    // escrow moved underneath us. Internal and external
                    // state now only reconcile via the gateway's record.
                    tracing::error!(
                        escrow_id = %escrow.escrow_id,
                        %external_ref,
                        action = ?action,
                        reconciliation = true,
                        "external settlement succeeded but local escrow state had moved"
                    );
                    tx.rollback().await.map_err(|e| CoreError::Internal(e.into()))?;
                    return self
                        .escrows_repo
                        .find(escrow_id)
                        .await
                        .map_err(CoreError::Internal)?
                        .ok_or_else(|| CoreError::NotFound("escrow not found".to_string()));
                }
                Err(other) => return Err(other),
            };

        let (booking_target, notify_kind) = match action {
            SettlementAction::Release => (BookingStatus::Completed, "escrow.released"),
            SettlementAction::Refund => (BookingStatus::Cancelled, "escrow.refunded"),
        };

        match BookingsRepo::transition_tx(
            &mut tx,
            settled.booking_id,
            booking_target,
            BookingStatus::allowed_from(booking_target),
        )
        .await
        {
            Ok(_) => {}
            Err(e @ CoreError::InvalidTransition { .. }) => {
                tracing::warn!(booking_id = %settled.booking_id, "{e}");
            }
            Err(other) => return Err(other),
        }

        NotificationsOutboxRepo::enqueue_tx(
            &mut tx,
            counterparty(&settled, actor_id),
            notify_kind,
            serde_json::json!({
                "booking_id": settled.booking_id,
                "escrow_id": settled.escrow_id,
                "amount_minor": settled.amount_minor,
                "currency": settled.currency,
                "processed_by": actor_id,
            }),
        )
        .await
        .map_err(CoreError::Internal)?;

        tx.commit().await.map_err(|e| CoreError::Internal(e.into()))?;

        tracing::info!(
            escrow_id = %settled.escrow_id,
            booking_id = %settled.booking_id,
            status = settled.status.as_str(),
            "escrow settled"
        );
        Ok(settled)
    }

    pub async fn find(&self, escrow_id: Uuid) -> CoreResult<Escrow> {
        self.escrows_repo
            .find(escrow_id)
            .await
            .map_err(CoreError::Internal)?
            .ok_or_else(|| CoreError::NotFound("escrow not found".to_string()))
    }
}

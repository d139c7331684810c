use crate::domain::error::{CoreError, CoreResult};
use crate::domain::escrow::{Escrow, EscrowStatus, SettlementAction};
use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct NewEscrow {
    pub escrow_id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub external_ref: String,
}

#[derive(Clone)]
pub struct EscrowsRepo {
    pub pool: PgPool,
}

const ESCROW_COLUMNS: &str = "escrow_id, booking_id, customer_id, provider_id, amount_minor, \
     currency, external_ref, status, held_at, failed_at, cancelled_at, processed_at, \
     processed_by, created_at, updated_at";

fn map_escrow(row: &PgRow) -> Result<Escrow> {
    let status: String = row.get("status");
    Ok(Escrow {
        escrow_id: row.get("escrow_id"),
        booking_id: row.get("booking_id"),
        customer_id: row.get("customer_id"),
        provider_id: row.get("provider_id"),
        amount_minor: row.get("amount_minor"),
        currency: row.get("currency"),
        external_ref: row.get("external_ref"),
        status: EscrowStatus::parse(&status)?,
        held_at: row.get("held_at"),
        failed_at: row.get("failed_at"),
        cancelled_at: row.get("cancelled_at"),
        processed_at: row.get("processed_at"),
        processed_by: row.get("processed_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

impl EscrowsRepo {
    pub async fn find(&self, escrow_id: Uuid) -> Result<Option<Escrow>> {
        let row = sqlx::query(&format!(
            "SELECT {ESCROW_COLUMNS} FROM escrows WHERE escrow_id = $1"
        ))
        .bind(escrow_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_escrow(&r)).transpose()
    }

    pub async fn find_by_external_ref(&self, external_ref: &str) -> Result<Option<Escrow>> {
        let row = sqlx::query(&format!(
            "SELECT {ESCROW_COLUMNS} FROM escrows WHERE external_ref = $1"
        ))
        .bind(external_ref)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_escrow(&r)).transpose()
    }

    pub async fn find_active_for_booking(&self, booking_id: Uuid) -> Result<Option<Escrow>> {
        let row = sqlx::query(&format!(
            "SELECT {ESCROW_COLUMNS} FROM escrows WHERE booking_id = $1 AND status IN ('PENDING', 'HELD')"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_escrow(&r)).transpose()
    }

    /// One non-terminal escrow per booking. The partial unique index is the
    /// backstop for the race between two concurrent hold initiations.
    pub async fn create(&self, data: &NewEscrow) -> CoreResult<Escrow> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO escrows (
                escrow_id, booking_id, customer_id, provider_id, amount_minor,
                currency, external_ref, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'PENDING')
            RETURNING {ESCROW_COLUMNS}
            "#
        ))
        .bind(data.escrow_id)
        .bind(data.booking_id)
        .bind(data.customer_id)
        .bind(data.provider_id)
        .bind(data.amount_minor)
        .bind(data.currency.clone())
        .bind(data.external_ref.clone())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict("payment already exists for this booking".to_string())
            } else {
                CoreError::Internal(e.into())
            }
        })?;

        map_escrow(&row).map_err(CoreError::Internal)
    }

    /// Guarded CAS stamping the timestamp column for the target status.
    async fn transition<'e, E>(
        executor: E,
        escrow_id: Uuid,
        to: EscrowStatus,
        allowed_from: &[EscrowStatus],
        processed_by: Option<Uuid>,
    ) -> CoreResult<Escrow>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let stamp = match to {
            EscrowStatus::Held => "held_at = now(),",
            EscrowStatus::Failed => "failed_at = now(),",
            EscrowStatus::Cancelled => "cancelled_at = now(),",
            EscrowStatus::Released | EscrowStatus::Refunded => {
                "processed_at = now(), processed_by = $4,"
            }
            _ => "",
        };

        let from: Vec<String> = allowed_from.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            r#"
            UPDATE escrows
            SET status = $2, {stamp} updated_at = now()
            WHERE escrow_id = $1 AND status = ANY($3)
            RETURNING {ESCROW_COLUMNS}
            "#
        );

        let mut query = sqlx::query(&sql).bind(escrow_id).bind(to.as_str()).bind(&from);
        if matches!(to, EscrowStatus::Released | EscrowStatus::Refunded) {
            query = query.bind(processed_by);
        }

        let row = query
            .fetch_optional(executor)
            .await
            .map_err(|e| CoreError::Internal(e.into()))?;

        match row {
            Some(r) => map_escrow(&r).map_err(CoreError::Internal),
            None => Err(CoreError::InvalidTransition {
                entity: "escrow",
                id: escrow_id.to_string(),
                from: from.join("|"),
                to: to.as_str().to_string(),
            }),
        }
    }

    pub async fn mark_held_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        escrow_id: Uuid,
    ) -> CoreResult<Escrow> {
        Self::transition(
            tx.as_mut(),
            escrow_id,
            EscrowStatus::Held,
            EscrowStatus::allowed_from(EscrowStatus::Held),
            None,
        )
        .await
    }

    pub async fn mark_failed_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        escrow_id: Uuid,
    ) -> CoreResult<Escrow> {
        Self::transition(
            tx.as_mut(),
            escrow_id,
            EscrowStatus::Failed,
            EscrowStatus::allowed_from(EscrowStatus::Failed),
            None,
        )
        .await
    }

    pub async fn mark_cancelled_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        escrow_id: Uuid,
    ) -> CoreResult<Escrow> {
        Self::transition(
            tx.as_mut(),
            escrow_id,
            EscrowStatus::Cancelled,
            EscrowStatus::allowed_from(EscrowStatus::Cancelled),
            None,
        )
        .await
    }

    pub async fn mark_settled_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        escrow_id: Uuid,
        action: SettlementAction,
        actor_id: Uuid,
    ) -> CoreResult<Escrow> {
        let to = action.target_status();
        Self::transition(
            tx.as_mut(),
            escrow_id,
            to,
            EscrowStatus::allowed_from(to),
            Some(actor_id),
        )
        .await
    }
}

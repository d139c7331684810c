use anyhow::Result;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ServiceRecord {
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub duration_minutes: Option<i32>,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct ServicesRepo {
    pub pool: PgPool,
}

impl ServicesRepo {
    /// Locks the service row for the rest of the transaction. The lock is
    /// what serializes concurrent overlap-check-then-insert for one service.
    pub async fn lock_tx(
        tx: &mut Transaction<'_, Postgres>,
        service_id: Uuid,
    ) -> Result<Option<ServiceRecord>> {
        let row = sqlx::query(
            r#"
            SELECT service_id, provider_id, amount_minor, currency, duration_minutes, is_active
            FROM services
            WHERE service_id = $1
            FOR UPDATE
            "#,
        )
        .bind(service_id)
        .fetch_optional(tx.as_mut())
        .await?;

        Ok(row.map(|r| ServiceRecord {
            service_id: r.get("service_id"),
            provider_id: r.get("provider_id"),
            amount_minor: r.get("amount_minor"),
            currency: r.get("currency"),
            duration_minutes: r.get("duration_minutes"),
            is_active: r.get("is_active"),
        }))
    }
}

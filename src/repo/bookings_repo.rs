use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::error::{CoreError, CoreResult};
use crate::overlap::BookingWindow;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

pub struct NewBooking {
    pub booking_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub amount_minor: i64,
    pub currency: String,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct BookingsRepo {
    pub pool: PgPool,
}

const BOOKING_COLUMNS: &str = "booking_id, service_id, customer_id, provider_id, start_time, \
     end_time, amount_minor, currency, notes, status, created_at, updated_at";

fn map_booking(row: &PgRow) -> Result<Booking> {
    let status: String = row.get("status");
    Ok(Booking {
        booking_id: row.get("booking_id"),
        service_id: row.get("service_id"),
        customer_id: row.get("customer_id"),
        provider_id: row.get("provider_id"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        amount_minor: row.get("amount_minor"),
        currency: row.get("currency"),
        notes: row.get("notes"),
        status: BookingStatus::parse(&status)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl BookingsRepo {
    pub async fn find(&self, booking_id: Uuid) -> Result<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_booking(&r)).transpose()
    }

    /// Windows of bookings that occupy the calendar. Read under the service
    /// row lock so the subsequent insert commits against the same snapshot.
    pub async fn active_windows_tx(
        tx: &mut Transaction<'_, Postgres>,
        service_id: Uuid,
    ) -> Result<Vec<BookingWindow>> {
        let statuses: Vec<String> = BookingStatus::ACTIVE
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let rows = sqlx::query(
            r#"
            SELECT start_time, end_time
            FROM bookings
            WHERE service_id = $1 AND status = ANY($2)
            "#,
        )
        .bind(service_id)
        .bind(&statuses)
        .fetch_all(tx.as_mut())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| BookingWindow {
                start: r.get("start_time"),
                end: r.get("end_time"),
            })
            .collect())
    }

    pub async fn create_tx(tx: &mut Transaction<'_, Postgres>, data: &NewBooking) -> Result<Booking> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bookings (
                booking_id, service_id, customer_id, provider_id, start_time, end_time,
                amount_minor, currency, notes, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'PENDING')
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(data.booking_id)
        .bind(data.service_id)
        .bind(data.customer_id)
        .bind(data.provider_id)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.amount_minor)
        .bind(data.currency.clone())
        .bind(data.notes.clone())
        .fetch_one(tx.as_mut())
        .await?;

        map_booking(&row)
    }

    /// Guarded compare-and-swap: succeeds only while the current status is
    /// in `allowed_from`. Zero rows means another actor got there first.
    pub async fn transition_tx(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
        to: BookingStatus,
        allowed_from: &[BookingStatus],
    ) -> CoreResult<Booking> {
        let from: Vec<String> = allowed_from.iter().map(|s| s.as_str().to_string()).collect();
        let row = sqlx::query(&format!(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = now()
            WHERE booking_id = $1 AND status = ANY($3)
            RETURNING {BOOKING_COLUMNS}
            "#
        ))
        .bind(booking_id)
        .bind(to.as_str())
        .bind(&from)
        .fetch_optional(tx.as_mut())
        .await
        .map_err(|e| CoreError::Internal(e.into()))?;

        match row {
            Some(r) => map_booking(&r).map_err(CoreError::Internal),
            None => Err(CoreError::InvalidTransition {
                entity: "booking",
                id: booking_id.to_string(),
                from: from.join("|"),
                to: to.as_str().to_string(),
            }),
        }
    }

    pub async fn transition(
        &self,
        booking_id: Uuid,
        to: BookingStatus,
        allowed_from: &[BookingStatus],
    ) -> CoreResult<Booking> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::Internal(e.into()))?;
        let booking = Self::transition_tx(&mut tx, booking_id, to, allowed_from).await?;
        tx.commit().await.map_err(|e| CoreError::Internal(e.into()))?;
        Ok(booking)
    }
}

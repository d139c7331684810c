use crate::domain::booking::{Booking, BookingStatus, CreateBookingRequest};
use crate::domain::error::{CoreError, CoreResult};
use crate::domain::escrow::Escrow;
use crate::gateway::{CreateHoldRequest, PaymentGatewayClient};
use crate::overlap::{find_conflict, resolve_end, BookingWindow};
use crate::repo::bookings_repo::{BookingsRepo, NewBooking};
use crate::repo::escrows_repo::{EscrowsRepo, NewEscrow};
use crate::repo::services_repo::ServicesRepo;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct BookingService {
    pub pool: PgPool,
    pub bookings_repo: BookingsRepo,
    pub escrows_repo: EscrowsRepo,
    pub gateway: Arc<dyn PaymentGatewayClient>,
}

impl BookingService {
    /// Overlap check and insert commit as one unit: the service row lock
    /// serializes concurrent creation per service, so two overlapping
    /// requests cannot both pass the check.
    pub async fn create(&self, req: CreateBookingRequest) -> CoreResult<Booking> {
        if req.amount_minor <= 0 {
            return Err(CoreError::Validation("amount_minor must be > 0".to_string()));
        }
        if let Some(end) = req.end_time {
            if end <= req.start_time {
                return Err(CoreError::Validation(
                    "end_time must be after start_time".to_string(),
                ));
            }
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::Internal(e.into()))?;

        let service = ServicesRepo::lock_tx(&mut tx, req.service_id)
            .await
            .map_err(CoreError::Internal)?
            .ok_or_else(|| CoreError::Validation("service not found".to_string()))?;

        if !service.is_active {
            return Err(CoreError::Validation("service is not active".to_string()));
        }
        if !req.currency.eq_ignore_ascii_case(&service.currency) {
            return Err(CoreError::Validation(format!(
                "currency must be {}",
                service.currency
            )));
        }

        let end_time = resolve_end(req.start_time, req.end_time, service.duration_minutes);
        let candidate = BookingWindow {
            start: req.start_time,
            end: end_time,
        };

        let existing = BookingsRepo::active_windows_tx(&mut tx, req.service_id)
            .await
            .map_err(CoreError::Internal)?;
        if find_conflict(candidate, &existing).is_some() {
            return Err(CoreError::Conflict(
                "requested time window overlaps an existing booking".to_string(),
            ));
        }

        let booking = BookingsRepo::create_tx(
            &mut tx,
            &NewBooking {
                booking_id: Uuid::new_v4(),
                service_id: service.service_id,
                customer_id: req.customer_id,
                provider_id: service.provider_id,
                start_time: req.start_time,
                end_time,
                amount_minor: req.amount_minor,
                currency: service.currency.clone(),
                notes: req.notes,
            },
        )
        .await
        .map_err(CoreError::Internal)?;

        tx.commit().await.map_err(|e| CoreError::Internal(e.into()))?;

        tracing::info!(
            booking_id = %booking.booking_id,
            service_id = %booking.service_id,
            "booking created"
        );
        Ok(booking)
    }

    /// Requests the external hold, then records the escrow. The gateway
    /// call completes before any row is written; a gateway failure leaves
    /// no local trace and the caller may retry.
    pub async fn initiate_hold(&self, booking_id: Uuid, actor_id: Uuid) -> CoreResult<Escrow> {
        let booking = self
            .bookings_repo
            .find(booking_id)
            .await
            .map_err(CoreError::Internal)?
            .ok_or_else(|| CoreError::NotFound("booking not found".to_string()))?;

        if booking.customer_id != actor_id {
            return Err(CoreError::NotAuthorized(
                "only the booking's customer may initiate payment".to_string(),
            ));
        }
        if booking.status != BookingStatus::Pending {
            return Err(CoreError::InvalidState(format!(
                "booking is {}, payment can only be initiated while PENDING",
                booking.status.as_str()
            )));
        }
        if self
            .escrows_repo
            .find_active_for_booking(booking_id)
            .await
            .map_err(CoreError::Internal)?
            .is_some()
        {
            return Err(CoreError::Conflict(
                "payment already exists for this booking".to_string(),
            ));
        }

        let hold = self
            .gateway
            .create_hold(CreateHoldRequest {
                amount_minor: booking.amount_minor,
                currency: booking.currency.clone(),
                booking_id: booking.booking_id,
                customer_id: booking.customer_id,
            })
            .await?;

        let escrow = self
            .escrows_repo
            .create(&NewEscrow {
                escrow_id: Uuid::new_v4(),
                booking_id: booking.booking_id,
                customer_id: booking.customer_id,
                provider_id: booking.provider_id,
                amount_minor: booking.amount_minor,
                currency: booking.currency.clone(),
                external_ref: hold.external_ref,
            })
            .await?;

        tracing::info!(
            escrow_id = %escrow.escrow_id,
            booking_id = %booking.booking_id,
            gateway = self.gateway.name(),
            "payment hold requested"
        );
        Ok(escrow)
    }

    /// Provider marks the service as underway.
    pub async fn start(&self, booking_id: Uuid, actor_id: Uuid) -> CoreResult<Booking> {
        let booking = self
            .bookings_repo
            .find(booking_id)
            .await
            .map_err(CoreError::Internal)?
            .ok_or_else(|| CoreError::NotFound("booking not found".to_string()))?;

        if booking.provider_id != actor_id {
            return Err(CoreError::NotAuthorized(
                "only the provider may start the booking".to_string(),
            ));
        }

        match self
            .bookings_repo
            .transition(
                booking_id,
                BookingStatus::InProgress,
                BookingStatus::allowed_from(BookingStatus::InProgress),
            )
            .await
        {
            Ok(updated) => Ok(updated),
            // a manual action racing another transition is an error to the
            // caller, unlike webhook redelivery
            Err(CoreError::InvalidTransition { .. }) => Err(CoreError::InvalidState(format!(
                "booking is {}, it must be CONFIRMED to start",
                booking.status.as_str()
            ))),
            Err(other) => Err(other),
        }
    }

    pub async fn find(&self, booking_id: Uuid) -> CoreResult<Booking> {
        self.bookings_repo
            .find(booking_id)
            .await
            .map_err(CoreError::Internal)?
            .ok_or_else(|| CoreError::NotFound("booking not found".to_string()))
    }
}

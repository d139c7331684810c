use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(anyhow::anyhow!("unknown booking status: {other}")),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Statuses that occupy the service calendar for overlap checks.
    pub const ACTIVE: [BookingStatus; 3] = [Self::Pending, Self::Confirmed, Self::InProgress];

    /// Guard sets for every reachable target status.
    pub fn allowed_from(to: BookingStatus) -> &'static [BookingStatus] {
        match to {
            Self::Pending => &[],
            Self::Confirmed => &[Self::Pending],
            Self::InProgress => &[Self::Confirmed],
            Self::Cancelled => &[Self::Pending, Self::Confirmed],
            Self::Completed => &[Self::Confirmed, Self::InProgress],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub booking_id: Uuid,
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub amount_minor: i64,
    pub currency: String,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub amount_minor: i64,
    pub currency: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorRequest {
    pub actor_id: Uuid,
}

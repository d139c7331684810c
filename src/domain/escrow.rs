use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EscrowStatus {
    Pending,
    Held,
    Released,
    Refunded,
    Failed,
    Cancelled,
    Disputed,
}

impl EscrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Held => "HELD",
            Self::Released => "RELEASED",
            Self::Refunded => "REFUNDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Disputed => "DISPUTED",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "HELD" => Ok(Self::Held),
            "RELEASED" => Ok(Self::Released),
            "REFUNDED" => Ok(Self::Refunded),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            "DISPUTED" => Ok(Self::Disputed),
            other => Err(anyhow::anyhow!("unknown escrow status: {other}")),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Released | Self::Refunded | Self::Failed | Self::Cancelled
        )
    }

    pub fn allowed_from(to: EscrowStatus) -> &'static [EscrowStatus] {
        match to {
            Self::Pending => &[],
            Self::Held => &[Self::Pending],
            Self::Failed => &[Self::Pending],
            Self::Cancelled => &[Self::Pending],
            Self::Released => &[Self::Held],
            Self::Refunded => &[Self::Held],
            // nothing transitions into DISPUTED; adjudication lives outside this system
            Self::Disputed => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementAction {
    Release,
    Refund,
}

impl SettlementAction {
    pub fn target_status(&self) -> EscrowStatus {
        match self {
            Self::Release => EscrowStatus::Released,
            Self::Refund => EscrowStatus::Refunded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Escrow {
    pub escrow_id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub external_ref: Option<String>,
    pub status: EscrowStatus,
    pub held_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettlementRequest {
    pub action: SettlementAction,
    pub actor_id: Uuid,
}

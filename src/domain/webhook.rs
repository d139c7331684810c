use serde::Deserialize;

/// Minimal identity parse, enough to record any event for dedup even when
/// the type is one we do not act on.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEventEnvelope {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

/// Gateway events this system acts on, keyed by the verified `type` field.
/// Each variant carries only the fields that type guarantees.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum GatewayEvent {
    #[serde(rename = "hold.succeeded")]
    HoldSucceeded { id: String, hold_ref: String },

    #[serde(rename = "hold.failed")]
    HoldFailed {
        id: String,
        hold_ref: String,
        failure_code: Option<String>,
        failure_message: Option<String>,
    },

    #[serde(rename = "hold.cancelled")]
    HoldCancelled { id: String, hold_ref: String },

    #[serde(rename = "hold.requires_action")]
    HoldRequiresAction {
        id: String,
        hold_ref: String,
        action_url: Option<String>,
    },

    #[serde(other)]
    Unknown,
}

impl GatewayEvent {
    pub fn hold_ref(&self) -> Option<&str> {
        match self {
            Self::HoldSucceeded { hold_ref, .. }
            | Self::HoldFailed { hold_ref, .. }
            | Self::HoldCancelled { hold_ref, .. }
            | Self::HoldRequiresAction { hold_ref, .. } => Some(hold_ref),
            Self::Unknown => None,
        }
    }
}

pub fn parse_envelope(raw: &[u8]) -> Result<GatewayEventEnvelope, serde_json::Error> {
    serde_json::from_slice(raw)
}

pub fn parse_event(raw: &[u8]) -> Result<GatewayEvent, serde_json::Error> {
    serde_json::from_slice(raw)
}

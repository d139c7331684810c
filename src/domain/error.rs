use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    /// Guard failure on a compare-and-swap transition. Expected under
    /// webhook redelivery and races; callers treat it as already handled.
    #[error("invalid transition for {entity} {id}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    NotAuthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("webhook signature verification failed")]
    SecurityViolation,

    /// Gateway network/timeout/HTTP failure. Retryable; never accompanied
    /// by a local state change.
    #[error("payment gateway error: {0}")]
    ExternalGateway(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::NotAuthorized(_) => "NOT_AUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::SecurityViolation => "SECURITY_VIOLATION",
            Self::ExternalGateway(_) => "EXTERNAL_GATEWAY_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let message = match self {
            // never leak internals to callers
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message,
                details: None,
            },
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

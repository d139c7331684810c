use crate::domain::error::{CoreError, ErrorEnvelope};
use axum::http::StatusCode;
use axum::Json;

pub fn error_response(err: &CoreError) -> (StatusCode, Json<ErrorEnvelope>) {
    let status = match err {
        CoreError::Validation(_) => StatusCode::BAD_REQUEST,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::InvalidState(_) => StatusCode::CONFLICT,
        // guard failures are not user-facing failures; if one escapes this
        // far it reads as a conflict
        CoreError::InvalidTransition { .. } => StatusCode::CONFLICT,
        CoreError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::SecurityViolation => StatusCode::UNAUTHORIZED,
        CoreError::ExternalGateway(_) => StatusCode::BAD_GATEWAY,
        CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if matches!(err, CoreError::Internal(_)) {
        tracing::error!("internal error: {err:#}");
    }

    (status, Json(err.envelope()))
}

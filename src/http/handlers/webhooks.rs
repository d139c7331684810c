use crate::http::responses::error_response;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

/// Raw-body endpoint: signature verification happens over the exact bytes
/// the gateway signed. 200 for processed or duplicate; the gateway retries
/// anything else.
pub async fn receive_gateway_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get("X-Gateway-Signature")
        .and_then(|h| h.to_str().ok());

    match state.webhook_processor.process(&body, signature).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

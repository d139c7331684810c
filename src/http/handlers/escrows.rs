use crate::domain::escrow::SettlementRequest;
use crate::http::responses::error_response;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

pub async fn get_escrow(
    State(state): State<AppState>,
    Path(escrow_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.settlement_service.find(escrow_id).await {
        Ok(escrow) => (StatusCode::OK, Json(escrow)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

pub async fn settle_escrow(
    State(state): State<AppState>,
    Path(escrow_id): Path<Uuid>,
    Json(req): Json<SettlementRequest>,
) -> impl IntoResponse {
    match state
        .settlement_service
        .settle(escrow_id, req.action, req.actor_id)
        .await
    {
        Ok(escrow) => (StatusCode::OK, Json(escrow)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

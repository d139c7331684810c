use crate::domain::booking::{ActorRequest, CreateBookingRequest};
use crate::http::responses::error_response;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> impl IntoResponse {
    match state.booking_service.create(req).await {
        Ok(booking) => (StatusCode::CREATED, Json(booking)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.booking_service.find(booking_id).await {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

pub async fn initiate_payment(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> impl IntoResponse {
    match state.booking_service.initiate_hold(booking_id, req.actor_id).await {
        Ok(escrow) => (StatusCode::CREATED, Json(escrow)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

pub async fn start_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<ActorRequest>,
) -> impl IntoResponse {
    match state.booking_service.start(booking_id, req.actor_id).await {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use seatkeeper_core::{ArrivedGuest, GuestListEntry, Reservation};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub table_id: Uuid,
    pub accompanying_guests: i32,
}

#[derive(Debug, Deserialize)]
pub struct ArrivalRequest {
    pub accompanying_guests: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReservationCreatedResponse {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GuestList<T> {
    pub guests: Vec<T>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guest_list", get(list_reservations))
        .route("/guest_list/{name}", post(create_reservation))
        .route("/guests", get(list_arrived))
        .route("/guests/{name}", put(record_arrival).delete(record_departure))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /guest_list/{name}
/// Book seats on a table for a named party
async fn create_reservation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<Json<ReservationCreatedResponse>, AppError> {
    let id = state
        .coordinator
        .create_reservation(req.table_id, &name, req.accompanying_guests)
        .await?;

    Ok(Json(ReservationCreatedResponse { id, name }))
}

/// GET /guest_list
async fn list_reservations(
    State(state): State<AppState>,
) -> Result<Json<GuestList<GuestListEntry>>, AppError> {
    let guests = state.coordinator.list_reservations().await?;
    Ok(Json(GuestList { guests }))
}

/// PUT /guests/{name}
/// Guest arrives, possibly with a different party size than booked
async fn record_arrival(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ArrivalRequest>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .coordinator
        .record_arrival(&name, req.accompanying_guests)
        .await?;
    Ok(Json(reservation))
}

/// GET /guests
async fn list_arrived(
    State(state): State<AppState>,
) -> Result<Json<GuestList<ArrivedGuest>>, AppError> {
    let guests = state.coordinator.list_attended().await?;
    Ok(Json(GuestList { guests }))
}

/// DELETE /guests/{name}
async fn record_departure(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.coordinator.record_departure(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

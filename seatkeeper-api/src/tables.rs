use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use seatkeeper_core::Table;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTableRequest {
    pub capacity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmptySeatsResponse {
    pub seats_empty: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tables", post(create_table))
        .route("/tables/{id}", get(get_table))
        .route("/seats_empty", get(get_empty_seats))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /tables
async fn create_table(
    State(state): State<AppState>,
    Json(req): Json<CreateTableRequest>,
) -> Result<Json<Table>, AppError> {
    let id = state.coordinator.create_table(req.capacity).await?;

    Ok(Json(Table {
        id,
        capacity: req.capacity,
        booked_seats: 0,
        available_seats: req.capacity,
    }))
}

/// GET /tables/{id}
async fn get_table(
    State(state): State<AppState>,
    Path(table_id): Path<Uuid>,
) -> Result<Json<Table>, AppError> {
    Ok(Json(state.coordinator.get_table(table_id).await?))
}

/// GET /seats_empty
/// Free seats summed over every table
async fn get_empty_seats(State(state): State<AppState>) -> Result<Json<EmptySeatsResponse>, AppError> {
    let seats_empty = state.coordinator.total_empty_seats().await?;
    Ok(Json(EmptySeatsResponse { seats_empty }))
}

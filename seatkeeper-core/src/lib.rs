pub mod models;
pub mod repository;
pub mod coordinator;
pub mod memory;

pub use models::{ActiveReservation, ArrivedGuest, GuestListEntry, Reservation, ReservationStatus, Table};
pub use repository::{ReservationStore, SeatingStore, SeatingTransaction, TableLedger};
pub use coordinator::SeatingCoordinator;
pub use memory::MemoryStore;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Insufficient seats on table {table_id}: requested {requested}, available {available}")]
    InsufficientSeats {
        table_id: Uuid,
        requested: i32,
        available: i32,
    },
    #[error("Guest {0} already holds an active reservation")]
    DuplicateGuest(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn table_not_found(table_id: Uuid) -> Self {
        CoreError::NotFound(format!("table {}", table_id))
    }

    pub fn guest_not_found(name: &str) -> Self {
        CoreError::NotFound(format!("no active reservation for {}", name))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

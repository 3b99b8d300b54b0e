use async_trait::async_trait;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::models::{ActiveReservation, ArrivedGuest, GuestListEntry, Table};
use crate::CoreResult;

/// Per-table seat bookkeeping, scoped to one open transaction.
#[async_trait]
pub trait TableLedger: Send {
    /// Current free seats of a table. Locks the row until the transaction ends.
    async fn available_seats(&mut self, table_id: Uuid) -> CoreResult<i32>;

    async fn has_available_seats(&mut self, table_id: Uuid, required_seats: i32) -> CoreResult<bool> {
        Ok(self.available_seats(table_id).await? >= required_seats)
    }

    /// `booked_seats += delta; available_seats -= delta`. Negative deltas release seats.
    /// Availability is not re-checked here.
    async fn adjust_seats(&mut self, table_id: Uuid, delta: i32) -> CoreResult<()>;
}

/// Reservation lifecycle records, scoped to one open transaction.
#[async_trait]
pub trait ReservationStore: Send {
    async fn insert_reservation(
        &mut self,
        table_id: Uuid,
        name: &str,
        party_size: i32,
    ) -> CoreResult<Uuid>;

    /// Looks up the non-archived reservation held under `name`.
    async fn find_active_by_name(&mut self, name: &str) -> CoreResult<ActiveReservation>;

    async fn mark_attended(
        &mut self,
        reservation_id: Uuid,
        party_size: i32,
        arrived_at: DateTime<Utc>,
    ) -> CoreResult<()>;

    /// Marks arrival without touching the party size.
    async fn mark_attended_no_resize(
        &mut self,
        reservation_id: Uuid,
        arrived_at: DateTime<Utc>,
    ) -> CoreResult<()>;

    /// The final party size is kept on the row for audit.
    async fn mark_archived(&mut self, reservation_id: Uuid, final_party_size: i32) -> CoreResult<()>;
}

/// An open unit of work over both ledgers.
///
/// Dropping it without calling `commit` rolls back every write made through it.
#[async_trait]
pub trait SeatingTransaction: TableLedger + ReservationStore {
    async fn commit(self: Box<Self>) -> CoreResult<()>;
}

/// Storage backend for tables and reservations.
#[async_trait]
pub trait SeatingStore: Send + Sync {
    async fn begin(&self) -> CoreResult<Box<dyn SeatingTransaction>>;

    async fn create_table(&self, capacity: i32) -> CoreResult<Uuid>;

    async fn get_table(&self, table_id: Uuid) -> CoreResult<Table>;

    /// Zero when no tables exist.
    async fn sum_available_seats(&self) -> CoreResult<i64>;

    async fn list_reservations(&self) -> CoreResult<Vec<GuestListEntry>>;

    async fn list_attended(&self) -> CoreResult<Vec<ArrivedGuest>>;
}

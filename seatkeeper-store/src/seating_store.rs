use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use seatkeeper_core::{
    ActiveReservation, ArrivedGuest, CoreError, CoreResult, GuestListEntry, Reservation,
    ReservationStore, SeatingStore, SeatingTransaction, Table, TableLedger,
};

use crate::reservation_repo::ReservationRepository;
use crate::table_repo::TableRepository;

/// Postgres-backed seating store.
///
/// Each transaction runs at the server's default read-committed level; the
/// availability read takes a row lock so concurrent flows on one table queue
/// behind each other instead of both passing the check.
#[derive(Clone)]
pub struct PgSeatingStore {
    pool: PgPool,
}

impl PgSeatingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub struct PgSeatingTransaction {
    tx: Transaction<'static, Postgres>,
}

pub(crate) fn storage_error(err: sqlx::Error) -> CoreError {
    CoreError::Storage(err.to_string())
}

fn expect_row(rows_affected: u64, what: impl FnOnce() -> CoreError) -> CoreResult<()> {
    if rows_affected == 0 {
        return Err(what());
    }
    Ok(())
}

fn reservation_not_found(reservation_id: Uuid) -> CoreError {
    CoreError::NotFound(format!("reservation {}", reservation_id))
}

#[async_trait]
impl TableLedger for PgSeatingTransaction {
    async fn available_seats(&mut self, table_id: Uuid) -> CoreResult<i32> {
        TableRepository::lock_available_seats(&mut *self.tx, table_id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| CoreError::table_not_found(table_id))
    }

    async fn adjust_seats(&mut self, table_id: Uuid, delta: i32) -> CoreResult<()> {
        let rows = TableRepository::adjust_seats(&mut *self.tx, table_id, delta)
            .await
            .map_err(storage_error)?;
        expect_row(rows, || CoreError::table_not_found(table_id))
    }
}

#[async_trait]
impl ReservationStore for PgSeatingTransaction {
    async fn insert_reservation(
        &mut self,
        table_id: Uuid,
        name: &str,
        party_size: i32,
    ) -> CoreResult<Uuid> {
        let reservation = Reservation::new(table_id, name.to_string(), party_size);
        ReservationRepository::insert(&mut *self.tx, &reservation)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    CoreError::DuplicateGuest(name.to_string())
                }
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    CoreError::table_not_found(table_id)
                }
                other => storage_error(other),
            })?;
        Ok(reservation.id)
    }

    async fn find_active_by_name(&mut self, name: &str) -> CoreResult<ActiveReservation> {
        let row = ReservationRepository::find_active_by_name(&mut *self.tx, name)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| CoreError::guest_not_found(name))?;
        ActiveReservation::try_from(row).map_err(CoreError::Storage)
    }

    async fn mark_attended(
        &mut self,
        reservation_id: Uuid,
        party_size: i32,
        arrived_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let rows = ReservationRepository::mark_attended(&mut *self.tx, reservation_id, party_size, arrived_at)
            .await
            .map_err(storage_error)?;
        expect_row(rows, || reservation_not_found(reservation_id))
    }

    async fn mark_attended_no_resize(
        &mut self,
        reservation_id: Uuid,
        arrived_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let rows = ReservationRepository::mark_attended_no_resize(&mut *self.tx, reservation_id, arrived_at)
            .await
            .map_err(storage_error)?;
        expect_row(rows, || reservation_not_found(reservation_id))
    }

    async fn mark_archived(&mut self, reservation_id: Uuid, final_party_size: i32) -> CoreResult<()> {
        let rows = ReservationRepository::mark_archived(&mut *self.tx, reservation_id, final_party_size)
            .await
            .map_err(storage_error)?;
        expect_row(rows, || reservation_not_found(reservation_id))
    }
}

#[async_trait]
impl SeatingTransaction for PgSeatingTransaction {
    async fn commit(self: Box<Self>) -> CoreResult<()> {
        let PgSeatingTransaction { tx } = *self;
        tx.commit().await.map_err(storage_error)
    }
}

#[async_trait]
impl SeatingStore for PgSeatingStore {
    async fn begin(&self) -> CoreResult<Box<dyn SeatingTransaction>> {
        let tx = self.pool.begin().await.map_err(storage_error)?;
        Ok(Box::new(PgSeatingTransaction { tx }))
    }

    async fn create_table(&self, capacity: i32) -> CoreResult<Uuid> {
        let table = Table::new(capacity);
        TableRepository::insert(&self.pool, &table)
            .await
            .map_err(storage_error)?;
        Ok(table.id)
    }

    async fn get_table(&self, table_id: Uuid) -> CoreResult<Table> {
        TableRepository::fetch(&self.pool, table_id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| CoreError::table_not_found(table_id))
    }

    async fn sum_available_seats(&self) -> CoreResult<i64> {
        TableRepository::sum_available_seats(&self.pool)
            .await
            .map_err(storage_error)
    }

    async fn list_reservations(&self) -> CoreResult<Vec<GuestListEntry>> {
        ReservationRepository::list_all(&self.pool)
            .await
            .map_err(storage_error)
    }

    async fn list_attended(&self) -> CoreResult<Vec<ArrivedGuest>> {
        ReservationRepository::list_attended(&self.pool)
            .await
            .map_err(storage_error)
    }
}

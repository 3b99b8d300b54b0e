use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::{ActiveReservation, ArrivedGuest, GuestListEntry, Reservation, ReservationStatus, Table};
use crate::repository::{ReservationStore, SeatingStore, SeatingTransaction, TableLedger};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    tables: HashMap<Uuid, Table>,
    // Creation order is the listing order.
    reservations: Vec<Reservation>,
}

impl MemoryState {
    fn table_mut(&mut self, table_id: Uuid) -> CoreResult<&mut Table> {
        self.tables
            .get_mut(&table_id)
            .ok_or_else(|| CoreError::table_not_found(table_id))
    }

    fn reservation_mut(&mut self, reservation_id: Uuid) -> CoreResult<&mut Reservation> {
        self.reservations
            .iter_mut()
            .find(|r| r.id == reservation_id)
            .ok_or_else(|| CoreError::NotFound(format!("reservation {}", reservation_id)))
    }
}

/// In-process store with serializable transactions.
///
/// A transaction holds the store lock from `begin` until commit or drop and
/// works on a private copy, so uncommitted writes are never observable.
///
/// `begin` clones the whole state, making every flow linear in the number of
/// reservations. Meant for tests and small events; use Postgres otherwise.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_commits: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following commit fail with a storage error until reset.
    pub fn set_commit_failure(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Full reservation rows, including status, in creation order.
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.state.lock().await.reservations.clone()
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_commit: bool,
}

#[async_trait]
impl TableLedger for MemoryTransaction {
    async fn available_seats(&mut self, table_id: Uuid) -> CoreResult<i32> {
        Ok(self.working.table_mut(table_id)?.available_seats)
    }

    async fn adjust_seats(&mut self, table_id: Uuid, delta: i32) -> CoreResult<()> {
        let table = self.working.table_mut(table_id)?;
        table.booked_seats += delta;
        table.available_seats -= delta;
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for MemoryTransaction {
    async fn insert_reservation(
        &mut self,
        table_id: Uuid,
        name: &str,
        party_size: i32,
    ) -> CoreResult<Uuid> {
        if !self.working.tables.contains_key(&table_id) {
            return Err(CoreError::table_not_found(table_id));
        }
        let reservation = Reservation::new(table_id, name.to_string(), party_size);
        let id = reservation.id;
        self.working.reservations.push(reservation);
        Ok(id)
    }

    async fn find_active_by_name(&mut self, name: &str) -> CoreResult<ActiveReservation> {
        self.working
            .reservations
            .iter()
            .find(|r| r.name == name && r.status.holds_seats())
            .map(ActiveReservation::from)
            .ok_or_else(|| CoreError::guest_not_found(name))
    }

    async fn mark_attended(
        &mut self,
        reservation_id: Uuid,
        party_size: i32,
        arrived_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let reservation = self.working.reservation_mut(reservation_id)?;
        reservation.status = ReservationStatus::Attended;
        reservation.accompanying_guests = party_size;
        reservation.arrival_time = Some(arrived_at);
        Ok(())
    }

    async fn mark_attended_no_resize(
        &mut self,
        reservation_id: Uuid,
        arrived_at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let reservation = self.working.reservation_mut(reservation_id)?;
        reservation.status = ReservationStatus::Attended;
        reservation.arrival_time = Some(arrived_at);
        Ok(())
    }

    async fn mark_archived(&mut self, reservation_id: Uuid, final_party_size: i32) -> CoreResult<()> {
        let reservation = self.working.reservation_mut(reservation_id)?;
        reservation.status = ReservationStatus::Archived;
        reservation.accompanying_guests = final_party_size;
        Ok(())
    }
}

#[async_trait]
impl SeatingTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> CoreResult<()> {
        if self.fail_commit {
            return Err(CoreError::Storage("commit rejected by memory store".to_string()));
        }
        let MemoryTransaction { mut guard, working, .. } = *self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl SeatingStore for MemoryStore {
    async fn begin(&self) -> CoreResult<Box<dyn SeatingTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            fail_commit: self.fail_commits.load(Ordering::SeqCst),
        }))
    }

    async fn create_table(&self, capacity: i32) -> CoreResult<Uuid> {
        let table = Table::new(capacity);
        let id = table.id;
        self.state.lock().await.tables.insert(id, table);
        Ok(id)
    }

    async fn get_table(&self, table_id: Uuid) -> CoreResult<Table> {
        self.state
            .lock()
            .await
            .tables
            .get(&table_id)
            .cloned()
            .ok_or_else(|| CoreError::table_not_found(table_id))
    }

    async fn sum_available_seats(&self) -> CoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state.tables.values().map(|t| i64::from(t.available_seats)).sum())
    }

    async fn list_reservations(&self) -> CoreResult<Vec<GuestListEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .iter()
            .map(|r| GuestListEntry {
                table_id: r.table_id,
                name: r.name.clone(),
                accompanying_guests: r.accompanying_guests,
            })
            .collect())
    }

    async fn list_attended(&self) -> CoreResult<Vec<ArrivedGuest>> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Attended)
            .map(|r| ArrivedGuest {
                name: r.name.clone(),
                accompanying_guests: r.accompanying_guests,
                time_arrived: r.arrival_time,
            })
            .collect())
    }
}

use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{ArrivedGuest, GuestListEntry, Reservation, ReservationStatus, Table};
use crate::repository::{SeatingStore, SeatingTransaction};
use crate::{CoreError, CoreResult};

/// Runs every seat-changing flow as one store transaction across the table
/// ledger and the reservation records.
///
/// Failures are returned as they happen; dropping the open transaction on the
/// error path rolls back whatever was written before it.
#[derive(Clone)]
pub struct SeatingCoordinator {
    store: Arc<dyn SeatingStore>,
}

impl SeatingCoordinator {
    pub fn new(store: Arc<dyn SeatingStore>) -> Self {
        Self { store }
    }

    pub async fn create_table(&self, capacity: i32) -> CoreResult<Uuid> {
        if capacity <= 0 {
            return Err(CoreError::ValidationError(format!(
                "table capacity must be positive, got {}",
                capacity
            )));
        }
        let table_id = self.store.create_table(capacity).await?;
        info!(%table_id, capacity, "table created");
        Ok(table_id)
    }

    pub async fn get_table(&self, table_id: Uuid) -> CoreResult<Table> {
        self.store.get_table(table_id).await
    }

    /// Books `party_size` seats on a table under a guest name.
    pub async fn create_reservation(
        &self,
        table_id: Uuid,
        name: &str,
        party_size: i32,
    ) -> CoreResult<Uuid> {
        validate_name(name)?;
        validate_party_size(party_size)?;

        let mut tx = self.store.begin().await?;

        match tx.find_active_by_name(name).await {
            Ok(_) => return Err(CoreError::DuplicateGuest(name.to_string())),
            Err(CoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        reserve_seats(tx.as_mut(), table_id, party_size).await?;
        let reservation_id = tx.insert_reservation(table_id, name, party_size).await?;
        tx.commit().await?;

        info!(%reservation_id, %table_id, party_size, "reservation created for {}", name);
        Ok(reservation_id)
    }

    /// Marks a guest as arrived, resizing the booking to the party that showed up.
    pub async fn record_arrival(&self, name: &str, party_size: i32) -> CoreResult<Reservation> {
        validate_party_size(party_size)?;

        let mut tx = self.store.begin().await?;
        let booked = tx.find_active_by_name(name).await?;
        let arrived_at = booked.arrival_time.unwrap_or_else(Utc::now);
        let delta = party_size - booked.accompanying_guests;

        if delta == 0 {
            tx.mark_attended_no_resize(booked.id, arrived_at).await?;
        } else {
            if delta > 0 {
                reserve_seats(tx.as_mut(), booked.table_id, delta).await?;
            } else {
                tx.adjust_seats(booked.table_id, delta).await?;
            }
            tx.mark_attended(booked.id, party_size, arrived_at).await?;
        }
        tx.commit().await?;

        info!(reservation_id = %booked.id, delta, "guests {} arrived", name);
        Ok(Reservation {
            id: booked.id,
            table_id: booked.table_id,
            name: name.to_string(),
            accompanying_guests: party_size,
            status: ReservationStatus::Attended,
            arrival_time: Some(arrived_at),
        })
    }

    /// Releases every seat held by the guest and archives the reservation.
    pub async fn record_departure(&self, name: &str) -> CoreResult<()> {
        let mut tx = self.store.begin().await?;
        let active = tx.find_active_by_name(name).await?;

        tx.adjust_seats(active.table_id, -active.accompanying_guests).await?;
        tx.mark_archived(active.id, active.accompanying_guests).await?;
        tx.commit().await?;

        info!(reservation_id = %active.id, released = active.accompanying_guests, "guests {} left", name);
        Ok(())
    }

    pub async fn list_reservations(&self) -> CoreResult<Vec<GuestListEntry>> {
        self.store.list_reservations().await
    }

    pub async fn list_attended(&self) -> CoreResult<Vec<ArrivedGuest>> {
        self.store.list_attended().await
    }

    pub async fn total_empty_seats(&self) -> CoreResult<i64> {
        self.store.sum_available_seats().await
    }
}

/// Checks availability and takes `seats` from the table inside `tx`.
async fn reserve_seats(tx: &mut dyn SeatingTransaction, table_id: Uuid, seats: i32) -> CoreResult<()> {
    if !tx.has_available_seats(table_id, seats).await? {
        // Row is already locked, so this re-read sees the same value.
        let available = tx.available_seats(table_id).await?;
        warn!(%table_id, requested = seats, available, "not enough seats");
        return Err(CoreError::InsufficientSeats {
            table_id,
            requested: seats,
            available,
        });
    }
    tx.adjust_seats(table_id, seats).await
}

fn validate_party_size(party_size: i32) -> CoreResult<()> {
    if party_size <= 0 {
        return Err(CoreError::ValidationError(format!(
            "accompanying guests must be positive, got {}",
            party_size
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::ValidationError("guest name must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn setup() -> (MemoryStore, SeatingCoordinator) {
        let store = MemoryStore::new();
        let coordinator = SeatingCoordinator::new(Arc::new(store.clone()));
        (store, coordinator)
    }

    async fn status_of(store: &MemoryStore, name: &str) -> ReservationStatus {
        store
            .reservations()
            .await
            .into_iter()
            .rev()
            .find(|r| r.name == name)
            .map(|r| r.status)
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_fill() {
        let (_store, coordinator) = setup();
        let table_id = coordinator.create_table(10).await.unwrap();
        assert_eq!(coordinator.get_table(table_id).await.unwrap().available_seats, 10);

        coordinator.create_reservation(table_id, "Tom", 10).await.unwrap();
        assert_eq!(coordinator.get_table(table_id).await.unwrap().available_seats, 0);

        let result = coordinator.create_reservation(table_id, "Oli", 1).await;
        assert!(matches!(
            result,
            Err(CoreError::InsufficientSeats { requested: 1, available: 0, .. })
        ));
        let table = coordinator.get_table(table_id).await.unwrap();
        assert_eq!(table.available_seats, 0);
        assert!(table.is_balanced());
        assert_eq!(coordinator.list_reservations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_arrival_resize_down() {
        let (store, coordinator) = setup();
        let table_id = coordinator.create_table(10).await.unwrap();
        coordinator.create_reservation(table_id, "Tom", 10).await.unwrap();

        let view = coordinator.record_arrival("Tom", 2).await.unwrap();
        assert_eq!(view.status, ReservationStatus::Attended);
        assert_eq!(view.accompanying_guests, 2);
        assert!(view.arrival_time.is_some());

        let table = coordinator.get_table(table_id).await.unwrap();
        assert_eq!(table.available_seats, 8);
        assert_eq!(table.booked_seats, 2);
        assert_eq!(status_of(&store, "Tom").await, ReservationStatus::Attended);
    }

    #[tokio::test]
    async fn test_departure_releases_all_seats() {
        let (store, coordinator) = setup();
        let table_id = coordinator.create_table(10).await.unwrap();
        coordinator.create_reservation(table_id, "Tom", 10).await.unwrap();
        coordinator.record_arrival("Tom", 2).await.unwrap();

        coordinator.record_departure("Tom").await.unwrap();

        let table = coordinator.get_table(table_id).await.unwrap();
        assert_eq!(table.available_seats, 10);
        assert_eq!(table.booked_seats, 0);
        assert_eq!(coordinator.total_empty_seats().await.unwrap(), 10);
        assert_eq!(status_of(&store, "Tom").await, ReservationStatus::Archived);
        assert!(coordinator.list_attended().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_arrival_with_same_party_keeps_counts() {
        let (_store, coordinator) = setup();
        let table_id = coordinator.create_table(6).await.unwrap();
        coordinator.create_reservation(table_id, "Ada", 4).await.unwrap();

        let view = coordinator.record_arrival("Ada", 4).await.unwrap();
        assert_eq!(view.status, ReservationStatus::Attended);

        let table = coordinator.get_table(table_id).await.unwrap();
        assert_eq!(table.booked_seats, 4);
        assert_eq!(table.available_seats, 2);

        let arrived = coordinator.list_attended().await.unwrap();
        assert_eq!(arrived.len(), 1);
        assert_eq!(arrived[0].accompanying_guests, 4);
        assert!(arrived[0].time_arrived.is_some());
    }

    #[tokio::test]
    async fn test_arrival_with_larger_party_consumes_delta() {
        let (_store, coordinator) = setup();
        let table_id = coordinator.create_table(6).await.unwrap();
        coordinator.create_reservation(table_id, "Ada", 2).await.unwrap();

        coordinator.record_arrival("Ada", 5).await.unwrap();

        let table = coordinator.get_table(table_id).await.unwrap();
        assert_eq!(table.booked_seats, 5);
        assert_eq!(table.available_seats, 1);
    }

    #[tokio::test]
    async fn test_arrival_beyond_capacity_is_rejected_without_changes() {
        let (store, coordinator) = setup();
        let table_id = coordinator.create_table(6).await.unwrap();
        coordinator.create_reservation(table_id, "Ada", 2).await.unwrap();
        coordinator.create_reservation(table_id, "Bo", 3).await.unwrap();

        let result = coordinator.record_arrival("Ada", 4).await;
        assert!(matches!(
            result,
            Err(CoreError::InsufficientSeats { requested: 2, available: 1, .. })
        ));

        let table = coordinator.get_table(table_id).await.unwrap();
        assert_eq!(table.booked_seats, 5);
        assert_eq!(table.available_seats, 1);
        assert_eq!(status_of(&store, "Ada").await, ReservationStatus::Upcoming);
    }

    #[tokio::test]
    async fn test_departed_guest_cannot_be_touched_again() {
        let (_store, coordinator) = setup();
        let table_id = coordinator.create_table(4).await.unwrap();
        coordinator.create_reservation(table_id, "Ada", 3).await.unwrap();
        coordinator.record_departure("Ada").await.unwrap();

        assert!(matches!(coordinator.record_departure("Ada").await, Err(CoreError::NotFound(_))));
        assert!(matches!(coordinator.record_arrival("Ada", 1).await, Err(CoreError::NotFound(_))));
        assert_eq!(coordinator.get_table(table_id).await.unwrap().available_seats, 4);
    }

    #[tokio::test]
    async fn test_unknown_guest_and_table_are_not_found() {
        let (_store, coordinator) = setup();
        assert!(matches!(coordinator.record_arrival("Nobody", 2).await, Err(CoreError::NotFound(_))));
        assert!(matches!(coordinator.record_departure("Nobody").await, Err(CoreError::NotFound(_))));
        assert!(matches!(
            coordinator.create_reservation(Uuid::new_v4(), "Ada", 2).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(coordinator.list_reservations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_active_name_is_rejected() {
        let (_store, coordinator) = setup();
        let first = coordinator.create_table(4).await.unwrap();
        let second = coordinator.create_table(4).await.unwrap();
        coordinator.create_reservation(first, "Ada", 2).await.unwrap();

        let result = coordinator.create_reservation(second, "Ada", 2).await;
        assert!(matches!(result, Err(CoreError::DuplicateGuest(_))));
        assert_eq!(coordinator.get_table(second).await.unwrap().available_seats, 4);

        // Name is free again once the first booking is archived.
        coordinator.record_departure("Ada").await.unwrap();
        coordinator.create_reservation(second, "Ada", 2).await.unwrap();
        assert_eq!(coordinator.get_table(second).await.unwrap().available_seats, 2);
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back_everything() {
        let (store, coordinator) = setup();
        let table_id = coordinator.create_table(5).await.unwrap();
        coordinator.create_reservation(table_id, "Ada", 2).await.unwrap();

        store.set_commit_failure(true);
        assert!(matches!(
            coordinator.create_reservation(table_id, "Bo", 2).await,
            Err(CoreError::Storage(_))
        ));
        assert!(matches!(coordinator.record_arrival("Ada", 1).await, Err(CoreError::Storage(_))));
        assert!(matches!(coordinator.record_departure("Ada").await, Err(CoreError::Storage(_))));
        store.set_commit_failure(false);

        let table = coordinator.get_table(table_id).await.unwrap();
        assert_eq!(table.booked_seats, 2);
        assert_eq!(table.available_seats, 3);
        assert_eq!(coordinator.list_reservations().await.unwrap().len(), 1);
        assert_eq!(status_of(&store, "Ada").await, ReservationStatus::Upcoming);
    }

    #[tokio::test]
    async fn test_non_positive_inputs_are_rejected() {
        let (_store, coordinator) = setup();
        assert!(matches!(coordinator.create_table(0).await, Err(CoreError::ValidationError(_))));

        let table_id = coordinator.create_table(3).await.unwrap();
        assert!(matches!(
            coordinator.create_reservation(table_id, "Ada", 0).await,
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            coordinator.create_reservation(table_id, " ", 1).await,
            Err(CoreError::ValidationError(_))
        ));
        coordinator.create_reservation(table_id, "Ada", 1).await.unwrap();
        assert!(matches!(coordinator.record_arrival("Ada", -1).await, Err(CoreError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_empty_system_aggregates() {
        let (_store, coordinator) = setup();
        assert!(coordinator.list_reservations().await.unwrap().is_empty());
        assert_eq!(coordinator.total_empty_seats().await.unwrap(), 0);

        coordinator.create_table(4).await.unwrap();
        coordinator.create_table(6).await.unwrap();
        assert_eq!(coordinator.total_empty_seats().await.unwrap(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_never_overbook() {
        let (store, coordinator) = setup();
        let table_id = coordinator.create_table(10).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator.create_reservation(table_id, &format!("guest-{}", i), 3).await
            }));
        }

        let mut booked = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => booked += 1,
                Err(CoreError::InsufficientSeats { .. }) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(booked, 3);
        let table = coordinator.get_table(table_id).await.unwrap();
        assert!(table.is_balanced());
        assert_eq!(table.available_seats, 1);

        let held: i32 = store
            .reservations()
            .await
            .iter()
            .filter(|r| r.table_id == table_id && r.status.holds_seats())
            .map(|r| r.accompanying_guests)
            .sum();
        assert_eq!(held, table.booked_seats);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_arrivals_keep_ledger_exact() {
        let (store, coordinator) = setup();
        let table_id = coordinator.create_table(12).await.unwrap();
        for i in 0..6 {
            coordinator.create_reservation(table_id, &format!("guest-{}", i), 1).await.unwrap();
        }

        // Every guest tries to grow to 3; only the free seats can be handed out.
        let mut handles = Vec::new();
        for i in 0..6 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator.record_arrival(&format!("guest-{}", i), 3).await
            }));
        }
        for handle in handles {
            let _ = handle.await.unwrap();
        }

        let table = coordinator.get_table(table_id).await.unwrap();
        assert!(table.is_balanced());
        let held: i32 = store
            .reservations()
            .await
            .iter()
            .filter(|r| r.status.holds_seats())
            .map(|r| r.accompanying_guests)
            .sum();
        assert_eq!(held, table.booked_seats);
        assert!(held <= table.capacity);
        assert_eq!(table.available_seats, 0);
    }
}

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use seatkeeper_core::{ActiveReservation, ArrivedGuest, GuestListEntry, Reservation, ReservationStatus};

#[derive(sqlx::FromRow)]
pub(crate) struct ActiveRow {
    pub id: Uuid,
    pub table_id: Uuid,
    pub accompanying_guests: i32,
    pub status: String,
    pub arrival_time: Option<DateTime<Utc>>,
}

impl TryFrom<ActiveRow> for ActiveReservation {
    type Error = String;

    fn try_from(row: ActiveRow) -> Result<Self, Self::Error> {
        Ok(ActiveReservation {
            id: row.id,
            table_id: row.table_id,
            accompanying_guests: row.accompanying_guests,
            status: row.status.parse()?,
            arrival_time: row.arrival_time,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GuestListRow {
    table_id: Uuid,
    name: String,
    accompanying_guests: i32,
}

#[derive(sqlx::FromRow)]
struct ArrivedRow {
    name: String,
    accompanying_guests: i32,
    arrival_time: Option<DateTime<Utc>>,
}

/// Queries over the `reservations` relation.
pub struct ReservationRepository;

impl ReservationRepository {
    pub async fn insert(conn: &mut PgConnection, reservation: &Reservation) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO reservations (id, table_id, name, accompanying_guests, status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.table_id)
        .bind(&reservation.name)
        .bind(reservation.accompanying_guests)
        .bind(reservation.status.as_str())
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Locks the live reservation for `name`, if any.
    pub(crate) async fn find_active_by_name(
        conn: &mut PgConnection,
        name: &str,
    ) -> Result<Option<ActiveRow>, sqlx::Error> {
        sqlx::query_as::<_, ActiveRow>(
            r#"
            SELECT id, table_id, accompanying_guests, status, arrival_time
            FROM reservations
            WHERE name = $1 AND status <> $2
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(name)
        .bind(ReservationStatus::Archived.as_str())
        .fetch_optional(conn)
        .await
    }

    pub async fn mark_attended(
        conn: &mut PgConnection,
        reservation_id: Uuid,
        party_size: i32,
        arrived_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET accompanying_guests = $1, status = $2, arrival_time = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(party_size)
        .bind(ReservationStatus::Attended.as_str())
        .bind(arrived_at)
        .bind(reservation_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_attended_no_resize(
        conn: &mut PgConnection,
        reservation_id: Uuid,
        arrived_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reservations SET status = $1, arrival_time = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(ReservationStatus::Attended.as_str())
        .bind(arrived_at)
        .bind(reservation_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_archived(
        conn: &mut PgConnection,
        reservation_id: Uuid,
        final_party_size: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET accompanying_guests = $1, status = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(final_party_size)
        .bind(ReservationStatus::Archived.as_str())
        .bind(reservation_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<GuestListEntry>, sqlx::Error> {
        let rows = sqlx::query_as::<_, GuestListRow>(
            "SELECT table_id, name, accompanying_guests FROM reservations ORDER BY created_at, id",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| GuestListEntry {
                table_id: row.table_id,
                name: row.name,
                accompanying_guests: row.accompanying_guests,
            })
            .collect())
    }

    pub async fn list_attended(pool: &PgPool) -> Result<Vec<ArrivedGuest>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ArrivedRow>(
            r#"
            SELECT name, accompanying_guests, arrival_time
            FROM reservations
            WHERE status = $1
            ORDER BY arrival_time, id
            "#,
        )
        .bind(ReservationStatus::Attended.as_str())
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ArrivedGuest {
                name: row.name,
                accompanying_guests: row.accompanying_guests,
                time_arrived: row.arrival_time,
            })
            .collect())
    }
}

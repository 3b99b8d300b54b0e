use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use seatkeeper_core::Table;

#[derive(sqlx::FromRow)]
struct TableRow {
    id: Uuid,
    capacity: i32,
    booked_seats: i32,
    available_seats: i32,
}

impl From<TableRow> for Table {
    fn from(row: TableRow) -> Self {
        Table {
            id: row.id,
            capacity: row.capacity,
            booked_seats: row.booked_seats,
            available_seats: row.available_seats,
        }
    }
}

/// Queries over the `tables` relation.
pub struct TableRepository;

impl TableRepository {
    pub async fn insert(pool: &PgPool, table: &Table) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tables (id, capacity, booked_seats, available_seats)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(table.id)
        .bind(table.capacity)
        .bind(table.booked_seats)
        .bind(table.available_seats)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn fetch(pool: &PgPool, table_id: Uuid) -> Result<Option<Table>, sqlx::Error> {
        let row = sqlx::query_as::<_, TableRow>(
            "SELECT id, capacity, booked_seats, available_seats FROM tables WHERE id = $1",
        )
        .bind(table_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Table::from))
    }

    /// Reads free seats and holds the row lock until the surrounding transaction ends.
    pub async fn lock_available_seats(
        conn: &mut PgConnection,
        table_id: Uuid,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>("SELECT available_seats FROM tables WHERE id = $1 FOR UPDATE")
            .bind(table_id)
            .fetch_optional(conn)
            .await
    }

    /// Returns the number of rows touched; zero means the table does not exist.
    pub async fn adjust_seats(
        conn: &mut PgConnection,
        table_id: Uuid,
        delta: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tables
            SET booked_seats = booked_seats + $1, available_seats = available_seats - $1
            WHERE id = $2
            "#,
        )
        .bind(delta)
        .bind(table_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn sum_available_seats(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(available_seats), 0)::BIGINT FROM tables")
            .fetch_one(pool)
            .await
    }
}

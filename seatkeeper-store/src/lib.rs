pub mod app_config;
pub mod database;
pub mod table_repo;
pub mod reservation_repo;
pub mod seating_store;

pub use database::DbClient;
pub use table_repo::TableRepository;
pub use reservation_repo::ReservationRepository;
pub use seating_store::PgSeatingStore;

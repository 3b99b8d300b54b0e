use std::time::Duration;
use seatkeeper_core::SeatingCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: SeatingCoordinator,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(coordinator: SeatingCoordinator, request_timeout: Duration) -> Self {
        Self { coordinator, request_timeout }
    }
}

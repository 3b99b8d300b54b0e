use axum::{
    http::{Method, StatusCode},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod guests;
pub mod state;
pub mod tables;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    // A request that outlives the timeout is dropped together with its open
    // transaction, which rolls back.
    let timeout = TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, state.request_timeout);

    Router::new()
        .merge(tables::routes())
        .merge(guests::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(timeout)
                .layer(cors),
        )
        .with_state(state)
}

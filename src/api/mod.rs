//! HTTP surface over the store and the refresh pipeline

pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use server::run_server;
pub use state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/countries/refresh", post(handlers::refresh_countries))
        .route("/countries", get(handlers::list_countries))
        // Static segment wins over the :name capture
        .route("/countries/image", get(handlers::summary_image))
        .route(
            "/countries/:name",
            get(handlers::get_country).delete(handlers::delete_country),
        )
        .route("/status", get(handlers::status))
        .with_state(state)
}

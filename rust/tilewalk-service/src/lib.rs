use axum::routing::{get, post};
use axum::Router;

pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod state;

pub use config::Config;
pub use errors::AppError;
pub use state::{AppState, Sources, WorldSnapshot};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/readyz", get(routes::readyz))
        .route("/version", get(routes::version))
        .route("/find_path", post(routes::find_path))
        .route("/can_reach", post(routes::can_reach))
        .route("/compare_routes", post(routes::compare_routes))
        .route("/admin/reload", post(routes::reload))
        .with_state(state)
}

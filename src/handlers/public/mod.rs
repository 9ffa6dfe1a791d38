mod activate;
mod deactivate;
mod verify;

pub use activate::*;
pub use deactivate::*;
pub use verify::*;

use axum::{Json, Router, routing::{get, post}};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/activate", post(activate_license))
        .route("/verify", post(verify_license))
        .route("/deactivate", post(deactivate_license))
}

mod licenses;
mod stats;

pub use licenses::*;
pub use stats::*;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::db::AppState;
use crate::middleware::admin_auth;

/// Operator-only router. One authorization gate covers every route;
/// unauthorized callers get a uniform 401 regardless of path or payload.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/licenses", post(create_license))
        .route("/admin/licenses", get(list_licenses))
        .route("/admin/licenses/batch", post(create_license_batch))
        .route("/admin/licenses/{key}", get(inspect_license))
        .route("/admin/licenses/{key}/suspend", post(suspend_license))
        .route("/admin/licenses/{key}/resume", post(resume_license))
        .route("/admin/licenses/{key}/extend", post(extend_license))
        .route("/admin/stats", get(license_stats))
        .layer(middleware::from_fn_with_state(state, admin_auth))
}

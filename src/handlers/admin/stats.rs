use std::collections::BTreeMap;

use axum::extract::State;
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total: i64,
    pub active: i64,
    pub used: i64,
    pub expired: i64,
    pub by_plan: BTreeMap<String, i64>,
}

/// GET /admin/stats
///
/// Expiry is evaluated at query time against the current clock.
pub async fn license_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let conn = state.db.get()?;
    let now = queries::now();

    let counts = queries::count_licenses(&conn, now)?;
    let by_plan = queries::count_licenses_by_plan(&conn)?.into_iter().collect();

    Ok(Json(StatsResponse {
        total: counts.total,
        active: counts.active,
        used: counts.used,
        expired: counts.expired,
        by_plan,
    }))
}

use axum::extract::{Extension, State};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path, Query};
use crate::keygen;
use crate::lifecycle;
use crate::middleware::AdminContext;
use crate::models::{ActivationLogEntry, License, Plan};

const SECONDS_PER_DAY: i64 = 86_400;
const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;
const MAX_BATCH_SIZE: usize = 1000;

/// Status glyphs matching the operator channel's rendering:
/// active/suspended, used/unused, and a clock when expired.
fn status_glyphs(license: &License, now: i64) -> String {
    let mut s = String::new();
    s.push_str(if license.active { "🟢" } else { "🔴" });
    s.push_str(if license.used { "✅" } else { "⚪" });
    if license.expired(now) {
        s.push_str("⏰");
    }
    s
}

#[derive(Debug, Deserialize)]
pub struct CreateLicenseRequest {
    pub days: i64,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LicenseCreated {
    pub license_key: String,
    pub plan: Plan,
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_label: Option<String>,
}

/// POST /admin/licenses
pub async fn create_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Json(req): Json<CreateLicenseRequest>,
) -> Result<Json<LicenseCreated>> {
    if req.days < 1 {
        return Err(AppError::BadRequest("days must be at least 1".into()));
    }

    let license = lifecycle::create(&state, req.days, req.label.as_deref(), Some(&ctx.operator))?;

    tracing::info!(
        operator = %ctx.operator,
        key = %license.key,
        plan = license.plan.as_str(),
        days = req.days,
        "License created"
    );

    Ok(Json(LicenseCreated {
        license_key: license.key,
        plan: license.plan,
        expires_at: license.expires_at,
        owner_label: license.owner_label,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    pub count: usize,
    pub days: i64,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchCreated {
    pub count: usize,
    pub plan: Plan,
    pub license_keys: Vec<String>,
}

/// POST /admin/licenses/batch
pub async fn create_license_batch(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Json(req): Json<CreateBatchRequest>,
) -> Result<Json<BatchCreated>> {
    if req.days < 1 {
        return Err(AppError::BadRequest("days must be at least 1".into()));
    }
    if req.count < 1 || req.count > MAX_BATCH_SIZE {
        return Err(AppError::BadRequest(format!(
            "count must be between 1 and {}",
            MAX_BATCH_SIZE
        )));
    }

    let licenses = lifecycle::create_batch(
        &state,
        req.count,
        req.days,
        req.label.as_deref(),
        Some(&ctx.operator),
    )?;

    tracing::info!(
        operator = %ctx.operator,
        count = licenses.len(),
        days = req.days,
        "License batch created"
    );

    Ok(Json(BatchCreated {
        count: licenses.len(),
        plan: Plan::from_days(req.days),
        license_keys: licenses.into_iter().map(|l| l.key).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LicenseSummary {
    pub license_key: String,
    pub plan: Plan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_label: Option<String>,
    pub expires_at: i64,
    pub active: bool,
    pub used: bool,
    pub expired: bool,
    pub status: String,
}

/// GET /admin/licenses?limit=20
pub async fn list_licenses(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LicenseSummary>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

    let conn = state.db.get()?;
    let now = queries::now();
    let licenses = queries::list_licenses(&conn, limit)?;

    let summaries = licenses
        .into_iter()
        .map(|l| {
            let status = status_glyphs(&l, now);
            LicenseSummary {
                expired: l.expired(now),
                active: l.active,
                used: l.used,
                license_key: l.key,
                plan: l.plan,
                owner_label: l.owner_label,
                expires_at: l.expires_at,
                status,
            }
        })
        .collect();

    Ok(Json(summaries))
}

#[derive(Debug, Serialize)]
pub struct LicenseDetail {
    #[serde(flatten)]
    pub license: License,
    pub expired: bool,
    /// Whole days until expiry; negative once expired
    pub days_left: i64,
    pub recent_activity: Vec<ActivationLogEntry>,
}

/// GET /admin/licenses/{key}
///
/// Full record plus the last 5 activation log entries.
pub async fn inspect_license(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<LicenseDetail>> {
    let key = keygen::normalize(&key);

    let conn = state.db.get()?;
    let now = queries::now();
    let license = queries::get_license(&conn, &key)?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    let log_conn = state.logs.get()?;
    let recent_activity = queries::recent_logs(&log_conn, &key, 5)?;

    Ok(Json(LicenseDetail {
        expired: license.expired(now),
        days_left: (license.expires_at - now).div_euclid(SECONDS_PER_DAY),
        license,
        recent_activity,
    }))
}

/// POST /admin/licenses/{key}/suspend
pub async fn suspend_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(key): Path<String>,
) -> Result<Json<License>> {
    let key = keygen::normalize(&key);
    let license = lifecycle::set_active(&state, &key, false)?;

    tracing::info!(operator = %ctx.operator, key = %license.key, "License suspended");

    Ok(Json(license))
}

/// POST /admin/licenses/{key}/resume
///
/// Re-enables a suspended key. Does not touch expiry: resuming an expired
/// key leaves it expired.
pub async fn resume_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(key): Path<String>,
) -> Result<Json<License>> {
    let key = keygen::normalize(&key);
    let license = lifecycle::set_active(&state, &key, true)?;

    tracing::info!(operator = %ctx.operator, key = %license.key, "License resumed");

    Ok(Json(license))
}

#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    pub days: i64,
}

/// POST /admin/licenses/{key}/extend
pub async fn extend_license(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    Path(key): Path<String>,
    Json(req): Json<ExtendRequest>,
) -> Result<Json<License>> {
    if req.days < 1 {
        return Err(AppError::BadRequest("days must be at least 1".into()));
    }

    let key = keygen::normalize(&key);
    let license = lifecycle::extend(&state, &key, req.days)?;

    tracing::info!(
        operator = %ctx.operator,
        key = %license.key,
        days = req.days,
        expires_at = license.expires_at,
        "License extended"
    );

    Ok(Json(license))
}

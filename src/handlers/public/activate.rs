use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::keygen;
use crate::lifecycle;
use crate::models::Plan;
use crate::util::extract_source_addr;

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub license_key: String,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct ActivateResponse {
    pub success: bool,
    pub message: &'static str,
    pub expires_at: i64,
    pub plan: Plan,
    pub user_name: Option<String>,
}

/// POST /activate
///
/// Binds the license to the calling device. Distinct failures map to
/// distinct statuses: 400 missing fields or unknown key, 423 suspended,
/// 410 expired, 403 bound to another device.
pub async fn activate_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ActivateRequest>,
) -> Result<Json<ActivateResponse>> {
    if req.license_key.trim().is_empty() || req.device_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "license_key and device_id are required".into(),
        ));
    }

    let key = keygen::normalize(&req.license_key);
    let source = extract_source_addr(&headers);

    let license = lifecycle::activate(&state, &key, &req.device_id, source.as_deref())
        .map_err(|e| match e {
            // The client surface never distinguishes "never existed" from
            // any other bad-key input.
            AppError::NotFound(_) => AppError::BadRequest("Invalid license key".into()),
            other => other,
        })?;

    Ok(Json(ActivateResponse {
        success: true,
        message: "Activation successful",
        expires_at: license.expires_at,
        plan: license.plan,
        user_name: license.owner_label,
    }))
}

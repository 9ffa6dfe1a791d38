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
pub struct VerifyRequest {
    pub license_key: String,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

/// POST /verify
///
/// Periodic entitlement check from an already-activated device. Always
/// answers 200 with the `is_active` boolean; verification outcomes never
/// use HTTP error codes, only infrastructure faults do.
pub async fn verify_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let key = keygen::normalize(&req.license_key);
    let source = extract_source_addr(&headers);

    match lifecycle::verify(&state, &key, &req.device_id, source.as_deref()) {
        Ok(license) => Ok(Json(VerifyResponse {
            is_active: true,
            message: None,
            expires_at: Some(license.expires_at),
            plan: Some(license.plan),
        })),
        Err(e) => {
            let message = match e {
                AppError::NotFound(_) => "Unknown key",
                AppError::DeviceMismatch => "Device not authorized",
                AppError::Suspended => "Suspended",
                AppError::Expired => "Expired",
                other => return Err(other),
            };
            Ok(Json(VerifyResponse {
                is_active: false,
                message: Some(message),
                expires_at: None,
                plan: None,
            }))
        }
    }
}

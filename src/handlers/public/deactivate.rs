use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::Result;
use crate::extractors::Json;
use crate::keygen;
use crate::lifecycle;
use crate::util::extract_source_addr;

#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    pub license_key: String,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeactivateResponse {
    pub success: bool,
}

/// POST /deactivate
///
/// Releases the device binding so the customer can move the license to a
/// new machine. Always reports success; a request from a device other than
/// the bound one changes nothing.
pub async fn deactivate_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DeactivateRequest>,
) -> Result<Json<DeactivateResponse>> {
    let key = keygen::normalize(&req.license_key);
    let source = extract_source_addr(&headers);

    lifecycle::deactivate(&state, &key, &req.device_id, source.as_deref())?;

    Ok(Json(DeactivateResponse { success: true }))
}

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, params};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{LICENSE_COLS, LOG_COLS, query_all, query_one};

pub fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Licenses ============

/// Insert a new license record.
///
/// A primary-key collision surfaces as `DuplicateKey` so callers can
/// regenerate and retry; any other database failure propagates as-is.
pub fn insert_license(conn: &Connection, license: &License) -> Result<()> {
    let result = conn.execute(
        "INSERT INTO licenses (license_key, plan, device_id, owner_label, created_by, created_at, activated_at, expires_at, is_active, is_used)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &license.key,
            license.plan.as_str(),
            &license.device_id,
            &license.owner_label,
            &license.created_by,
            license.created_at,
            license.activated_at,
            license.expires_at,
            license.active,
            license.used,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == ErrorCode::ConstraintViolation =>
        {
            Err(AppError::DuplicateKey(license.key.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_license(conn: &Connection, key: &str) -> Result<Option<License>> {
    query_one(
        conn,
        &format!("SELECT {} FROM licenses WHERE license_key = ?1", LICENSE_COLS),
        params![key],
    )
}

/// List licenses, most recently created first.
pub fn list_licenses(conn: &Connection, limit: i64) -> Result<Vec<License>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM licenses ORDER BY created_at DESC, license_key LIMIT ?1",
            LICENSE_COLS
        ),
        params![limit],
    )
}

/// Aggregate counts over all licenses.
///
/// `expired` is evaluated against the supplied clock at query time; it is
/// not a stored flag.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LicenseCounts {
    pub total: i64,
    pub active: i64,
    pub used: i64,
    pub expired: i64,
}

pub fn count_licenses(conn: &Connection, now: i64) -> Result<LicenseCounts> {
    conn.query_row(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE is_active = 1),
                COUNT(*) FILTER (WHERE is_used = 1),
                COUNT(*) FILTER (WHERE expires_at <= ?1)
         FROM licenses",
        params![now],
        |row| {
            Ok(LicenseCounts {
                total: row.get(0)?,
                active: row.get(1)?,
                used: row.get(2)?,
                expired: row.get(3)?,
            })
        },
    )
    .map_err(Into::into)
}

pub fn count_licenses_by_plan(conn: &Connection) -> Result<Vec<(String, i64)>> {
    let mut stmt =
        conn.prepare("SELECT plan, COUNT(*) FROM licenses GROUP BY plan ORDER BY plan")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ Activation log ============

/// Append one entry to the activation log.
///
/// The log lives in its own database; callers treat failures here as
/// reportable but non-fatal to the license operation they accompany.
pub fn append_log(
    conn: &Connection,
    license_key: &str,
    device_id: Option<&str>,
    action: LogAction,
    source_addr: Option<&str>,
) -> Result<ActivationLogEntry> {
    let entry = ActivationLogEntry {
        id: gen_id(),
        license_key: license_key.to_string(),
        device_id: device_id.map(String::from),
        action,
        source_addr: source_addr.map(String::from),
        timestamp: now(),
    };

    conn.execute(
        "INSERT INTO activation_logs (id, license_key, device_id, action, source_addr, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            &entry.id,
            &entry.license_key,
            &entry.device_id,
            entry.action.as_str(),
            &entry.source_addr,
            entry.timestamp,
        ],
    )?;

    Ok(entry)
}

/// Most recent log entries for one key, newest first.
pub fn recent_logs(conn: &Connection, license_key: &str, limit: i64) -> Result<Vec<ActivationLogEntry>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM activation_logs WHERE license_key = ?1 ORDER BY timestamp DESC, id LIMIT ?2",
            LOG_COLS
        ),
        params![license_key, limit],
    )
}

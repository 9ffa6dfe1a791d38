//! License lifecycle operations.
//!
//! Every mutating operation wraps its read-check-write in an IMMEDIATE
//! transaction: the write lock is taken up front, so two concurrent
//! activations of the same key resolve deterministically. One binds its
//! device; the other observes the committed binding and fails with
//! `DeviceMismatch`. Suspension and expiry are independent flags on the
//! record, not exclusive states.
//!
//! One validity rule governs both activation and verification: the record
//! is administratively active, not yet expired, and either unbound or bound
//! to the requesting device. The checks run in a fixed order so each caller
//! sees the same failure for the same state.
//!
//! Activation log appends happen after the record commit on a separate
//! database; a failed append is reported but never rolls back the license
//! mutation.

use rusqlite::{TransactionBehavior, params};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::keygen;
use crate::models::{License, LogAction, Plan};

const SECONDS_PER_DAY: i64 = 86_400;

/// Key collisions tolerated per create before giving up. With 60 bits of
/// key entropy a single collision is already store corruption territory.
const MAX_KEY_ATTEMPTS: u32 = 8;

/// Mint a new license valid for `days` from now.
///
/// The plan label is derived from the duration once, here, and never
/// revalidated. Uniqueness is enforced by the store's primary key; on a
/// collision the key is regenerated.
pub fn create(
    state: &AppState,
    days: i64,
    owner_label: Option<&str>,
    created_by: Option<&str>,
) -> Result<License> {
    let conn = state.db.get()?;
    let now = queries::now();
    let plan = Plan::from_days(days);

    for _ in 0..MAX_KEY_ATTEMPTS {
        let license = License {
            key: keygen::generate(&state.key_prefix),
            plan,
            device_id: None,
            owner_label: owner_label.map(String::from),
            created_by: created_by.map(String::from),
            created_at: now,
            activated_at: None,
            expires_at: now + days * SECONDS_PER_DAY,
            active: true,
            used: false,
        };

        match queries::insert_license(&conn, &license) {
            Ok(()) => return Ok(license),
            Err(AppError::DuplicateKey(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(AppError::Internal(format!(
        "key generation exhausted after {} collisions",
        MAX_KEY_ATTEMPTS
    )))
}

/// Mint `count` licenses with identical duration and label.
///
/// Uniqueness inside the batch and against all existing keys comes from the
/// same insert-retry loop as single creation.
pub fn create_batch(
    state: &AppState,
    count: usize,
    days: i64,
    owner_label: Option<&str>,
    created_by: Option<&str>,
) -> Result<Vec<License>> {
    let mut licenses = Vec::with_capacity(count);
    for _ in 0..count {
        licenses.push(create(state, days, owner_label, created_by)?);
    }
    Ok(licenses)
}

/// Bind a device to a key.
///
/// This is the only operation that binds; the binding is permanent until an
/// explicit deactivation. Re-activation from the already-bound device is
/// idempotent and keeps the original activation timestamp.
pub fn activate(
    state: &AppState,
    key: &str,
    device_id: &str,
    source_addr: Option<&str>,
) -> Result<License> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = queries::now();

    let mut license = queries::get_license(&tx, key)?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    if !license.active {
        return Err(AppError::Suspended);
    }
    if license.expired(now) {
        return Err(AppError::Expired);
    }
    if license.used && license.device_id.as_deref() != Some(device_id) {
        return Err(AppError::DeviceMismatch);
    }

    tx.execute(
        "UPDATE licenses
         SET device_id = ?1, is_used = 1, activated_at = COALESCE(activated_at, ?2)
         WHERE license_key = ?3",
        params![device_id, now, key],
    )?;
    tx.commit()?;

    license.device_id = Some(device_id.to_string());
    license.used = true;
    license.activated_at = Some(license.activated_at.unwrap_or(now));

    log_action(state, key, Some(device_id), LogAction::Activate, source_addr);

    Ok(license)
}

/// Check that a key is currently usable from `device_id`.
///
/// Pure read: never mutates the record and never implicitly activates; an
/// unbound key fails with `DeviceMismatch` just like a key bound elsewhere.
pub fn verify(
    state: &AppState,
    key: &str,
    device_id: &str,
    source_addr: Option<&str>,
) -> Result<License> {
    let conn = state.db.get()?;
    let now = queries::now();

    // Single-statement snapshot: only committed state is visible, so a
    // concurrent extension can never be observed half-applied.
    let license = queries::get_license(&conn, key)?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    if license.device_id.as_deref() != Some(device_id) {
        return Err(AppError::DeviceMismatch);
    }
    if !license.active {
        return Err(AppError::Suspended);
    }
    if license.expired(now) {
        return Err(AppError::Expired);
    }

    log_action(state, key, Some(device_id), LogAction::Verify, source_addr);

    Ok(license)
}

/// Release a key's device binding so it can be activated elsewhere.
///
/// Only the currently bound device may release the binding. A mismatched
/// request changes nothing and the caller cannot tell, but the attempt is
/// still logged for audit.
pub fn deactivate(
    state: &AppState,
    key: &str,
    device_id: &str,
    source_addr: Option<&str>,
) -> Result<()> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "UPDATE licenses SET device_id = NULL, is_used = 0
         WHERE license_key = ?1 AND device_id = ?2",
        params![key, device_id],
    )?;
    tx.commit()?;

    log_action(state, key, Some(device_id), LogAction::Deactivate, source_addr);

    Ok(())
}

/// Flip the administrative flag. Suspending wins over everything in the
/// validity check; resuming an expired key does not un-expire it.
pub fn set_active(state: &AppState, key: &str, active: bool) -> Result<License> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut license = queries::get_license(&tx, key)?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    tx.execute(
        "UPDATE licenses SET is_active = ?1 WHERE license_key = ?2",
        params![active as i64, key],
    )?;
    tx.commit()?;

    license.active = active;
    Ok(license)
}

/// Push the expiry out by `days`.
///
/// An already-expired key extends from now rather than from the stale
/// expiry, so "extend by 30 days" always yields a usable key.
pub fn extend(state: &AppState, key: &str, days: i64) -> Result<License> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now = queries::now();

    let mut license = queries::get_license(&tx, key)?
        .ok_or_else(|| AppError::NotFound("License not found".into()))?;

    let new_expires_at = license.expires_at.max(now) + days * SECONDS_PER_DAY;

    tx.execute(
        "UPDATE licenses SET expires_at = ?1 WHERE license_key = ?2",
        params![new_expires_at, key],
    )?;
    tx.commit()?;

    license.expires_at = new_expires_at;
    Ok(license)
}

/// Best-effort activation log append; the license mutation it accompanies
/// has already committed and must not be affected by a log failure.
fn log_action(
    state: &AppState,
    key: &str,
    device_id: Option<&str>,
    action: LogAction,
    source_addr: Option<&str>,
) {
    let result = state
        .logs
        .get()
        .map_err(AppError::from)
        .and_then(|conn| queries::append_log(&conn, key, device_id, action, source_addr));

    if let Err(e) = result {
        tracing::warn!(
            "Failed to append {} log entry for {}: {}",
            action.as_str(),
            key,
            e
        );
    }
}

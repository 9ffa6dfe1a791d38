//! Row-to-model mapping shared by the query layer.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{Connection, OptionalExtension, Params, Row};

use crate::error::Result;
use crate::models::{ActivationLogEntry, License, LogAction, Plan};

/// Construct a model from one row of its canonical column list.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Run `sql` expecting zero or one row.
pub fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Run `sql` collecting every row.
pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, T::from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

/// Column order assumed by `License::from_row`.
pub const LICENSE_COLS: &str = "license_key, plan, device_id, owner_label, created_by, created_at, activated_at, expires_at, is_active, is_used";

/// Column order assumed by `ActivationLogEntry::from_row`.
pub const LOG_COLS: &str = "id, license_key, device_id, action, source_addr, timestamp";

// A stored value outside either enum means the table was written by
// something other than this service; surface it as a column error rather
// than panicking.
impl FromSql for Plan {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}

impl FromSql for LogAction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}

impl FromRow for License {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(License {
            key: row.get(0)?,
            plan: row.get(1)?,
            device_id: row.get(2)?,
            owner_label: row.get(3)?,
            created_by: row.get(4)?,
            created_at: row.get(5)?,
            activated_at: row.get(6)?,
            expires_at: row.get(7)?,
            active: row.get(8)?,
            used: row.get(9)?,
        })
    }
}

impl FromRow for ActivationLogEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ActivationLogEntry {
            id: row.get(0)?,
            license_key: row.get(1)?,
            device_id: row.get(2)?,
            action: row.get(3)?,
            source_addr: row.get(4)?,
            timestamp: row.get(5)?,
        })
    }
}

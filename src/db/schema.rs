use rusqlite::Connection;

/// Initialize the license database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Licenses, keyed by the key string itself (globally unique)
        -- is_active: administrative flag, independent of expiry
        -- is_used: set once a device binds, cleared only by deactivation
        CREATE TABLE IF NOT EXISTS licenses (
            license_key TEXT PRIMARY KEY,
            plan TEXT NOT NULL CHECK (plan IN ('trial', 'monthly', 'quarterly', 'yearly', 'lifetime')),
            device_id TEXT,
            owner_label TEXT,
            created_by TEXT,
            created_at INTEGER NOT NULL,
            activated_at INTEGER,
            expires_at INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_used INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_licenses_created ON licenses(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_licenses_plan ON licenses(plan);
        "#,
    )?;
    Ok(())
}

/// Initialize the activation log schema.
///
/// The log lives in its own database file and only ever appends, so it runs
/// in WAL mode with NORMAL syncing and a bounded journal.
pub fn init_log_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 1000;
        PRAGMA journal_size_limit = 67108864;

        CREATE TABLE IF NOT EXISTS activation_logs (
            id TEXT PRIMARY KEY,
            license_key TEXT NOT NULL,
            device_id TEXT,
            action TEXT NOT NULL CHECK (action IN ('activate', 'verify', 'deactivate')),
            source_addr TEXT,
            timestamp INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_activation_logs_key_time ON activation_logs(license_key, timestamp DESC);
        CREATE INDEX IF NOT EXISTS idx_activation_logs_time ON activation_logs(timestamp);
        "#,
    )?;
    Ok(())
}

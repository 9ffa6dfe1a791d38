mod schema;
pub mod from_row;
pub mod queries;

pub use schema::{init_db, init_log_db};

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by the client and admin listeners
#[derive(Clone)]
pub struct AppState {
    /// License table pool
    pub db: DbPool,
    /// Activation log pool (separate file to isolate append-only growth)
    pub logs: DbPool,
    /// Prefix for newly minted keys (e.g. "GNP")
    pub key_prefix: String,
    /// Operator allow-list for the admin surface
    pub admin_tokens: Arc<Vec<String>>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // Busy timeout makes concurrent IMMEDIATE transactions queue on the
    // write lock instead of failing with SQLITE_BUSY.
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));
    Pool::builder().max_size(10).build(manager)
}

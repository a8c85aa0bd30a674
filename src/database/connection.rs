use anyhow::{Context, Result};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction, TransactionBehavior};

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

const BUSY_TIMEOUT_MS: u32 = 5000;

pub fn create_pool(database_path: &str) -> Result<DbPool> {
    let manager = build_manager(database_path);
    build_pool(manager)
}

fn build_manager(path: &str) -> SqliteConnectionManager {
    SqliteConnectionManager::file(path).with_init(configure_connection)
}

fn build_pool(manager: SqliteConnectionManager) -> Result<DbPool> {
    r2d2::Pool::builder()
        .build(manager)
        .context("Failed to create database connection pool")
}

pub fn get_connection(pool: &DbPool) -> Result<DbConn> {
    pool.get()
        .context("Failed to get database connection from pool")
}

/// Per-connection pragmas. Foreign keys are off by default in SQLite.
pub fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"
    ))
}

/// Opens a write transaction that holds the database write lock from `BEGIN`,
/// so a read-then-write span cannot interleave with another writer.
pub fn begin_write(conn: &mut Connection) -> Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
        .context("Failed to begin write transaction")
}

/// Single-connection in-memory pool with the schema applied, for router tests.
#[cfg(test)]
pub fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory().with_init(configure_connection);
    let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
    let conn = pool.get().unwrap();
    super::setup::initialize_database(&conn).unwrap();
    drop(conn);
    pool
}

/// A throwaway SQLite file, removed on drop. Lets tests use several real
/// connections against one database.
#[cfg(test)]
pub struct TempDatabase {
    pub path: String,
}

#[cfg(test)]
impl TempDatabase {
    pub fn new() -> Self {
        let name = format!("wordle_plus_{:016x}.db", rand::random::<u64>());
        let path = std::env::temp_dir().join(name).to_string_lossy().into_owned();
        Self { path }
    }

    pub fn pool(&self) -> DbPool {
        super::setup::open_database(&self.path).unwrap()
    }
}

#[cfg(test)]
impl Drop for TempDatabase {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = std::fs::remove_file(format!("{}-journal", self.path));
    }
}

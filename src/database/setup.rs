use anyhow::{Context, Result};
use rusqlite::Connection;

use super::connection::{create_pool, get_connection, DbPool};

const TABLES_IN_DROP_ORDER: &[&str] = &[
    "notifications",
    "round_games",
    "rounds",
    "participations",
    "tournaments",
    "games",
    "classic_wordles",
    "players",
    "auth_tokens",
    "users",
];

/// Creates any missing tables. Safe to run on every start.
pub fn initialize_database(conn: &Connection) -> Result<()> {
    let schema_sql = include_str!("schema.sql");
    let statements = split_sql_statements(schema_sql);

    for (idx, statement) in statements.iter().enumerate() {
        execute_sql(conn, statement)
            .with_context(|| format!("Failed to execute statement {}", idx + 1))?;
    }

    log::info!("Database schema ready");
    Ok(())
}

pub fn reset_database(conn: &Connection) -> Result<()> {
    for table in TABLES_IN_DROP_ORDER {
        execute_sql(conn, &format!("DROP TABLE IF EXISTS {table}"))
            .with_context(|| format!("Failed to drop table {table}"))?;
    }

    initialize_database(conn)?;
    log::info!("Database schema reset successfully");
    Ok(())
}

/// Opens the pool for `path` and makes sure the schema exists.
pub fn open_database(path: &str) -> Result<DbPool> {
    let pool = create_pool(path)?;
    let conn = get_connection(&pool)?;
    initialize_database(&conn)?;
    drop(conn);
    Ok(pool)
}

pub fn reset_database_at(path: &str) -> Result<()> {
    let pool = create_pool(path)?;
    let conn = get_connection(&pool)?;
    reset_database(&conn)
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn execute_sql(conn: &Connection, sql: &str) -> Result<()> {
    conn.execute(sql, [])
        .context("Failed to execute SQL statement")
        .map(|_| ())
}

/// In-memory database with the full schema, for tests.
#[cfg(test)]
pub fn test_connection() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    super::connection::configure_connection(&mut conn).unwrap();
    initialize_database(&conn).unwrap();
    conn
}

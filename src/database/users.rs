use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{AuthToken, User, UserId};

pub fn insert_user(conn: &Connection, username: &str, created_at: DateTime<Utc>) -> Result<User> {
    let sql = "INSERT INTO users (username, created_at) VALUES (?1, ?2) RETURNING id, username, created_at";

    conn.query_row(sql, params![username, created_at], parse_user_row)
        .context("Failed to insert user")
}

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        created_at: row.get(2)?,
    })
}

pub fn find_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let sql = "SELECT id, username, created_at FROM users WHERE id = ?1";

    conn.query_row(sql, params![id], parse_user_row)
        .optional()
        .context("Failed to query user by id")
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let sql = "SELECT id, username, created_at FROM users WHERE username = ?1";

    conn.query_row(sql, params![username], parse_user_row)
        .optional()
        .context("Failed to query user by username")
}

/// Replaces any previous token of the user.
pub fn issue_token(
    conn: &Connection,
    user_id: UserId,
    key: &str,
    created_at: DateTime<Utc>,
) -> Result<AuthToken> {
    let sql = "INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)
               ON CONFLICT(user_id) DO UPDATE SET key = excluded.key, created_at = excluded.created_at
               RETURNING key, user_id, created_at";

    conn.query_row(sql, params![key, user_id, created_at], parse_token_row)
        .context("Failed to issue auth token")
}

fn parse_token_row(row: &rusqlite::Row) -> rusqlite::Result<AuthToken> {
    Ok(AuthToken {
        key: row.get(0)?,
        user_id: row.get(1)?,
        created_at: row.get(2)?,
    })
}

pub fn find_token(conn: &Connection, key: &str) -> Result<Option<AuthToken>> {
    let sql = "SELECT key, user_id, created_at FROM auth_tokens WHERE key = ?1";

    conn.query_row(sql, params![key], parse_token_row)
        .optional()
        .context("Failed to query auth token")
}

pub fn delete_token(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM auth_tokens WHERE key = ?1", params![key])
        .context("Failed to delete auth token")
        .map(|_| ())
}

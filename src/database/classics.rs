use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::models::{ClassicSession, PlayerId};

#[allow(clippy::too_many_arguments)]
pub fn insert_session(
    conn: &Connection,
    player_id: PlayerId,
    word: &str,
    time_consumed: i64,
    attempts: i64,
    xp_gained: i64,
    won: bool,
    played_at: DateTime<Utc>,
) -> Result<ClassicSession> {
    let sql = "INSERT INTO classic_wordles (player_id, word, time_consumed, attempts, xp_gained, won, played_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id, player_id, word, time_consumed, attempts, xp_gained, won, played_at";

    conn.query_row(
        sql,
        params![player_id, word, time_consumed, attempts, xp_gained, won, played_at],
        parse_session_row,
    )
    .context("Failed to insert classic session")
}

fn parse_session_row(row: &rusqlite::Row) -> rusqlite::Result<ClassicSession> {
    Ok(ClassicSession {
        id: row.get(0)?,
        player_id: row.get(1)?,
        word: row.get(2)?,
        time_consumed: row.get(3)?,
        attempts: row.get(4)?,
        xp_gained: row.get(5)?,
        won: row.get(6)?,
        played_at: row.get(7)?,
    })
}

pub fn list_recent_by_player(
    conn: &Connection,
    player_id: PlayerId,
    limit: usize,
) -> Result<Vec<ClassicSession>> {
    let sql = "SELECT id, player_id, word, time_consumed, attempts, xp_gained, won, played_at FROM classic_wordles WHERE player_id = ?1 ORDER BY played_at DESC, id DESC LIMIT ?2";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![player_id, limit as i64], parse_session_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

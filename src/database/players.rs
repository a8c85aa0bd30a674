use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Player, PlayerId, UserId};

const PLAYER_COLUMNS: &str =
    "p.id, p.user_id, u.username, p.wins, p.wins_pvp, p.wins_tournament, p.xp";

/// Increments applied to a player row in one statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDelta {
    pub wins: i64,
    pub wins_pvp: i64,
    pub wins_tournament: i64,
    pub xp: i64,
}

pub fn insert_player(conn: &Connection, user_id: UserId) -> Result<Player> {
    conn.execute("INSERT INTO players (user_id) VALUES (?1)", params![user_id])
        .context("Failed to insert new player")?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)?.context("Inserted player vanished")
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        wins: row.get(3)?,
        wins_pvp: row.get(4)?,
        wins_tournament: row.get(5)?,
        xp: row.get(6)?,
    })
}

pub fn find_by_id(conn: &Connection, id: PlayerId) -> Result<Option<Player>> {
    let sql = format!(
        "SELECT {PLAYER_COLUMNS} FROM players p JOIN users u ON u.id = p.user_id WHERE p.id = ?1"
    );

    conn.query_row(&sql, params![id], parse_player_row)
        .optional()
        .context("Failed to query player by id")
}

pub fn find_by_user_id(conn: &Connection, user_id: UserId) -> Result<Option<Player>> {
    let sql = format!(
        "SELECT {PLAYER_COLUMNS} FROM players p JOIN users u ON u.id = p.user_id WHERE p.user_id = ?1"
    );

    conn.query_row(&sql, params![user_id], parse_player_row)
        .optional()
        .context("Failed to query player by user id")
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<Player>> {
    let sql = format!(
        "SELECT {PLAYER_COLUMNS} FROM players p JOIN users u ON u.id = p.user_id WHERE u.username = ?1"
    );

    conn.query_row(&sql, params![username], parse_player_row)
        .optional()
        .context("Failed to query player by username")
}

pub fn list_leaderboard(conn: &Connection, limit: usize, offset: usize) -> Result<Vec<Player>> {
    let sql = format!(
        "SELECT {PLAYER_COLUMNS} FROM players p JOIN users u ON u.id = p.user_id
         ORDER BY p.xp DESC, p.wins DESC, p.id ASC LIMIT ?1 OFFSET ?2"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![limit as i64, offset as i64], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Adds `delta` to the player's counters. Returns false when the player does not exist.
pub fn apply_delta(conn: &Connection, player_id: PlayerId, delta: StatDelta) -> Result<bool> {
    let sql = "UPDATE players SET wins = wins + ?1, wins_pvp = wins_pvp + ?2,
               wins_tournament = wins_tournament + ?3, xp = xp + ?4 WHERE id = ?5";

    let changed = conn
        .execute(
            sql,
            params![
                delta.wins,
                delta.wins_pvp,
                delta.wins_tournament,
                delta.xp,
                player_id
            ],
        )
        .context("Failed to update player stats")?;

    Ok(changed == 1)
}

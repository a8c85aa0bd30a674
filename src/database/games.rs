use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Duel, DuelView, GameId, PlayerId, SideStats};
use crate::domain::duel::Side;

const GAME_COLUMNS: &str = "g.id, g.player1_id, g.player2_id, g.word, g.player1_time, g.player1_attempts, g.player1_xp, g.player2_time, g.player2_attempts, g.player2_xp, g.winner_id, g.is_tournament_game, g.created_at";

const VIEW_JOINS: &str = "FROM games g
    JOIN players p1 ON p1.id = g.player1_id JOIN users u1 ON u1.id = p1.user_id
    JOIN players p2 ON p2.id = g.player2_id JOIN users u2 ON u2.id = p2.user_id
    LEFT JOIN players pw ON pw.id = g.winner_id LEFT JOIN users uw ON uw.id = pw.user_id";

pub fn insert_duel(
    conn: &Connection,
    player1_id: PlayerId,
    player2_id: PlayerId,
    word: &str,
    player1: SideStats,
    is_tournament_game: bool,
    created_at: DateTime<Utc>,
) -> Result<Duel> {
    let sql = "INSERT INTO games (player1_id, player2_id, word, player1_time, player1_attempts, player1_xp, is_tournament_game, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

    conn.execute(
        sql,
        params![
            player1_id,
            player2_id,
            word,
            player1.time,
            player1.attempts,
            player1.xp,
            is_tournament_game,
            created_at
        ],
    )
    .context("Failed to insert game")?;

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)?.context("Inserted game vanished")
}

fn parse_game_row(row: &rusqlite::Row) -> rusqlite::Result<Duel> {
    Ok(Duel {
        id: row.get(0)?,
        player1_id: row.get(1)?,
        player2_id: row.get(2)?,
        word: row.get(3)?,
        player1: SideStats {
            time: row.get(4)?,
            attempts: row.get(5)?,
            xp: row.get(6)?,
        },
        player2: SideStats {
            time: row.get(7)?,
            attempts: row.get(8)?,
            xp: row.get(9)?,
        },
        winner_id: row.get(10)?,
        is_tournament_game: row.get(11)?,
        created_at: row.get(12)?,
    })
}

fn parse_view_row(row: &rusqlite::Row) -> rusqlite::Result<DuelView> {
    Ok(DuelView {
        duel: parse_game_row(row)?,
        player1_username: row.get(13)?,
        player2_username: row.get(14)?,
        winner_username: row.get(15)?,
    })
}

pub fn find_by_id(conn: &Connection, id: GameId) -> Result<Option<Duel>> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games g WHERE g.id = ?1");

    conn.query_row(&sql, params![id], parse_game_row)
        .optional()
        .context("Failed to query game by id")
}

pub fn find_view_by_id(conn: &Connection, id: GameId) -> Result<Option<DuelView>> {
    let sql = format!(
        "SELECT {GAME_COLUMNS}, u1.username, u2.username, uw.username {VIEW_JOINS} WHERE g.id = ?1"
    );

    conn.query_row(&sql, params![id], parse_view_row)
        .optional()
        .context("Failed to query game view by id")
}

/// Writes one side's result, only if that side is still blank and the game
/// is unsettled. Returns whether the row was updated.
pub fn record_side(conn: &Connection, id: GameId, side: Side, stats: SideStats) -> Result<bool> {
    let sql = match side {
        Side::Player1 => {
            "UPDATE games SET player1_time = ?1, player1_attempts = ?2, player1_xp = ?3
             WHERE id = ?4 AND winner_id IS NULL AND player1_xp = 0 AND player1_time = 0"
        }
        Side::Player2 => {
            "UPDATE games SET player2_time = ?1, player2_attempts = ?2, player2_xp = ?3
             WHERE id = ?4 AND winner_id IS NULL AND player2_xp = 0 AND player2_time = 0"
        }
    };

    let changed = conn
        .execute(sql, params![stats.time, stats.attempts, stats.xp, id])
        .context("Failed to record game result")?;

    Ok(changed == 1)
}

pub fn set_word_if_empty(conn: &Connection, id: GameId, word: &str) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE games SET word = ?1 WHERE id = ?2 AND word = ''",
            params![word, id],
        )
        .context("Failed to set game word")?;

    Ok(changed == 1)
}

/// Check-and-set of the winner. Only the caller that gets `true` may apply
/// settlement side effects.
pub fn set_winner_if_unset(conn: &Connection, id: GameId, winner_id: PlayerId) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE games SET winner_id = ?1 WHERE id = ?2 AND winner_id IS NULL",
            params![winner_id, id],
        )
        .context("Failed to settle game")?;

    Ok(changed == 1)
}

pub fn list_completed_for(
    conn: &Connection,
    player_id: PlayerId,
    limit: usize,
) -> Result<Vec<DuelView>> {
    let sql = format!(
        "SELECT {GAME_COLUMNS}, u1.username, u2.username, uw.username {VIEW_JOINS}
         WHERE (g.player1_id = ?1 OR g.player2_id = ?1) AND g.winner_id IS NOT NULL
         ORDER BY g.created_at DESC, g.id DESC LIMIT ?2"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![player_id, limit as i64], parse_view_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Unsettled games where the player's own half is still blank.
pub fn list_pending_for(
    conn: &Connection,
    player_id: PlayerId,
    limit: usize,
) -> Result<Vec<DuelView>> {
    let sql = format!(
        "SELECT {GAME_COLUMNS}, u1.username, u2.username, uw.username {VIEW_JOINS}
         WHERE g.winner_id IS NULL
           AND ((g.player1_id = ?1 AND g.player1_xp = 0 AND g.player1_time = 0)
             OR (g.player2_id = ?1 AND g.player2_xp = 0 AND g.player2_time = 0))
         ORDER BY g.created_at DESC, g.id DESC LIMIT ?2"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![player_id, limit as i64], parse_view_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

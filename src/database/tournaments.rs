use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Participation, PlayerId, Tournament, TournamentId};

const TOURNAMENT_COLUMNS: &str = "id, name, description, num_players, max_players, word_length, is_closed, current_round, created_at";

pub fn insert_tournament(
    conn: &Connection,
    name: &str,
    description: &str,
    max_players: i64,
    word_length: i64,
    created_at: DateTime<Utc>,
) -> Result<Tournament> {
    let sql = format!(
        "INSERT INTO tournaments (name, description, max_players, word_length, created_at) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {TOURNAMENT_COLUMNS}"
    );

    conn.query_row(
        &sql,
        params![name, description, max_players, word_length, created_at],
        parse_tournament_row,
    )
    .context("Failed to insert new tournament")
}

fn parse_tournament_row(row: &rusqlite::Row) -> rusqlite::Result<Tournament> {
    Ok(Tournament {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        num_players: row.get(3)?,
        max_players: row.get(4)?,
        word_length: row.get(5)?,
        is_closed: row.get(6)?,
        current_round: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn find_by_id(conn: &Connection, id: TournamentId) -> Result<Option<Tournament>> {
    let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = ?1");

    conn.query_row(&sql, params![id], parse_tournament_row)
        .optional()
        .context("Failed to query tournament by id")
}

/// Open tournaments first, newest first within each group.
pub fn list_all(conn: &Connection) -> Result<Vec<Tournament>> {
    let sql = format!(
        "SELECT {TOURNAMENT_COLUMNS} FROM tournaments ORDER BY is_closed ASC, created_at DESC, id DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_tournament_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Atomic increment-and-check on the seat counter. Returns the new
/// `num_players`, or `None` when the tournament is closed or at capacity.
pub fn claim_seat(conn: &Connection, id: TournamentId) -> Result<Option<i64>> {
    let sql = "UPDATE tournaments SET num_players = num_players + 1
               WHERE id = ?1 AND is_closed = 0 AND num_players < max_players
               RETURNING num_players";

    conn.query_row(sql, params![id], |row| row.get(0))
        .optional()
        .context("Failed to claim tournament seat")
}

/// Flips `is_closed` once. Returns true only for the caller that closed it.
pub fn close_if_open(conn: &Connection, id: TournamentId) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE tournaments SET is_closed = 1 WHERE id = ?1 AND is_closed = 0",
            params![id],
        )
        .context("Failed to close tournament")?;

    Ok(changed == 1)
}

/// Moves `current_round` forward to `next`; never moves it backwards.
pub fn advance_current_round(conn: &Connection, id: TournamentId, next: i64) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE tournaments SET current_round = ?1 WHERE id = ?2 AND current_round < ?1",
            params![next, id],
        )
        .context("Failed to advance tournament round")?;

    Ok(changed == 1)
}

pub fn insert_participation(
    conn: &Connection,
    tournament_id: TournamentId,
    player_id: PlayerId,
    joined_at: DateTime<Utc>,
) -> Result<Participation> {
    let sql = "INSERT INTO participations (tournament_id, player_id, joined_at) VALUES (?1, ?2, ?3) RETURNING id, tournament_id, player_id, joined_at";

    conn.query_row(sql, params![tournament_id, player_id, joined_at], parse_participation_row)
        .context("Failed to insert participation")
}

fn parse_participation_row(row: &rusqlite::Row) -> rusqlite::Result<Participation> {
    Ok(Participation {
        id: row.get(0)?,
        tournament_id: row.get(1)?,
        player_id: row.get(2)?,
        joined_at: row.get(3)?,
    })
}

pub fn find_participation(
    conn: &Connection,
    tournament_id: TournamentId,
    player_id: PlayerId,
) -> Result<Option<Participation>> {
    let sql = "SELECT id, tournament_id, player_id, joined_at FROM participations WHERE tournament_id = ?1 AND player_id = ?2";

    conn.query_row(sql, params![tournament_id, player_id], parse_participation_row)
        .optional()
        .context("Failed to query participation")
}

/// Participants in registration order.
pub fn list_participant_ids(conn: &Connection, tournament_id: TournamentId) -> Result<Vec<PlayerId>> {
    let sql = "SELECT player_id FROM participations WHERE tournament_id = ?1 ORDER BY joined_at ASC, id ASC";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![tournament_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Username of the winner of the tournament's final round, if it has one.
pub fn find_champion(
    conn: &Connection,
    tournament_id: TournamentId,
    final_round: i64,
) -> Result<Option<String>> {
    let sql = "SELECT u.username FROM rounds r
               JOIN round_games rg ON rg.round_id = r.id
               JOIN games g ON g.id = rg.game_id
               JOIN players p ON p.id = g.winner_id
               JOIN users u ON u.id = p.user_id
               WHERE r.tournament_id = ?1 AND r.number = ?2
               ORDER BY rg.id ASC LIMIT 1";

    conn.query_row(sql, params![tournament_id, final_round], |row| row.get(0))
        .optional()
        .context("Failed to query tournament champion")
}

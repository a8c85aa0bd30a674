use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Duel, DuelView, GameId, Round, RoundGame, RoundId, TournamentId};

pub fn insert_round(conn: &Connection, tournament_id: TournamentId, number: i64) -> Result<Round> {
    let sql = "INSERT INTO rounds (tournament_id, number) VALUES (?1, ?2) RETURNING id, tournament_id, number";

    conn.query_row(sql, params![tournament_id, number], parse_round_row)
        .context("Failed to insert round")
}

fn parse_round_row(row: &rusqlite::Row) -> rusqlite::Result<Round> {
    Ok(Round {
        id: row.get(0)?,
        tournament_id: row.get(1)?,
        number: row.get(2)?,
    })
}

pub fn find_round(conn: &Connection, tournament_id: TournamentId, number: i64) -> Result<Option<Round>> {
    let sql = "SELECT id, tournament_id, number FROM rounds WHERE tournament_id = ?1 AND number = ?2";

    conn.query_row(sql, params![tournament_id, number], parse_round_row)
        .optional()
        .context("Failed to query round")
}

pub fn list_rounds(conn: &Connection, tournament_id: TournamentId) -> Result<Vec<Round>> {
    let sql = "SELECT id, tournament_id, number FROM rounds WHERE tournament_id = ?1 ORDER BY number ASC";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![tournament_id], parse_round_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn find_round_of_game(conn: &Connection, game_id: GameId) -> Result<Option<Round>> {
    let sql = "SELECT r.id, r.tournament_id, r.number FROM rounds r
               JOIN round_games rg ON rg.round_id = r.id
               WHERE rg.game_id = ?1";

    conn.query_row(sql, params![game_id], parse_round_row)
        .optional()
        .context("Failed to query round of game")
}

pub fn insert_round_game(conn: &Connection, round_id: RoundId, game_id: GameId) -> Result<RoundGame> {
    let sql = "INSERT INTO round_games (round_id, game_id) VALUES (?1, ?2) RETURNING id, round_id, game_id";

    conn.query_row(sql, params![round_id, game_id], |row| {
        Ok(RoundGame {
            id: row.get(0)?,
            round_id: row.get(1)?,
            game_id: row.get(2)?,
        })
    })
    .context("Failed to insert round game")
}

pub fn count_round_games(conn: &Connection, round_id: RoundId) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM round_games WHERE round_id = ?1",
        params![round_id],
        |row| row.get(0),
    )
    .context("Failed to count round games")
}

/// Games of a round in the order they were paired.
pub fn list_round_duels(conn: &Connection, round_id: RoundId) -> Result<Vec<Duel>> {
    let sql = "SELECT rg.game_id FROM round_games rg WHERE rg.round_id = ?1 ORDER BY rg.id ASC";

    let game_ids = {
        let mut stmt = conn.prepare(sql)?;
        stmt.query_map(params![round_id], |row| row.get::<_, GameId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
    };

    game_ids
        .into_iter()
        .map(|id| {
            super::games::find_by_id(conn, id)?
                .with_context(|| format!("Round game {id} references a missing game"))
        })
        .collect()
}

pub fn list_round_views(conn: &Connection, round_id: RoundId) -> Result<Vec<DuelView>> {
    let sql = "SELECT rg.game_id FROM round_games rg WHERE rg.round_id = ?1 ORDER BY rg.id ASC";

    let game_ids = {
        let mut stmt = conn.prepare(sql)?;
        stmt.query_map(params![round_id], |row| row.get::<_, GameId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut views = Vec::with_capacity(game_ids.len());
    for id in game_ids {
        if let Some(view) = super::games::find_view_by_id(conn, id)? {
            views.push(view);
        }
    }

    Ok(views)
}

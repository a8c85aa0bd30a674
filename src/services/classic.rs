use chrono::Utc;
use log::info;
use rusqlite::Connection;

use super::ledger::Ledger;
use crate::config::GameSettings;
use crate::database::models::{ClassicSession, PlayerId};
use crate::database::{begin_write, classics};
use crate::errors::{GameError, GameResult};

#[derive(Debug, Clone)]
pub struct NewClassicSession {
    pub word: String,
    pub time_consumed: i64,
    pub attempts: i64,
    pub xp_gained: i64,
    pub won: bool,
}

/// Records one-off puzzle results and credits the ledger.
pub struct ClassicService {
    settings: GameSettings,
}

impl ClassicService {
    pub fn new(settings: GameSettings) -> Self {
        Self { settings }
    }

    pub fn record(
        &self,
        conn: &mut Connection,
        player_id: PlayerId,
        entry: NewClassicSession,
    ) -> GameResult<ClassicSession> {
        validate(&entry)?;

        let tx = begin_write(conn)?;
        let session = classics::insert_session(
            &tx,
            player_id,
            &entry.word.to_lowercase(),
            entry.time_consumed,
            entry.attempts,
            entry.xp_gained,
            entry.won,
            Utc::now(),
        )?;

        let ledger = Ledger::new(&tx);
        if entry.won {
            ledger.credit_classic_win(player_id)?;
        }
        ledger.credit_classic_xp(player_id, entry.xp_gained)?;
        tx.commit()?;

        info!(
            "Player {} recorded classic session {} (won: {}, xp: {})",
            player_id, session.id, session.won, session.xp_gained
        );
        Ok(session)
    }

    pub fn history(&self, conn: &Connection, player_id: PlayerId) -> GameResult<Vec<ClassicSession>> {
        Ok(classics::list_recent_by_player(conn, player_id, self.settings.page_size)?)
    }
}

fn validate(entry: &NewClassicSession) -> GameResult<()> {
    if entry.word.is_empty() || !entry.word.chars().all(|c| c.is_alphabetic()) {
        return Err(GameError::validation("word must be a non-empty alphabetic string."));
    }
    if entry.attempts < 1 {
        return Err(GameError::validation("attempts must be at least 1."));
    }
    if entry.time_consumed < 0 || entry.xp_gained < 0 {
        return Err(GameError::validation("time_consumed and xp_gained cannot be negative."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{player, seed_player};

    fn session(won: bool, xp: i64) -> NewClassicSession {
        NewClassicSession {
            word: "Crane".to_string(),
            time_consumed: 42,
            attempts: 4,
            xp_gained: xp,
            won,
        }
    }

    #[test]
    fn won_session_credits_one_win_and_xp() {
        let mut conn = crate::database::setup::test_connection();
        let id = seed_player(&conn, "alice");
        let service = ClassicService::new(GameSettings::default());

        let recorded = service.record(&mut conn, id, session(true, 50)).unwrap();
        assert_eq!(recorded.word, "crane");

        let p = player(&conn, id);
        assert_eq!(p.wins, 1);
        assert_eq!(p.xp, 50);
        assert_eq!(p.wins_pvp, 0);
        assert_eq!(p.wins_tournament, 0);
    }

    #[test]
    fn lost_session_still_grants_xp() {
        let mut conn = crate::database::setup::test_connection();
        let id = seed_player(&conn, "bob");
        let service = ClassicService::new(GameSettings::default());

        service.record(&mut conn, id, session(false, 15)).unwrap();

        let p = player(&conn, id);
        assert_eq!(p.wins, 0);
        assert_eq!(p.xp, 15);
    }

    #[test]
    fn invalid_input_changes_nothing() {
        let mut conn = crate::database::setup::test_connection();
        let id = seed_player(&conn, "carol");
        let service = ClassicService::new(GameSettings::default());

        let mut bad = session(true, 50);
        bad.attempts = 0;
        assert!(matches!(service.record(&mut conn, id, bad), Err(GameError::Validation(_))));

        let mut bad = session(true, 50);
        bad.word = String::new();
        assert!(matches!(service.record(&mut conn, id, bad), Err(GameError::Validation(_))));

        assert_eq!(player(&conn, id).xp, 0);
        assert!(service.history(&conn, id).unwrap().is_empty());
    }

    #[test]
    fn unknown_player_rolls_back_the_session() {
        let mut conn = crate::database::setup::test_connection();
        let service = ClassicService::new(GameSettings::default());

        assert!(service.record(&mut conn, 77, session(true, 5)).is_err());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM classic_wordles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

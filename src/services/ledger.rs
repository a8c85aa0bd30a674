use rusqlite::Connection;

use crate::database::models::PlayerId;
use crate::database::players::{self, StatDelta};
use crate::errors::{GameError, GameResult};

/// Per-player win counters and XP.
///
/// Every method is an unconditional increment. Exactly-once semantics come
/// from the callers, which credit only after winning a check-and-set on the
/// triggering row inside the same transaction.
pub struct Ledger<'c> {
    conn: &'c Connection,
}

impl<'c> Ledger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn credit_classic_win(&self, player_id: PlayerId) -> GameResult<()> {
        self.apply(player_id, StatDelta {
            wins: 1,
            ..StatDelta::default()
        })
    }

    pub fn credit_classic_xp(&self, player_id: PlayerId, xp: i64) -> GameResult<()> {
        self.add_xp(player_id, xp)
    }

    pub fn credit_duel_win(&self, player_id: PlayerId) -> GameResult<()> {
        self.apply(player_id, StatDelta {
            wins_pvp: 1,
            ..StatDelta::default()
        })
    }

    pub fn credit_tournament_win(&self, player_id: PlayerId, bonus_xp: i64) -> GameResult<()> {
        self.apply(player_id, StatDelta {
            wins_tournament: 1,
            xp: bonus_xp,
            ..StatDelta::default()
        })
    }

    pub fn add_xp(&self, player_id: PlayerId, amount: i64) -> GameResult<()> {
        if amount < 0 {
            return Err(GameError::validation("XP credit cannot be negative."));
        }

        self.apply(player_id, StatDelta {
            xp: amount,
            ..StatDelta::default()
        })
    }

    fn apply(&self, player_id: PlayerId, delta: StatDelta) -> GameResult<()> {
        if players::apply_delta(self.conn, player_id, delta)? {
            Ok(())
        } else {
            Err(GameError::not_found("Player"))
        }
    }
}

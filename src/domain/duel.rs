use serde::Serialize;

use crate::database::models::{Duel, PlayerId, SideStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub fn of(duel: &Duel, player_id: PlayerId) -> Option<Side> {
        if duel.player1_id == player_id {
            Some(Side::Player1)
        } else if duel.player2_id == player_id {
            Some(Side::Player2)
        } else {
            None
        }
    }

    pub fn stats(self, duel: &Duel) -> SideStats {
        match self {
            Side::Player1 => duel.player1,
            Side::Player2 => duel.player2,
        }
    }

    pub fn player_id(self, duel: &Duel) -> PlayerId {
        match self {
            Side::Player1 => duel.player1_id,
            Side::Player2 => duel.player2_id,
        }
    }
}

/// Higher XP wins. On equal XP player2 wins unless its time is strictly
/// greater than player1's, so a full tie goes to player2.
pub fn decide_winner(player1: SideStats, player2: SideStats) -> Side {
    if player2.xp > player1.xp {
        Side::Player2
    } else if player2.xp < player1.xp {
        Side::Player1
    } else if player2.time <= player1.time {
        Side::Player2
    } else {
        Side::Player1
    }
}

/// Both halves have been reported and no winner is recorded yet.
pub fn ready_to_settle(duel: &Duel) -> bool {
    !duel.is_settled() && duel.player1.is_reported() && duel.player2.is_reported()
}

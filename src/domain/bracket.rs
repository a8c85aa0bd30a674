use serde::Serialize;

use crate::database::models::{PlayerId, Tournament};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    Open,
    Closed,
    Complete,
}

impl TournamentState {
    pub fn derive(tournament: &Tournament, has_champion: bool) -> Self {
        match (tournament.is_closed, has_champion) {
            (false, _) => TournamentState::Open,
            (true, false) => TournamentState::Closed,
            (true, true) => TournamentState::Complete,
        }
    }
}

pub fn is_valid_bracket_size(max_players: i64) -> bool {
    max_players >= 2 && (max_players & (max_players - 1)) == 0
}

/// Number of single-elimination rounds for a bracket, `log2(max_players)`.
/// `None` when the size is not a power of two.
pub fn round_count(max_players: i64) -> Option<i64> {
    is_valid_bracket_size(max_players).then(|| i64::from(max_players.trailing_zeros()))
}

/// Pairs consecutive entries: (p[0], p[1]), (p[2], p[3]), ...
/// `None` for an odd count; a bracket never produces one.
pub fn pair_up(players: &[PlayerId]) -> Option<Vec<(PlayerId, PlayerId)>> {
    if players.len() % 2 != 0 {
        return None;
    }

    Some(
        players
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect(),
    )
}

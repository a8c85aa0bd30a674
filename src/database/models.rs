use chrono::{DateTime, Utc};

pub type UserId = i64;
pub type PlayerId = i64;
pub type GameId = i64;
pub type TournamentId = i64;
pub type RoundId = i64;

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub key: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub user_id: UserId,
    pub username: String,
    pub wins: i64,
    pub wins_pvp: i64,
    pub wins_tournament: i64,
    pub xp: i64,
}

#[derive(Debug, Clone)]
pub struct ClassicSession {
    pub id: i64,
    pub player_id: PlayerId,
    pub word: String,
    pub time_consumed: i64,
    pub attempts: i64,
    pub xp_gained: i64,
    pub won: bool,
    pub played_at: DateTime<Utc>,
}

/// One player's half of a duel. All zeros means "not reported yet".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideStats {
    pub time: i64,
    pub attempts: i64,
    pub xp: i64,
}

impl SideStats {
    pub fn is_reported(&self) -> bool {
        self.xp != 0 && self.time != 0
    }

    pub fn is_blank(&self) -> bool {
        self.xp == 0 && self.time == 0
    }
}

#[derive(Debug, Clone)]
pub struct Duel {
    pub id: GameId,
    pub player1_id: PlayerId,
    pub player2_id: PlayerId,
    pub word: String,
    pub player1: SideStats,
    pub player2: SideStats,
    pub winner_id: Option<PlayerId>,
    pub is_tournament_game: bool,
    pub created_at: DateTime<Utc>,
}

impl Duel {
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    pub fn is_settled(&self) -> bool {
        self.winner_id.is_some()
    }
}

/// Duel joined with both usernames, for API responses.
#[derive(Debug, Clone)]
pub struct DuelView {
    pub duel: Duel,
    pub player1_username: String,
    pub player2_username: String,
    pub winner_username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub description: String,
    pub num_players: i64,
    pub max_players: i64,
    pub word_length: i64,
    pub is_closed: bool,
    pub current_round: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Participation {
    pub id: i64,
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub id: RoundId,
    pub tournament_id: TournamentId,
    pub number: i64,
}

#[derive(Debug, Clone)]
pub struct RoundGame {
    pub id: i64,
    pub round_id: RoundId,
    pub game_id: GameId,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: i64,
    pub player_id: PlayerId,
    pub kind: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

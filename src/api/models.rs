use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::database::models::{
    ClassicSession, DuelView, Notification, Participation, Player, Round, SideStats,
};
use crate::domain::{Side, TournamentState};
use crate::errors::{GameError, GameResult};
use crate::services::classic::NewClassicSession;
use crate::services::duel::{NewChallenge, SideReport};
use crate::services::tournament::TournamentDetail;

// --- Requests ---

#[derive(Debug, Deserialize)]
pub struct ClassicRequest {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub time_consumed: i64,
    #[serde(default)]
    pub attempts: i64,
    #[serde(default)]
    pub xp_gained: i64,
    #[serde(default)]
    pub won: bool,
}

impl From<ClassicRequest> for NewClassicSession {
    fn from(req: ClassicRequest) -> Self {
        NewClassicSession {
            word: req.word,
            time_consumed: req.time_consumed,
            attempts: req.attempts,
            xp_gained: req.xp_gained,
            won: req.won,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChallengeRequest {
    pub player2: Option<String>,
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub player1_xp: i64,
    #[serde(default)]
    pub player1_time: i64,
    #[serde(default)]
    pub player1_attempts: i64,
    /// `Some` whenever the key is present, even as `null`.
    #[serde(default, deserialize_with = "present")]
    pub winner: Option<serde_json::Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl From<ChallengeRequest> for NewChallenge {
    fn from(req: ChallengeRequest) -> Self {
        NewChallenge {
            winner_supplied: req.winner.is_some(),
            opponent: req.player2,
            word: req.word,
            stats: SideStats {
                time: req.player1_time,
                attempts: req.player1_attempts,
                xp: req.player1_xp,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResponseRequest {
    #[serde(default)]
    pub player2_xp: i64,
    #[serde(default)]
    pub player2_time: i64,
    #[serde(default)]
    pub player2_attempts: i64,
}

impl ResponseRequest {
    pub fn stats(&self) -> SideStats {
        SideStats {
            time: self.player2_time,
            attempts: self.player2_attempts,
            xp: self.player2_xp,
        }
    }
}

/// Carries the caller's own side only; which prefix is used depends on
/// whether the caller is player1 or player2 of the game.
#[derive(Debug, Default, Deserialize)]
pub struct TournamentReportRequest {
    pub player1_xp: Option<i64>,
    pub player1_time: Option<i64>,
    pub player1_attempts: Option<i64>,
    pub player2_xp: Option<i64>,
    pub player2_time: Option<i64>,
    pub player2_attempts: Option<i64>,
    pub word: Option<String>,
}

impl TournamentReportRequest {
    pub fn into_report(self, side: Side) -> GameResult<SideReport> {
        let (xp, time, attempts, prefix) = match side {
            Side::Player1 => (self.player1_xp, self.player1_time, self.player1_attempts, "player1"),
            Side::Player2 => (self.player2_xp, self.player2_time, self.player2_attempts, "player2"),
        };

        match (xp, time, attempts) {
            (Some(xp), Some(time), Some(attempts)) => Ok(SideReport {
                stats: SideStats { time, attempts, xp },
                word: self.word,
            }),
            _ => Err(GameError::validation(format!(
                "{prefix}_xp, {prefix}_time and {prefix}_attempts are required."
            ))),
        }
    }
}

// --- Responses ---

#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    pub id: i64,
    pub username: String,
    pub wins: i64,
    pub wins_pvp: i64,
    pub wins_tournament: i64,
    pub xp: i64,
}

impl From<Player> for PlayerResponse {
    fn from(p: Player) -> Self {
        PlayerResponse {
            id: p.id,
            username: p.username,
            wins: p.wins,
            wins_pvp: p.wins_pvp,
            wins_tournament: p.wins_tournament,
            xp: p.xp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClassicResponse {
    pub id: i64,
    pub word: String,
    pub time_consumed: i64,
    pub attempts: i64,
    pub xp_gained: i64,
    pub won: bool,
    pub played_at: DateTime<Utc>,
}

impl From<ClassicSession> for ClassicResponse {
    fn from(s: ClassicSession) -> Self {
        ClassicResponse {
            id: s.id,
            word: s.word,
            time_consumed: s.time_consumed,
            attempts: s.attempts,
            xp_gained: s.xp_gained,
            won: s.won,
            played_at: s.played_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DuelResponse {
    pub id: i64,
    pub player1: String,
    pub player2: String,
    pub word: String,
    pub player1_time: i64,
    pub player1_attempts: i64,
    pub player1_xp: i64,
    pub player2_time: i64,
    pub player2_attempts: i64,
    pub player2_xp: i64,
    pub winner: Option<String>,
    pub is_tournament_game: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DuelView> for DuelResponse {
    fn from(view: DuelView) -> Self {
        let duel = view.duel;
        DuelResponse {
            id: duel.id,
            player1: view.player1_username,
            player2: view.player2_username,
            word: duel.word,
            player1_time: duel.player1.time,
            player1_attempts: duel.player1.attempts,
            player1_xp: duel.player1.xp,
            player2_time: duel.player2.time,
            player2_attempts: duel.player2.attempts,
            player2_xp: duel.player2.xp,
            winner: view.winner_username,
            is_tournament_game: duel.is_tournament_game,
            created_at: duel.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WinnerResponse {
    pub winner: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TournamentResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub num_players: i64,
    pub max_players: i64,
    pub word_length: i64,
    pub is_closed: bool,
    pub current_round: i64,
    pub total_rounds: i64,
    pub state: TournamentState,
    pub champion: Option<String>,
}

impl From<TournamentDetail> for TournamentResponse {
    fn from(detail: TournamentDetail) -> Self {
        let t = detail.tournament;
        TournamentResponse {
            id: t.id,
            name: t.name,
            description: t.description,
            num_players: t.num_players,
            max_players: t.max_players,
            word_length: t.word_length,
            is_closed: t.is_closed,
            current_round: t.current_round,
            total_rounds: detail.total_rounds,
            state: detail.state,
            champion: detail.champion,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParticipationResponse {
    pub id: i64,
    pub tournament: i64,
    pub player: i64,
    pub joined_at: DateTime<Utc>,
}

impl From<Participation> for ParticipationResponse {
    fn from(p: Participation) -> Self {
        ParticipationResponse {
            id: p.id,
            tournament: p.tournament_id,
            player: p.player_id,
            joined_at: p.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoundResponse {
    pub id: i64,
    pub tournament: i64,
    pub number: i64,
}

impl From<Round> for RoundResponse {
    fn from(r: Round) -> Self {
        RoundResponse {
            id: r.id,
            tournament: r.tournament_id,
            number: r.number,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub kind: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        NotificationResponse {
            id: n.id,
            kind: n.kind,
            text: n.text,
            created_at: n.created_at,
        }
    }
}

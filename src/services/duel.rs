use std::sync::Arc;

use chrono::Utc;
use log::info;
use rusqlite::Connection;

use super::ledger::Ledger;
use super::notifications::{flush, NoticeKind, NotificationSink, Outbox};
use crate::config::GameSettings;
use crate::database::models::{Duel, DuelView, GameId, Player, PlayerId, SideStats};
use crate::database::{begin_write, games, players};
use crate::domain::duel::{decide_winner, ready_to_settle, Side};
use crate::errors::{GameError, GameResult};

/// Runs inside the settling transaction, after the winner has been written
/// and credited. Tournament bracket advancement plugs in here.
pub trait SettlementHook: Send + Sync {
    fn on_settled(&self, conn: &Connection, duel: &Duel, outbox: &mut Outbox) -> GameResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct NewChallenge {
    pub opponent: Option<String>,
    pub word: String,
    pub stats: SideStats,
    /// The client sent a `winner`; that field is server-owned.
    pub winner_supplied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SideReport {
    pub stats: SideStats,
    pub word: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub duel: DuelView,
    pub settled: bool,
}

pub struct DuelService {
    settings: GameSettings,
    sink: Arc<dyn NotificationSink>,
    hook: Arc<dyn SettlementHook>,
}

impl DuelService {
    pub fn new(
        settings: GameSettings,
        sink: Arc<dyn NotificationSink>,
        hook: Arc<dyn SettlementHook>,
    ) -> Self {
        Self {
            settings,
            sink,
            hook,
        }
    }

    pub fn challenge(
        &self,
        conn: &mut Connection,
        challenger: &Player,
        request: NewChallenge,
    ) -> GameResult<DuelView> {
        if request.winner_supplied {
            return Err(GameError::validation("winner cannot be set by the client."));
        }
        let opponent_name = request
            .opponent
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GameError::validation("player2 is required."))?;
        validate_word(&request.word)?;
        validate_stats(request.stats, false)?;

        let tx = begin_write(conn)?;
        let opponent = players::find_by_username(&tx, opponent_name)?
            .ok_or_else(|| GameError::not_found("Player"))?;
        if opponent.id == challenger.id {
            return Err(GameError::validation("You cannot challenge yourself."));
        }

        let duel = games::insert_duel(
            &tx,
            challenger.id,
            opponent.id,
            &request.word.to_lowercase(),
            request.stats,
            false,
            Utc::now(),
        )?;
        Ledger::new(&tx).add_xp(challenger.id, request.stats.xp)?;

        let mut outbox = Outbox::new();
        outbox.push(
            opponent.id,
            NoticeKind::Challenge,
            format!("{} has challenged you to a duel!", challenger.username),
        );

        let view = load_view(&tx, duel.id)?;
        tx.commit()?;
        flush(self.sink.as_ref(), conn, outbox);

        info!(
            "Duel {} created: {} challenged {}",
            duel.id, challenger.username, opponent.username
        );
        Ok(view)
    }

    /// The challenged player's single response to a standalone duel.
    pub fn report_open(
        &self,
        conn: &mut Connection,
        reporter: PlayerId,
        duel_id: GameId,
        stats: SideStats,
    ) -> GameResult<DuelView> {
        validate_stats(stats, false)?;

        let tx = begin_write(conn)?;
        let duel = load_duel(&tx, duel_id)?;
        if duel.is_tournament_game {
            return Err(GameError::conflict(
                "Tournament games are reported through the tournament endpoint.",
            ));
        }
        if duel.player2_id != reporter {
            return Err(GameError::denied("Only the challenged player can respond to this game."));
        }
        if duel.is_settled() {
            return Err(GameError::AlreadySettled);
        }
        if !games::record_side(&tx, duel_id, Side::Player2, stats)? {
            return Err(GameError::AlreadySettled);
        }
        Ledger::new(&tx).add_xp(reporter, stats.xp)?;

        let mut outbox = Outbox::new();
        let duel = load_duel(&tx, duel_id)?;
        let winner_id = settle(&tx, &duel, self.hook.as_ref(), &mut outbox)?;

        let view = load_view(&tx, duel_id)?;
        let winner_name = if winner_id == duel.player1_id {
            &view.player1_username
        } else {
            &view.player2_username
        };
        outbox.push(
            duel.player1_id,
            NoticeKind::DuelResult,
            format!(
                "{} answered your challenge. Winner: {}",
                view.player2_username, winner_name
            ),
        );
        tx.commit()?;
        flush(self.sink.as_ref(), conn, outbox);

        Ok(view)
    }

    /// One side's result in a bracket duel. Either side may report first; the
    /// second report settles the duel.
    pub fn report_tournament(
        &self,
        conn: &mut Connection,
        reporter: PlayerId,
        duel_id: GameId,
        report: SideReport,
    ) -> GameResult<ReportOutcome> {
        validate_stats(report.stats, true)?;
        if let Some(word) = report.word.as_deref().filter(|w| !w.is_empty()) {
            validate_word(word)?;
        }

        let tx = begin_write(conn)?;
        let duel = load_duel(&tx, duel_id)?;
        if !duel.is_tournament_game {
            return Err(GameError::conflict("This game is not part of a tournament."));
        }
        let side = Side::of(&duel, reporter)
            .ok_or_else(|| GameError::denied("You are not a player of this game."))?;
        if !side.stats(&duel).is_blank() {
            return Err(GameError::AlreadyReported);
        }
        if duel.is_settled() {
            return Err(GameError::AlreadySettled);
        }
        if !games::record_side(&tx, duel_id, side, report.stats)? {
            return Err(GameError::AlreadyReported);
        }
        if let Some(word) = report.word.as_deref().filter(|w| !w.is_empty()) {
            games::set_word_if_empty(&tx, duel_id, &word.to_lowercase())?;
        }
        Ledger::new(&tx).add_xp(reporter, report.stats.xp)?;

        let mut outbox = Outbox::new();
        let duel = load_duel(&tx, duel_id)?;
        let settled = if ready_to_settle(&duel) {
            settle(&tx, &duel, self.hook.as_ref(), &mut outbox)?;
            true
        } else {
            false
        };

        let view = load_view(&tx, duel_id)?;
        tx.commit()?;
        flush(self.sink.as_ref(), conn, outbox);

        Ok(ReportOutcome {
            duel: view,
            settled,
        })
    }

    pub fn get(&self, conn: &Connection, viewer: PlayerId, duel_id: GameId) -> GameResult<DuelView> {
        let view = load_view(conn, duel_id)?;
        if !view.duel.involves(viewer) {
            return Err(GameError::denied("You are not a player of this game."));
        }
        Ok(view)
    }

    /// Which half of the duel belongs to `player_id`. Sides never change once
    /// the duel exists, so this read may happen outside the report transaction.
    pub fn side_of(&self, conn: &Connection, duel_id: GameId, player_id: PlayerId) -> GameResult<Side> {
        let duel = load_duel(conn, duel_id)?;
        Side::of(&duel, player_id).ok_or_else(|| GameError::denied("You are not a player of this game."))
    }

    pub fn completed(&self, conn: &Connection, player_id: PlayerId) -> GameResult<Vec<DuelView>> {
        Ok(games::list_completed_for(conn, player_id, self.settings.page_size)?)
    }

    pub fn pending(&self, conn: &Connection, player_id: PlayerId) -> GameResult<Vec<DuelView>> {
        Ok(games::list_pending_for(conn, player_id, self.settings.page_size)?)
    }
}

/// Assigns the winner exactly once and credits it. Must run inside the
/// transaction that recorded the final report.
pub fn settle(
    conn: &Connection,
    duel: &Duel,
    hook: &dyn SettlementHook,
    outbox: &mut Outbox,
) -> GameResult<PlayerId> {
    let winner_id = decide_winner(duel.player1, duel.player2).player_id(duel);
    if !games::set_winner_if_unset(conn, duel.id, winner_id)? {
        return Err(GameError::AlreadySettled);
    }
    Ledger::new(conn).credit_duel_win(winner_id)?;
    info!("Duel {} settled, winner: player {}", duel.id, winner_id);

    if duel.is_tournament_game {
        let settled = Duel {
            winner_id: Some(winner_id),
            ..duel.clone()
        };
        hook.on_settled(conn, &settled, outbox)?;
    }

    Ok(winner_id)
}

fn load_duel(conn: &Connection, id: GameId) -> GameResult<Duel> {
    games::find_by_id(conn, id)?.ok_or_else(|| GameError::not_found("Game"))
}

fn load_view(conn: &Connection, id: GameId) -> GameResult<DuelView> {
    games::find_view_by_id(conn, id)?.ok_or_else(|| GameError::not_found("Game"))
}

fn validate_word(word: &str) -> GameResult<()> {
    if word.is_empty() || !word.chars().all(|c| c.is_alphabetic()) {
        return Err(GameError::validation("word must be a non-empty alphabetic string."));
    }
    Ok(())
}

/// A zero xp or time is the "not reported" marker, so bracket reports must
/// carry positive values to be able to settle.
fn validate_stats(stats: SideStats, bracket: bool) -> GameResult<()> {
    if stats.time <= 0 {
        return Err(GameError::validation("time must be positive."));
    }
    if stats.attempts < 1 {
        return Err(GameError::validation("attempts must be at least 1."));
    }
    if stats.xp < 0 || (bracket && stats.xp == 0) {
        return Err(GameError::validation("xp must be positive."));
    }
    Ok(())
}

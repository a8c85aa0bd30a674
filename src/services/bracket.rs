use chrono::Utc;
use log::{info, warn};
use rusqlite::Connection;

use super::duel::SettlementHook;
use super::ledger::Ledger;
use super::notifications::{NoticeKind, Outbox};
use crate::config::GameSettings;
use crate::database::models::{Duel, PlayerId, Round, SideStats, Tournament};
use crate::database::{games, rounds, tournaments};
use crate::domain::bracket::{pair_up, round_count};
use crate::errors::GameResult;

/// Owns the bracket of every tournament: builds it when registration closes
/// and walks it forward as bracket duels settle.
///
/// Shape anomalies (odd winner counts, missing rounds, bad sizes) are logged
/// and declined rather than failing the request that triggered them.
pub struct BracketEngine {
    champion_bonus_xp: i64,
}

impl BracketEngine {
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            champion_bonus_xp: settings.tournament_bonus_xp,
        }
    }

    /// Creates rounds `1..=log2(max_players)` and pairs the participants, in
    /// registration order, into the first-round duels.
    pub fn generate(&self, conn: &Connection, tournament: &Tournament, outbox: &mut Outbox) -> GameResult<()> {
        let Some(total_rounds) = round_count(tournament.max_players) else {
            warn!(
                "Tournament {} has invalid size {}, bracket not generated",
                tournament.id, tournament.max_players
            );
            return Ok(());
        };

        let participants = tournaments::list_participant_ids(conn, tournament.id)?;
        let Some(pairs) = pair_up(&participants) else {
            warn!(
                "Tournament {} has an odd number of participants ({}), bracket not generated",
                tournament.id,
                participants.len()
            );
            return Ok(());
        };

        let mut first_round = None;
        for number in 1..=total_rounds {
            let round = rounds::insert_round(conn, tournament.id, number)?;
            if number == 1 {
                first_round = Some(round);
            }
        }
        let Some(first_round) = first_round else {
            return Ok(());
        };

        for (player1, player2) in pairs {
            self.schedule(conn, tournament, &first_round, player1, player2, outbox)?;
        }

        info!(
            "Tournament {} closed: {} rounds, {} first-round games",
            tournament.id,
            total_rounds,
            participants.len() / 2
        );
        Ok(())
    }

    /// Called with every settled bracket duel. Does nothing until the duel's
    /// round is fully settled; then either seeds the next round from the
    /// round's winners or, for the final, crowns the champion.
    pub fn advance(&self, conn: &Connection, settled: &Duel, outbox: &mut Outbox) -> GameResult<()> {
        let Some(round) = rounds::find_round_of_game(conn, settled.id)? else {
            return Ok(());
        };

        let duels = rounds::list_round_duels(conn, round.id)?;
        if duels.is_empty() || duels.iter().any(|d| d.winner_id.is_none()) {
            return Ok(());
        }

        let Some(tournament) = tournaments::find_by_id(conn, round.tournament_id)? else {
            warn!("Round {} belongs to a missing tournament", round.id);
            return Ok(());
        };
        let Some(total_rounds) = round_count(tournament.max_players) else {
            warn!("Tournament {} has invalid size, not advancing", tournament.id);
            return Ok(());
        };

        if round.number >= total_rounds {
            return self.crown(conn, &tournament, settled, outbox);
        }

        let winners: Vec<PlayerId> = duels.iter().filter_map(|d| d.winner_id).collect();
        let Some(pairs) = pair_up(&winners) else {
            warn!(
                "Round {} of tournament {} produced {} winners, not advancing",
                round.number,
                tournament.id,
                winners.len()
            );
            return Ok(());
        };

        let next_number = round.number + 1;
        let next_round = match rounds::find_round(conn, tournament.id, next_number)? {
            Some(existing) => existing,
            None => rounds::insert_round(conn, tournament.id, next_number)?,
        };
        if rounds::count_round_games(conn, next_round.id)? > 0 {
            warn!(
                "Round {} of tournament {} is already seeded",
                next_number, tournament.id
            );
            return Ok(());
        }

        tournaments::advance_current_round(conn, tournament.id, next_number)?;
        for (player1, player2) in pairs {
            self.schedule(conn, &tournament, &next_round, player1, player2, outbox)?;
        }

        info!(
            "Tournament {} advanced to round {} of {}",
            tournament.id, next_number, total_rounds
        );
        Ok(())
    }

    fn crown(&self, conn: &Connection, tournament: &Tournament, final_duel: &Duel, outbox: &mut Outbox) -> GameResult<()> {
        let Some(champion) = final_duel.winner_id else {
            return Ok(());
        };

        Ledger::new(conn).credit_tournament_win(champion, self.champion_bonus_xp)?;
        outbox.push(
            champion,
            NoticeKind::TournamentWon,
            format!(
                "You won the tournament {}! +{} XP",
                tournament.name, self.champion_bonus_xp
            ),
        );

        info!("Tournament {} complete, champion: player {}", tournament.id, champion);
        Ok(())
    }

    fn schedule(
        &self,
        conn: &Connection,
        tournament: &Tournament,
        round: &Round,
        player1: PlayerId,
        player2: PlayerId,
        outbox: &mut Outbox,
    ) -> GameResult<()> {
        let duel = games::insert_duel(conn, player1, player2, "", SideStats::default(), true, Utc::now())?;
        rounds::insert_round_game(conn, round.id, duel.id)?;

        let text = format!(
            "Round {} of {} is ready. Play your game!",
            round.number, tournament.name
        );
        outbox.push(player1, NoticeKind::RoundAssigned, text.clone());
        outbox.push(player2, NoticeKind::RoundAssigned, text);
        Ok(())
    }
}

impl SettlementHook for BracketEngine {
    fn on_settled(&self, conn: &Connection, duel: &Duel, outbox: &mut Outbox) -> GameResult<()> {
        self.advance(conn, duel, outbox)
    }
}

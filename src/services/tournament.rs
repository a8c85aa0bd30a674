use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use rusqlite::Connection;

use super::bracket::BracketEngine;
use super::notifications::{flush, NoticeKind, NotificationSink, Outbox};
use crate::config::GameSettings;
use crate::database::models::{DuelView, Participation, PlayerId, Round, Tournament, TournamentId};
use crate::database::{begin_write, rounds, tournaments};
use crate::domain::bracket::{is_valid_bracket_size, round_count};
use crate::domain::TournamentState;
use crate::errors::{GameError, GameResult};

#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub description: String,
    pub max_players: i64,
    pub word_length: i64,
}

#[derive(Debug, Clone)]
pub struct TournamentDetail {
    pub tournament: Tournament,
    pub state: TournamentState,
    pub total_rounds: i64,
    pub champion: Option<String>,
}

pub struct TournamentService {
    settings: GameSettings,
    sink: Arc<dyn NotificationSink>,
    engine: Arc<BracketEngine>,
}

impl TournamentService {
    pub fn new(settings: GameSettings, sink: Arc<dyn NotificationSink>, engine: Arc<BracketEngine>) -> Self {
        Self {
            settings,
            sink,
            engine,
        }
    }

    pub fn create(&self, conn: &mut Connection, request: NewTournament) -> GameResult<Tournament> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(GameError::validation("name is required."));
        }
        if !is_valid_bracket_size(request.max_players) {
            return Err(GameError::validation("max_players must be a power of two, at least 2."));
        }
        if !(self.settings.min_word_length..=self.settings.max_word_length).contains(&request.word_length) {
            return Err(GameError::validation(format!(
                "word_length must be between {} and {}.",
                self.settings.min_word_length, self.settings.max_word_length
            )));
        }

        let tx = begin_write(conn)?;
        let tournament = tournaments::insert_tournament(
            &tx,
            name,
            request.description.trim(),
            request.max_players,
            request.word_length,
            Utc::now(),
        )?;
        tx.commit()?;

        info!("Tournament {} created for {} players", tournament.id, tournament.max_players);
        Ok(tournament)
    }

    /// Registers the player. The join that fills the last seat closes the
    /// tournament and generates the whole bracket in the same transaction.
    pub fn join(
        &self,
        conn: &mut Connection,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> GameResult<Participation> {
        let tx = begin_write(conn)?;
        let tournament = tournaments::find_by_id(&tx, tournament_id)?
            .ok_or_else(|| GameError::conflict("Tournament does not exist."))?;

        if tournaments::find_participation(&tx, tournament_id, player_id)?.is_some() {
            return Err(GameError::conflict("You already joined this tournament."));
        }

        let mut outbox = Outbox::new();
        if tournament.num_players >= tournament.max_players {
            if !tournament.is_closed && tournaments::close_if_open(&tx, tournament_id)? {
                warn!("Tournament {} was full but open, closing it", tournament_id);
                if rounds::list_rounds(&tx, tournament_id)?.is_empty() {
                    self.engine.generate(&tx, &tournament, &mut outbox)?;
                }
                tx.commit()?;
                flush(self.sink.as_ref(), conn, outbox);
            }
            return Err(GameError::Full);
        }
        if tournament.is_closed {
            return Err(GameError::conflict("Tournament is closed."));
        }

        let Some(seats_taken) = tournaments::claim_seat(&tx, tournament_id)? else {
            return Err(GameError::Full);
        };
        let participation = tournaments::insert_participation(&tx, tournament_id, player_id, Utc::now())?;
        outbox.push(
            player_id,
            NoticeKind::TournamentJoined,
            format!(
                "You joined {} ({}/{} players).",
                tournament.name, seats_taken, tournament.max_players
            ),
        );

        if seats_taken >= tournament.max_players && tournaments::close_if_open(&tx, tournament_id)? {
            self.engine.generate(&tx, &tournament, &mut outbox)?;
        }

        tx.commit()?;
        flush(self.sink.as_ref(), conn, outbox);

        info!(
            "Player {} joined tournament {} ({}/{})",
            player_id, tournament_id, seats_taken, tournament.max_players
        );
        Ok(participation)
    }

    pub fn list(&self, conn: &Connection) -> GameResult<Vec<TournamentDetail>> {
        tournaments::list_all(conn)?
            .into_iter()
            .map(|t| self.describe(conn, t))
            .collect()
    }

    pub fn detail(&self, conn: &Connection, tournament_id: TournamentId) -> GameResult<TournamentDetail> {
        let tournament = load_tournament(conn, tournament_id)?;
        self.describe(conn, tournament)
    }

    pub fn rounds(
        &self,
        conn: &Connection,
        tournament_id: TournamentId,
        viewer: PlayerId,
    ) -> GameResult<Vec<Round>> {
        self.require_participant(conn, tournament_id, viewer)?;
        Ok(rounds::list_rounds(conn, tournament_id)?)
    }

    pub fn round_games(
        &self,
        conn: &Connection,
        tournament_id: TournamentId,
        number: i64,
        viewer: PlayerId,
    ) -> GameResult<Vec<DuelView>> {
        self.require_participant(conn, tournament_id, viewer)?;
        let round = rounds::find_round(conn, tournament_id, number)?
            .ok_or_else(|| GameError::not_found("Round"))?;
        Ok(rounds::list_round_views(conn, round.id)?)
    }

    fn describe(&self, conn: &Connection, tournament: Tournament) -> GameResult<TournamentDetail> {
        let total_rounds = round_count(tournament.max_players).unwrap_or(0);
        let champion = if tournament.is_closed {
            tournaments::find_champion(conn, tournament.id, total_rounds)?
        } else {
            None
        };

        Ok(TournamentDetail {
            state: TournamentState::derive(&tournament, champion.is_some()),
            tournament,
            total_rounds,
            champion,
        })
    }

    fn require_participant(&self, conn: &Connection, tournament_id: TournamentId, viewer: PlayerId) -> GameResult<()> {
        load_tournament(conn, tournament_id)?;
        if tournaments::find_participation(conn, tournament_id, viewer)?.is_none() {
            return Err(GameError::denied("Only participants can view this tournament's bracket."));
        }
        Ok(())
    }
}

fn load_tournament(conn: &Connection, id: TournamentId) -> GameResult<Tournament> {
    tournaments::find_by_id(conn, id)?.ok_or_else(|| GameError::not_found("Tournament"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::SideStats;
    use crate::database::setup::test_connection;
    use crate::services::duel::{DuelService, SideReport};
    use crate::services::testing::{player, seed_player, RecordingSink};

    struct Arena {
        conn: Connection,
        sink: Arc<RecordingSink>,
        tournaments: TournamentService,
        duels: DuelService,
    }

    fn arena() -> Arena {
        let settings = GameSettings::default();
        let sink = Arc::new(RecordingSink::default());
        let engine = Arc::new(BracketEngine::new(&settings));

        Arena {
            conn: test_connection(),
            tournaments: TournamentService::new(settings.clone(), sink.clone(), engine.clone()),
            duels: DuelService::new(settings, sink.clone(), engine),
            sink,
        }
    }

    fn new_tournament(a: &mut Arena, max_players: i64) -> Tournament {
        let request = NewTournament {
            name: "Spring Cup".to_string(),
            description: String::new(),
            max_players,
            word_length: 5,
        };
        a.tournaments.create(&mut a.conn, request).unwrap()
    }

    fn fill(a: &mut Arena, tournament_id: TournamentId, names: &[&str]) -> Vec<PlayerId> {
        names
            .iter()
            .map(|name| {
                let id = seed_player(&a.conn, name);
                a.tournaments.join(&mut a.conn, tournament_id, id).unwrap();
                id
            })
            .collect()
    }

    fn round_duels(a: &Arena, tournament_id: TournamentId, number: i64) -> Vec<crate::database::models::Duel> {
        let round = rounds::find_round(&a.conn, tournament_id, number).unwrap().unwrap();
        rounds::list_round_duels(&a.conn, round.id).unwrap()
    }

    /// Both sides report; player1 of each duel wins on XP.
    fn play(a: &mut Arena, duel: &crate::database::models::Duel) {
        let report = |xp| SideReport {
            stats: SideStats {
                time: 30,
                attempts: 3,
                xp,
            },
            word: Some("crane".to_string()),
        };
        a.duels
            .report_tournament(&mut a.conn, duel.player1_id, duel.id, report(200))
            .unwrap();
        a.duels
            .report_tournament(&mut a.conn, duel.player2_id, duel.id, report(100))
            .unwrap();
    }

    #[test]
    fn create_validates_bracket_size_and_word_length() {
        let mut a = arena();
        let mut request = NewTournament {
            name: "Cup".into(),
            description: String::new(),
            max_players: 6,
            word_length: 5,
        };
        assert!(matches!(a.tournaments.create(&mut a.conn, request.clone()), Err(GameError::Validation(_))));

        request.max_players = 8;
        request.word_length = 12;
        assert!(matches!(a.tournaments.create(&mut a.conn, request), Err(GameError::Validation(_))));
    }

    #[test]
    fn fourth_join_closes_and_seeds_the_bracket() {
        let mut a = arena();
        let t = new_tournament(&mut a, 4);
        let players = fill(&mut a, t.id, &["p0", "p1", "p2", "p3"]);

        let detail = a.tournaments.detail(&a.conn, t.id).unwrap();
        assert!(detail.tournament.is_closed);
        assert_eq!(detail.tournament.num_players, 4);
        assert_eq!(detail.tournament.current_round, 1);
        assert_eq!(detail.state, TournamentState::Closed);

        assert_eq!(rounds::list_rounds(&a.conn, t.id).unwrap().len(), 2);
        let first = round_duels(&a, t.id, 1);
        assert_eq!(first.len(), 2);
        assert_eq!((first[0].player1_id, first[0].player2_id), (players[0], players[1]));
        assert_eq!((first[1].player1_id, first[1].player2_id), (players[2], players[3]));
        assert!(first.iter().all(|d| d.is_tournament_game && d.winner_id.is_none()));
        assert!(round_duels(&a, t.id, 2).is_empty());

        let late = seed_player(&a.conn, "late");
        assert!(matches!(a.tournaments.join(&mut a.conn, t.id, late), Err(GameError::Full)));
    }

    #[test]
    fn join_rejects_duplicates_and_unknown_tournaments() {
        let mut a = arena();
        let t = new_tournament(&mut a, 4);
        let id = seed_player(&a.conn, "solo");

        a.tournaments.join(&mut a.conn, t.id, id).unwrap();
        assert!(matches!(a.tournaments.join(&mut a.conn, t.id, id), Err(GameError::Conflict(_))));
        assert!(matches!(a.tournaments.join(&mut a.conn, 999, id), Err(GameError::Conflict(_))));
        assert_eq!(a.tournaments.detail(&a.conn, t.id).unwrap().tournament.num_players, 1);
    }

    #[test]
    fn settled_first_round_seeds_the_final() {
        let mut a = arena();
        let t = new_tournament(&mut a, 4);
        let players = fill(&mut a, t.id, &["p0", "p1", "p2", "p3"]);

        let first = round_duels(&a, t.id, 1);
        play(&mut a, &first[0]);
        assert!(round_duels(&a, t.id, 2).is_empty());
        assert_eq!(a.tournaments.detail(&a.conn, t.id).unwrap().tournament.current_round, 1);

        play(&mut a, &first[1]);
        let final_round = round_duels(&a, t.id, 2);
        assert_eq!(final_round.len(), 1);
        assert_eq!((final_round[0].player1_id, final_round[0].player2_id), (players[0], players[2]));
        assert_eq!(a.tournaments.detail(&a.conn, t.id).unwrap().tournament.current_round, 2);
    }

    #[test]
    fn final_crowns_the_champion_once() {
        let mut a = arena();
        let t = new_tournament(&mut a, 4);
        let players = fill(&mut a, t.id, &["p0", "p1", "p2", "p3"]);

        for duel in round_duels(&a, t.id, 1) {
            play(&mut a, &duel);
        }
        let before = player(&a.conn, players[0]);
        let final_duel = round_duels(&a, t.id, 2).remove(0);
        play(&mut a, &final_duel);

        let champion = player(&a.conn, players[0]);
        assert_eq!(champion.wins_tournament, 1);
        assert_eq!(champion.wins_pvp, before.wins_pvp + 1);
        assert_eq!(champion.xp, before.xp + 200 + 1000);
        assert_eq!(player(&a.conn, players[2]).wins_tournament, 0);

        assert_eq!(rounds::list_rounds(&a.conn, t.id).unwrap().len(), 2);
        let detail = a.tournaments.detail(&a.conn, t.id).unwrap();
        assert_eq!(detail.state, TournamentState::Complete);
        assert_eq!(detail.champion.as_deref(), Some("p0"));
        assert_eq!(detail.tournament.current_round, 2);

        let won = a.sink.for_player(players[0]);
        assert_eq!(won.iter().filter(|n| n.kind == NoticeKind::TournamentWon).count(), 1);
    }

    #[test]
    fn bracket_is_visible_to_participants_only() {
        let mut a = arena();
        let t = new_tournament(&mut a, 2);
        let players = fill(&mut a, t.id, &["p0", "p1"]);
        let outsider = seed_player(&a.conn, "outsider");

        assert_eq!(a.tournaments.rounds(&a.conn, t.id, players[0]).unwrap().len(), 1);
        assert_eq!(a.tournaments.round_games(&a.conn, t.id, 1, players[1]).unwrap().len(), 1);
        assert!(matches!(
            a.tournaments.rounds(&a.conn, t.id, outsider),
            Err(GameError::PermissionDenied(_))
        ));
        assert!(matches!(
            a.tournaments.round_games(&a.conn, t.id, 2, players[0]),
            Err(GameError::NotFound(_))
        ));
    }

    #[test]
    fn participants_are_notified_of_assignments() {
        let mut a = arena();
        let t = new_tournament(&mut a, 2);
        let players = fill(&mut a, t.id, &["p0", "p1"]);

        for id in players {
            let kinds: Vec<NoticeKind> = a.sink.for_player(id).iter().map(|n| n.kind).collect();
            assert!(kinds.contains(&NoticeKind::TournamentJoined));
            assert!(kinds.contains(&NoticeKind::RoundAssigned));
        }
    }

    #[test]
    fn racing_joins_for_the_last_seat_close_once() {
        use crate::database::connection::TempDatabase;
        use std::sync::Barrier;
        use std::thread;

        let db = TempDatabase::new();
        let pool = db.pool();
        let settings = GameSettings::default();
        let engine = Arc::new(BracketEngine::new(&settings));
        let service = TournamentService::new(settings, Arc::new(RecordingSink::default()), engine);

        let mut conn = pool.get().unwrap();
        let request = NewTournament {
            name: "Final Seat".to_string(),
            description: String::new(),
            max_players: 2,
            word_length: 5,
        };
        let t = service.create(&mut conn, request).unwrap();
        let first = seed_player(&conn, "first");
        service.join(&mut conn, t.id, first).unwrap();
        let rivals = [seed_player(&conn, "rival1"), seed_player(&conn, "rival2")];

        let barrier = Barrier::new(rivals.len());
        let results: Vec<GameResult<Participation>> = thread::scope(|s| {
            let handles: Vec<_> = rivals
                .iter()
                .map(|&rival| {
                    let (pool, barrier, service) = (&pool, &barrier, &service);
                    s.spawn(move || {
                        let mut conn = pool.get().unwrap();
                        barrier.wait();
                        service.join(&mut conn, t.id, rival)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| matches!(r, Err(GameError::Full))).count(), 1);

        let detail = service.detail(&conn, t.id).unwrap();
        assert!(detail.tournament.is_closed);
        assert_eq!(detail.tournament.num_players, 2);

        let bracket = rounds::list_rounds(&conn, t.id).unwrap();
        assert_eq!(bracket.len(), 1);
        assert_eq!(rounds::list_round_duels(&conn, bracket[0].id).unwrap().len(), 1);
    }
}

pub mod bracket;
pub mod classic;
pub mod duel;
pub mod identity;
pub mod ledger;
pub mod notifications;
pub mod server;
pub mod tournament;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use crate::config::AppConfig;
use bracket::BracketEngine;
use classic::ClassicService;
use duel::DuelService;
use identity::IdentityService;
use notifications::NotificationSink;
use tournament::TournamentService;

/// Every game service, wired to one notification sink and one bracket engine.
pub struct GameServices {
    pub identity: IdentityService,
    pub classics: ClassicService,
    pub duels: DuelService,
    pub tournaments: TournamentService,
    pub sink: Arc<dyn NotificationSink>,
}

impl GameServices {
    pub fn new(config: &AppConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let engine = Arc::new(BracketEngine::new(&config.game));

        Self {
            identity: IdentityService::new(config.auth.clone()),
            classics: ClassicService::new(config.game.clone()),
            duels: DuelService::new(config.game.clone(), sink.clone(), engine.clone()),
            tournaments: TournamentService::new(config.game.clone(), sink.clone(), engine),
            sink,
        }
    }
}

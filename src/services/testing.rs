use std::sync::Mutex;

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use super::duel::SettlementHook;
use super::notifications::{Notice, NotificationSink, Outbox};
use crate::database::models::{Duel, Player, PlayerId};
use crate::errors::GameResult;
use crate::database::{players, users};

pub fn seed_player(conn: &Connection, username: &str) -> PlayerId {
    let user = users::insert_user(conn, username, Utc::now()).unwrap();
    players::insert_player(conn, user.id).unwrap().id
}

pub fn player(conn: &Connection, id: PlayerId) -> Player {
    players::find_by_id(conn, id).unwrap().unwrap()
}

#[derive(Default)]
pub struct RecordingSink {
    pub delivered: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn for_player(&self, id: PlayerId) -> Vec<Notice> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.recipient == id)
            .cloned()
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, _conn: &Connection, notice: &Notice) -> Result<()> {
        self.delivered.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Settlement hook for duels outside any bracket.
pub struct NoFollowUp;

impl SettlementHook for NoFollowUp {
    fn on_settled(&self, _conn: &Connection, _duel: &Duel, _outbox: &mut Outbox) -> GameResult<()> {
        Ok(())
    }
}

use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::database::models::PlayerId;
use crate::database::notifications;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Challenge,
    DuelResult,
    TournamentJoined,
    RoundAssigned,
    TournamentWon,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Challenge => "challenge",
            NoticeKind::DuelResult => "duel_result",
            NoticeKind::TournamentJoined => "tournament_joined",
            NoticeKind::RoundAssigned => "round_assigned",
            NoticeKind::TournamentWon => "tournament_won",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub recipient: PlayerId,
    pub kind: NoticeKind,
    pub text: String,
}

/// Notices produced while a transaction is open. They are only handed to a
/// sink after commit, so no lock is held while delivering them.
#[derive(Debug, Default)]
pub struct Outbox {
    notices: Vec<Notice>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, recipient: PlayerId, kind: NoticeKind, text: impl Into<String>) {
        self.notices.push(Notice {
            recipient,
            kind,
            text: text.into(),
        });
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

pub trait NotificationSink: Send + Sync {
    fn deliver(&self, conn: &Connection, notice: &Notice) -> Result<()>;
}

/// Appends notices to the `notifications` table; clients poll it.
pub struct StoredNotifications;

impl NotificationSink for StoredNotifications {
    fn deliver(&self, conn: &Connection, notice: &Notice) -> Result<()> {
        notifications::insert_notification(
            conn,
            notice.recipient,
            notice.kind.as_str(),
            &notice.text,
            Utc::now(),
        )
        .map(|_| ())
    }
}

/// Best effort: a failed delivery is logged and skipped.
pub fn flush(sink: &dyn NotificationSink, conn: &Connection, outbox: Outbox) {
    for notice in outbox.notices {
        if let Err(e) = sink.deliver(conn, &notice) {
            log::warn!(
                "Dropping {} notification for player {}: {:?}",
                notice.kind.as_str(),
                notice.recipient,
                e
            );
        }
    }
}

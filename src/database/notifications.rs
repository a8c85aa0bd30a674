use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::models::{Notification, PlayerId};

pub fn insert_notification(
    conn: &Connection,
    player_id: PlayerId,
    kind: &str,
    text: &str,
    created_at: DateTime<Utc>,
) -> Result<Notification> {
    let sql = "INSERT INTO notifications (player_id, kind, text, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING id, player_id, kind, text, created_at";

    conn.query_row(sql, params![player_id, kind, text, created_at], parse_notification_row)
        .context("Failed to insert notification")
}

fn parse_notification_row(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        player_id: row.get(1)?,
        kind: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn list_for_player(conn: &Connection, player_id: PlayerId, limit: usize) -> Result<Vec<Notification>> {
    let sql = "SELECT id, player_id, kind, text, created_at FROM notifications WHERE player_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![player_id, limit as i64], parse_notification_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Deletes the notification only if it belongs to `player_id`.
pub fn delete_for_player(conn: &Connection, id: i64, player_id: PlayerId) -> Result<bool> {
    let changed = conn
        .execute(
            "DELETE FROM notifications WHERE id = ?1 AND player_id = ?2",
            params![id, player_id],
        )
        .context("Failed to delete notification")?;

    Ok(changed == 1)
}

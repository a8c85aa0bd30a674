use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use std::sync::Arc;

use super::{ApiPath, AppState};
use crate::api::models::NotificationResponse;
use crate::database;
use crate::errors::GameError;

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<NotificationResponse>>, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let notifications =
        database::notifications::list_for_player(&conn, player.id, state.config.game.page_size)?;
    Ok(Json(notifications.into_iter().map(NotificationResponse::from).collect()))
}

pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(notification_id): ApiPath<i64>,
) -> Result<StatusCode, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    if !database::notifications::delete_for_player(&conn, notification_id, player.id)? {
        return Err(GameError::not_found("Notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}

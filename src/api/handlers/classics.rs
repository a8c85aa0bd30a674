use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use std::sync::Arc;

use super::{ApiJson, AppState};
use crate::api::models::{ClassicRequest, ClassicResponse};
use crate::errors::GameError;

pub async fn create_classic(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ClassicRequest>,
) -> Result<(StatusCode, Json<ClassicResponse>), GameError> {
    let mut conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let session = state.services.classics.record(&mut conn, player.id, body.into())?;
    Ok((StatusCode::CREATED, Json(ClassicResponse::from(session))))
}

pub async fn list_classics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<ClassicResponse>>, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let sessions = state.services.classics.history(&conn, player.id)?;
    Ok(Json(sessions.into_iter().map(ClassicResponse::from).collect()))
}

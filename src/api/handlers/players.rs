use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
};
use std::sync::Arc;

use super::{ApiQuery, AppState, PageParams};
use crate::api::models::PlayerResponse;
use crate::database;
use crate::errors::GameError;

pub async fn get_players(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Vec<PlayerResponse>>, GameError> {
    let conn = state.connection()?;
    state.authenticate(&conn, &headers)?;

    let page_size = state.config.game.page_size;
    let players = database::players::list_leaderboard(&conn, page_size, params.offset(page_size))?;

    Ok(Json(players.into_iter().map(PlayerResponse::from).collect()))
}

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PlayerResponse>, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?.clone();

    Ok(Json(PlayerResponse::from(player)))
}

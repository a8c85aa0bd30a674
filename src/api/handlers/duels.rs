use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{ApiJson, ApiPath, AppState};
use crate::api::models::{
    ChallengeRequest, DuelResponse, MessageResponse, ResponseRequest, TournamentReportRequest,
    WinnerResponse,
};
use crate::database::GameId;
use crate::errors::GameError;

pub async fn create_duel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ChallengeRequest>,
) -> Result<(StatusCode, Json<DuelResponse>), GameError> {
    let mut conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let challenger = identity.require_player()?;

    let view = state.services.duels.challenge(&mut conn, challenger, body.into())?;
    Ok((StatusCode::CREATED, Json(DuelResponse::from(view))))
}

pub async fn get_duel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(duel_id): ApiPath<GameId>,
) -> Result<Json<DuelResponse>, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let viewer = identity.require_player()?;

    let view = state.services.duels.get(&conn, viewer.id, duel_id)?;
    Ok(Json(DuelResponse::from(view)))
}

pub async fn list_completed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<DuelResponse>>, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let duels = state.services.duels.completed(&conn, player.id)?;
    Ok(Json(duels.into_iter().map(DuelResponse::from).collect()))
}

pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<DuelResponse>>, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let duels = state.services.duels.pending(&conn, player.id)?;
    Ok(Json(duels.into_iter().map(DuelResponse::from).collect()))
}

/// The challenged player's answer to a standalone duel.
pub async fn respond_to_duel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(duel_id): ApiPath<GameId>,
    ApiJson(body): ApiJson<ResponseRequest>,
) -> Result<Json<WinnerResponse>, GameError> {
    let mut conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let view = state
        .services
        .duels
        .report_open(&mut conn, player.id, duel_id, body.stats())?;

    let winner = view
        .winner_username
        .ok_or_else(|| GameError::Storage(anyhow::anyhow!("duel {duel_id} settled without a winner")))?;
    Ok(Json(WinnerResponse { winner }))
}

/// One side of a bracket duel. Answers with the winner once both sides are in.
pub async fn report_tournament_duel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(duel_id): ApiPath<GameId>,
    ApiJson(body): ApiJson<TournamentReportRequest>,
) -> Result<Response, GameError> {
    let mut conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let side = state.services.duels.side_of(&conn, duel_id, player.id)?;
    let report = body.into_report(side)?;
    let outcome = state
        .services
        .duels
        .report_tournament(&mut conn, player.id, duel_id, report)?;

    let response = match outcome.duel.winner_username {
        Some(winner) if outcome.settled => Json(WinnerResponse { winner }).into_response(),
        _ => Json(MessageResponse {
            message: "Game updated successfully.".to_string(),
        })
        .into_response(),
    };
    Ok(response)
}

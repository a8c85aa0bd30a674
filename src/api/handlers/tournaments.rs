use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use std::sync::Arc;

use super::{ApiPath, AppState};
use crate::api::models::{DuelResponse, ParticipationResponse, RoundResponse, TournamentResponse};
use crate::database::TournamentId;
use crate::errors::GameError;

pub async fn list_tournaments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TournamentResponse>>, GameError> {
    let conn = state.connection()?;
    state.authenticate(&conn, &headers)?;

    let tournaments = state.services.tournaments.list(&conn)?;
    Ok(Json(tournaments.into_iter().map(TournamentResponse::from).collect()))
}

pub async fn get_tournament(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(tournament_id): ApiPath<TournamentId>,
) -> Result<Json<TournamentResponse>, GameError> {
    let conn = state.connection()?;
    state.authenticate(&conn, &headers)?;

    let detail = state.services.tournaments.detail(&conn, tournament_id)?;
    Ok(Json(TournamentResponse::from(detail)))
}

pub async fn join_tournament(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(tournament_id): ApiPath<TournamentId>,
) -> Result<(StatusCode, Json<ParticipationResponse>), GameError> {
    let mut conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let participation = state
        .services
        .tournaments
        .join(&mut conn, tournament_id, player.id)?;
    Ok((StatusCode::CREATED, Json(ParticipationResponse::from(participation))))
}

pub async fn list_rounds(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath(tournament_id): ApiPath<TournamentId>,
) -> Result<Json<Vec<RoundResponse>>, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let rounds = state.services.tournaments.rounds(&conn, tournament_id, player.id)?;
    Ok(Json(rounds.into_iter().map(RoundResponse::from).collect()))
}

pub async fn list_round_games(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiPath((tournament_id, number)): ApiPath<(TournamentId, i64)>,
) -> Result<Json<Vec<DuelResponse>>, GameError> {
    let conn = state.connection()?;
    let identity = state.authenticate(&conn, &headers)?;
    let player = identity.require_player()?;

    let duels = state
        .services
        .tournaments
        .round_games(&conn, tournament_id, number, player.id)?;
    Ok(Json(duels.into_iter().map(DuelResponse::from).collect()))
}

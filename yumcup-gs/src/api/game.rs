//! Game protocol handlers
//!
//! Thin translation between JSON and the engine. Handlers never retry:
//! a failed start is the caller's decision to re-issue.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::info;
use yumcup_common::api::{
    CompleteBody, GameSummary, LocationRequest, NextMatchBody, SelectRequest, SelectResponse,
    StartResponse, StatsResponse,
};
use yumcup_common::{Candidate, Coordinates, Error};

use crate::engine::{Bracket, Outcome};
use crate::error::ApiResult;
use crate::AppState;

fn start_response(bracket: &Bracket) -> ApiResult<StartResponse> {
    let current = bracket.current_match().ok_or_else(|| {
        Error::Internal(format!("new game {} has no match", bracket.game_id()))
    })?;
    Ok(StartResponse {
        game_id: bracket.game_id().to_string(),
        current_match: current.to_view(),
        current_round: bracket.round(),
        match_in_round: bracket.match_in_round(),
        matches_in_round: bracket.matches_in_round(),
        status: bracket.status(),
    })
}

/// POST /api/yumcup/start/location
///
/// Search around the caller's position and start a bracket.
pub async fn start_location(
    State(state): State<AppState>,
    payload: Result<Json<LocationRequest>, JsonRejection>,
) -> ApiResult<Json<StartResponse>> {
    let Json(request) = payload?;
    info!(
        latitude = request.latitude,
        longitude = request.longitude,
        radius = request.radius,
        "Location-based start requested"
    );
    let center = Coordinates::new(request.latitude, request.longitude);
    let bracket = state.seeder.seed(center, request.radius).await?;
    Ok(Json(start_response(&bracket)?))
}

/// POST /api/yumcup/select
///
/// Resolve the current match and return the next one or the winner.
pub async fn select_winner(
    State(state): State<AppState>,
    payload: Result<Json<SelectRequest>, JsonRejection>,
) -> ApiResult<Json<SelectResponse>> {
    let Json(request) = payload?;
    let advance = state
        .registry
        .select(&request.game_id, &request.match_id, &request.winner_id)
        .await?;

    let response = match advance.outcome {
        Outcome::NextMatch(next) => SelectResponse::Next(NextMatchBody {
            next_match: next.to_view(),
            current_round: advance.bracket.round(),
            match_in_round: advance.bracket.match_in_round(),
            matches_in_round: advance.bracket.matches_in_round(),
        }),
        Outcome::Champion(winner) => SelectResponse::Complete(CompleteBody { winner }),
    };
    Ok(Json(response))
}

/// GET /api/yumcup/start
///
/// Stateless variant: the candidate list around the configured default
/// location. The caller runs the bracket itself.
pub async fn start_legacy(State(state): State<AppState>) -> ApiResult<Json<Vec<Candidate>>> {
    let candidates = state
        .seeder
        .candidates(state.legacy.center(), state.legacy.radius)
        .await?;
    Ok(Json(candidates))
}

/// GET /api/yumcup/games/:game_id
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> ApiResult<Json<GameSummary>> {
    let bracket = state.registry.snapshot(&game_id).await?;
    Ok(Json(bracket.summary()))
}

/// GET /api/yumcup/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.registry.stats().await)
}

/// Build game protocol routes
pub fn game_routes() -> Router<AppState> {
    Router::new()
        .route("/api/yumcup/start/location", post(start_location))
        .route("/api/yumcup/select", post(select_winner))
        .route("/api/yumcup/start", get(start_legacy))
        .route("/api/yumcup/games/:game_id", get(get_game))
        .route("/api/yumcup/stats", get(get_stats))
}

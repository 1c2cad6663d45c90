use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use validator::Validate;

use crate::{
    dto::board::{
        BoardView, RallyRequest, RallyResponse, ServePickRequest, SetupRequest, TallyView,
        TimeoutRequest, TimeoutResponse, UndoResponse,
    },
    error::AppError,
    services::board_service,
    state::{SharedState, rally::UiTeam},
};

/// Scoring, undo, tally and pre-match setup endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/board", get(get_board))
        .route("/board/rally/start", post(start_rally))
        .route("/board/rally", post(record_rally))
        .route("/board/undo", post(undo))
        .route("/board/reset", post(reset))
        .route("/board/timeouts", post(call_timeout))
        .route("/board/tally/{team}", get(get_tally))
        .route("/board/setup", put(update_setup))
        .route("/board/setup/serve", post(pick_serve))
        .route("/board/setup/swap-sides", post(swap_sides))
        .route("/board/setup/swap-rows/{team}", post(swap_rows))
}

#[utoipa::path(
    get,
    path = "/board",
    tag = "board",
    responses((status = 200, description = "Current board", body = BoardView))
)]
/// Return the board as currently displayed.
pub async fn get_board(State(state): State<SharedState>) -> Json<BoardView> {
    Json(board_service::get_board(&state).await)
}

#[utoipa::path(
    post,
    path = "/board/rally/start",
    tag = "board",
    responses(
        (status = 200, description = "Ball in play", body = BoardView),
        (status = 409, description = "Rally already live, game over or setup incomplete")
    )
)]
/// Put the ball in play.
pub async fn start_rally(State(state): State<SharedState>) -> Result<Json<BoardView>, AppError> {
    Ok(Json(board_service::start_rally(&state).await?))
}

#[utoipa::path(
    post,
    path = "/board/rally",
    tag = "board",
    request_body = RallyRequest,
    responses(
        (status = 200, description = "Rally recorded", body = RallyResponse),
        (status = 409, description = "No rally in play")
    )
)]
/// Record which panel won the live rally.
pub async fn record_rally(
    State(state): State<SharedState>,
    Json(payload): Json<RallyRequest>,
) -> Result<Json<RallyResponse>, AppError> {
    Ok(Json(board_service::record_rally(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/board/undo",
    tag = "board",
    responses((status = 200, description = "Most recent action reverted", body = UndoResponse))
)]
/// Revert the most recent timeout, rally or setup edit.
pub async fn undo(State(state): State<SharedState>) -> Json<UndoResponse> {
    Json(board_service::undo(&state).await)
}

#[utoipa::path(
    post,
    path = "/board/reset",
    tag = "board",
    responses((status = 200, description = "Fresh match", body = BoardView))
)]
/// Discard the current match.
pub async fn reset(State(state): State<SharedState>) -> Json<BoardView> {
    Json(board_service::reset(&state).await)
}

#[utoipa::path(
    post,
    path = "/board/timeouts",
    tag = "board",
    request_body = TimeoutRequest,
    responses(
        (status = 200, description = "Timeout recorded", body = TimeoutResponse),
        (status = 409, description = "Match not started or rally in play")
    )
)]
/// Call a timeout for a panel.
pub async fn call_timeout(
    State(state): State<SharedState>,
    Json(payload): Json<TimeoutRequest>,
) -> Result<Json<TimeoutResponse>, AppError> {
    Ok(Json(board_service::call_timeout(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/board/tally/{team}",
    tag = "board",
    params(("team" = UiTeam, Path, description = "Panel letter, `A` or `B`")),
    responses((status = 200, description = "Tally row", body = TallyView))
)]
/// Return the tally row of a panel, rebuilt from the rally history.
pub async fn get_tally(
    State(state): State<SharedState>,
    Path(team): Path<UiTeam>,
) -> Json<TallyView> {
    Json(board_service::tally(&state, team).await)
}

#[utoipa::path(
    put,
    path = "/board/setup",
    tag = "setup",
    request_body = SetupRequest,
    responses(
        (status = 200, description = "Setup updated", body = BoardView),
        (status = 400, description = "Invalid names or point target"),
        (status = 409, description = "Match already started")
    )
)]
/// Edit division, names or point target before the match.
pub async fn update_setup(
    State(state): State<SharedState>,
    Json(payload): Json<SetupRequest>,
) -> Result<Json<BoardView>, AppError> {
    payload.validate()?;
    Ok(Json(board_service::update_setup(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/board/setup/serve",
    tag = "setup",
    request_body = ServePickRequest,
    responses(
        (status = 200, description = "Serve pick updated", body = BoardView),
        (status = 409, description = "Match already started")
    )
)]
/// Pick or clear the opening serve corner.
pub async fn pick_serve(
    State(state): State<SharedState>,
    Json(payload): Json<ServePickRequest>,
) -> Result<Json<BoardView>, AppError> {
    Ok(Json(board_service::pick_serve(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/board/setup/swap-sides",
    tag = "setup",
    responses(
        (status = 200, description = "Sides swapped", body = BoardView),
        (status = 409, description = "Match already started")
    )
)]
/// Change ends before the match.
pub async fn swap_sides(State(state): State<SharedState>) -> Result<Json<BoardView>, AppError> {
    Ok(Json(board_service::swap_sides(&state).await?))
}

#[utoipa::path(
    post,
    path = "/board/setup/swap-rows/{team}",
    tag = "setup",
    params(("team" = UiTeam, Path, description = "Panel letter, `A` or `B`")),
    responses(
        (status = 200, description = "Rows swapped", body = BoardView),
        (status = 409, description = "Match already started")
    )
)]
/// Swap the two players of a panel before the match.
pub async fn swap_rows(
    State(state): State<SharedState>,
    Path(team): Path<UiTeam>,
) -> Result<Json<BoardView>, AppError> {
    Ok(Json(board_service::swap_rows(&state, team).await?))
}

//! Scoreboard operations behind the REST routes.
//!
//! Each operation holds the board's write guard for exactly one core call,
//! then commits: the snapshot goes to the persistence writer, the overlay
//! push is spawned and the new board is broadcast. None of these can fail
//! the operation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    dao::{match_store::MatchStore, models::PersistedMatch},
    dto::{
        board::{
            BoardView, RallyRequest, RallyResponse, ServePickRequest, SetupRequest, TallyView,
            TimeoutRequest, TimeoutResponse, UndoResponse,
        },
        overlay::OverlayState,
    },
    error::ServiceError,
    services::{persistence::PersistCommand, sse_events},
    state::{
        SharedState,
        board::{BoardError, PointsTarget, Scoreboard, SetupUpdate},
        rally::UiTeam,
        tally,
        undo::UndoOutcome,
    },
};

/// Current board.
pub async fn get_board(state: &SharedState) -> BoardView {
    let board = state.board().read().await;
    BoardView::from(&*board)
}

/// Put the ball in play once names and server are set.
pub async fn start_rally(state: &SharedState) -> Result<BoardView, ServiceError> {
    let ((), view) = mutate(state, Scoreboard::start_rally).await?;
    Ok(view)
}

/// Record the winner of the live rally.
pub async fn record_rally(
    state: &SharedState,
    request: RallyRequest,
) -> Result<RallyResponse, ServiceError> {
    let (outcome, board) = mutate(state, |board| board.record_rally(request.winner)).await?;
    debug!(winner = ?request.winner, ?outcome, "rally recorded");
    Ok(RallyResponse { outcome, board })
}

/// Revert the most recent action.
pub async fn undo(state: &SharedState) -> UndoResponse {
    let (outcome, board, commit) = {
        let mut guard = state.board().write().await;
        let outcome = guard.undo();
        let commit = (outcome != UndoOutcome::Nothing).then(|| Commit::capture(&*guard));
        (outcome, BoardView::from(&*guard), commit)
    };
    if let Some(commit) = commit {
        commit.publish(state, &board);
    }
    UndoResponse { outcome, board }
}

/// Discard the match and start over.
pub async fn reset(state: &SharedState) -> BoardView {
    let (previous_id, view, overlay) = {
        let mut board = state.board().write().await;
        let previous_id = board.id();
        board.reset();
        (
            previous_id,
            BoardView::from(&*board),
            OverlayState::from(&*board),
        )
    };

    info!(%previous_id, match_id = %view.id, "match reset");
    state.queue_persist(PersistCommand::Clear);
    state.overlay().publish(overlay);
    sse_events::broadcast_board_reset(state, previous_id, view.clone());
    view
}

/// Call a timeout between rallies.
pub async fn call_timeout(
    state: &SharedState,
    request: TimeoutRequest,
) -> Result<TimeoutResponse, ServiceError> {
    let (box_index, board) = mutate(state, |board| board.call_timeout(request.team)).await?;
    Ok(TimeoutResponse { box_index, board })
}

/// Printed tally row of `team`.
pub async fn tally(state: &SharedState, team: UiTeam) -> TallyView {
    let board = state.board().read().await;
    let points = board.config().points_to_win;
    let tally = board.tally(team);
    TallyView {
        team,
        score: board.score_of(team),
        boxes: tally::tally_boxes(&tally, points.points(), points.mid_point()),
    }
}

/// Apply a validated setup edit.
pub async fn update_setup(
    state: &SharedState,
    request: SetupRequest,
) -> Result<BoardView, ServiceError> {
    let points_to_win = request
        .points_to_win
        .map(PointsTarget::try_from)
        .transpose()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
    let update = SetupUpdate {
        division: request.division.map(|division| division.trim().to_string()),
        players: request.players,
        points_to_win,
    };

    let ((), view) = mutate(state, |board| board.update_setup(update)).await?;
    Ok(view)
}

/// Toggle an opening serve corner.
pub async fn pick_serve(
    state: &SharedState,
    request: ServePickRequest,
) -> Result<BoardView, ServiceError> {
    let ((), view) = mutate(state, |board| {
        board.pick_serve(request.corner, request.checked)
    })
    .await?;
    Ok(view)
}

/// Change ends before the match.
pub async fn swap_sides(state: &SharedState) -> Result<BoardView, ServiceError> {
    let ((), view) = mutate(state, Scoreboard::swap_sides).await?;
    Ok(view)
}

/// Swap the two players of `team` before the match.
pub async fn swap_rows(state: &SharedState, team: UiTeam) -> Result<BoardView, ServiceError> {
    let ((), view) = mutate(state, |board| board.swap_team_rows(team)).await?;
    Ok(view)
}

/// Load the stored match into a pristine board.
///
/// Returns `true` when a stored match replaced the in-memory board. A stored
/// document that cannot be rebuilt is discarded and the board stays fresh.
pub async fn restore_from_store(
    state: &SharedState,
    store: &Arc<dyn MatchStore>,
) -> Result<bool, ServiceError> {
    let Some(stored) = store.load().await? else {
        return Ok(false);
    };

    let restored = match Scoreboard::try_from(stored) {
        Ok(board) => board,
        Err(err) => {
            warn!(error = %err, "stored match is inconsistent; starting a fresh board");
            return Ok(false);
        }
    };

    let view = {
        let mut board = state.board().write().await;
        if board.can_undo() {
            debug!("board already in use; keeping it over the stored match");
            return Ok(false);
        }
        *board = restored;
        BoardView::from(&*board)
    };

    info!(match_id = %view.id, rallies = view.rally_count, "restored stored match");
    sse_events::broadcast_board_updated(state, &view);
    Ok(true)
}

struct Commit {
    snapshot: PersistedMatch,
    overlay: OverlayState,
}

impl Commit {
    fn capture(board: &Scoreboard) -> Self {
        Self {
            snapshot: PersistedMatch::from(board),
            overlay: OverlayState::from(board),
        }
    }

    fn publish(self, state: &SharedState, view: &BoardView) {
        state.queue_persist(PersistCommand::Save(Box::new(self.snapshot)));
        state.overlay().publish(self.overlay);
        sse_events::broadcast_board_updated(state, view);
    }
}

async fn mutate<T, F>(state: &SharedState, op: F) -> Result<(T, BoardView), ServiceError>
where
    F: FnOnce(&mut Scoreboard) -> Result<T, BoardError>,
{
    let (value, view, commit) = {
        let mut board = state.board().write().await;
        let value = op(&mut *board)?;
        (value, BoardView::from(&*board), Commit::capture(&*board))
    };
    commit.publish(state, &view);
    Ok((value, view))
}

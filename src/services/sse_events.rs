use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        board::BoardView,
        sse::{BoardResetEvent, Handshake, ServerEvent, SystemStatus},
    },
    state::SharedState,
};

const EVENT_BOARD_UPDATED: &str = "board.updated";
const EVENT_BOARD_RESET: &str = "board.reset";
const EVENT_SYSTEM_STATUS: &str = "system.status";
const EVENT_HANDSHAKE: &str = "handshake";

/// Broadcast the board after any change.
pub fn broadcast_board_updated(state: &SharedState, board: &BoardView) {
    send_public_event(state, EVENT_BOARD_UPDATED, board);
}

/// Broadcast that the previous match was discarded.
pub fn broadcast_board_reset(state: &SharedState, previous_id: Uuid, board: BoardView) {
    let payload = BoardResetEvent { previous_id, board };
    send_public_event(state, EVENT_BOARD_RESET, &payload);
}

/// Broadcast the degraded flag.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// First event of a fresh public stream.
pub fn handshake_event(degraded: bool, board: BoardView) -> Option<ServerEvent> {
    let payload = Handshake {
        stream: "public".into(),
        degraded,
        board,
    };
    match ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE handshake");
            None
        }
    }
}

/// Relay degraded mode changes to SSE subscribers for as long as the state lives.
pub async fn forward_degraded_changes(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        info!(degraded, "storage status changed");
        broadcast_system_status(&state, degraded);
    }
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, board::Scoreboard},
    };

    #[tokio::test]
    async fn board_updates_reach_subscribers() {
        let (state, _receiver) = AppState::new(AppConfig {
            overlay_endpoint: None,
            ..AppConfig::default()
        });
        let mut subscriber = state.public_sse().subscribe();

        let view = BoardView::from(&Scoreboard::new());
        broadcast_board_updated(&state, &view);

        let event = subscriber.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_BOARD_UPDATED));
        let data: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data["score_call"], "0 - 0 - 2");
    }

    #[test]
    fn handshake_carries_board_and_status() {
        let event = handshake_event(true, BoardView::from(&Scoreboard::new())).unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_HANDSHAKE));
        let data: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data["stream"], "public");
        assert_eq!(data["degraded"], true);
        assert_eq!(data["board"]["points_to_win"], 11);
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::validation::{validate_players, validate_points_target},
    state::{
        board::{MatchPhase, RallyStatus, Scoreboard},
        rally::{Badges, Corner, Orientation, Players, RallyOutcome, ServePick, UiTeam},
        tally::TallyBox,
        undo::UndoOutcome,
    },
};

/// Longest accepted division label.
pub const DIVISION_MAX_LEN: u64 = 80;

/// Points per panel.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoresView {
    /// Points of panel `A`.
    #[serde(rename = "A")]
    pub a: u32,
    /// Points of panel `B`.
    #[serde(rename = "B")]
    pub b: u32,
}

/// Timeout presses per panel as tally box indices.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TimeoutsView {
    /// Presses of panel `A`.
    #[serde(rename = "A")]
    pub a: Vec<u32>,
    /// Presses of panel `B`.
    #[serde(rename = "B")]
    pub b: Vec<u32>,
}

/// Everything a front end needs to draw the board.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BoardView {
    pub id: Uuid,
    pub division: String,
    pub points_to_win: u32,
    pub mid_point: u32,
    pub phase: MatchPhase,
    pub started: bool,
    pub rally_live: bool,
    pub status: RallyStatus,
    pub game_over: bool,
    /// All four names set and a server picked.
    pub ready: bool,
    pub can_undo: bool,
    pub players: Players,
    pub orientation: Orientation,
    pub badges: Badges,
    pub serve_pick: ServePick,
    pub autoswap_done: bool,
    pub scores: ScoresView,
    /// Panel of the team on serve; unset until a server is picked.
    pub serving_team: Option<UiTeam>,
    /// Active hand (1 or 2).
    pub hand: u8,
    /// Spoken score call, `server - receiver - hand`.
    pub score_call: String,
    pub timeouts: TimeoutsView,
    pub rally_count: usize,
}

impl From<&Scoreboard> for BoardView {
    fn from(board: &Scoreboard) -> Self {
        let rally = board.rally();
        let engine = rally.engine();
        let config = board.config();
        let lifecycle = board.lifecycle();
        let serving_team = rally
            .server_picked()
            .then(|| rally.mapping().ui(engine.server()));

        Self {
            id: board.id(),
            division: config.division.clone(),
            points_to_win: config.points_to_win.points(),
            mid_point: config.points_to_win.mid_point(),
            phase: lifecycle.phase,
            started: lifecycle.started,
            rally_live: lifecycle.rally_live,
            status: lifecycle.status,
            game_over: board.game_over(),
            ready: board.players_ready() && rally.server_picked(),
            can_undo: board.can_undo(),
            players: rally.players(),
            orientation: rally.orientation(),
            badges: rally.badges(),
            serve_pick: rally.serve_pick(),
            autoswap_done: rally.autoswap_done(),
            scores: ScoresView {
                a: board.score_of(UiTeam::A),
                b: board.score_of(UiTeam::B),
            },
            serving_team,
            hand: engine.hand().as_raw(),
            score_call: engine.score_call(),
            timeouts: TimeoutsView {
                a: board.timeouts().get(UiTeam::A).to_vec(),
                b: board.timeouts().get(UiTeam::B).to_vec(),
            },
            rally_count: engine.rally_count(),
        }
    }
}

/// Rally result reported by the operator.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RallyRequest {
    /// Panel that won the rally.
    pub winner: UiTeam,
}

/// Timeout call.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TimeoutRequest {
    /// Panel calling the timeout.
    pub team: UiTeam,
}

/// Opening serve corner toggle.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ServePickRequest {
    /// Corner being toggled.
    pub corner: Corner,
    /// Whether the corner is now picked.
    #[serde(default = "default_checked")]
    pub checked: bool,
}

fn default_checked() -> bool {
    true
}

/// Partial setup edit; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct SetupRequest {
    /// Division or title shown above the board.
    #[validate(length(max = DIVISION_MAX_LEN))]
    pub division: Option<String>,
    /// All four name slots.
    #[validate(custom(function = "validate_players"))]
    pub players: Option<Players>,
    /// Game length, 11 or 15.
    #[validate(custom(function = "validate_points_target"))]
    pub points_to_win: Option<u32>,
}

/// Result of a recorded rally.
#[derive(Debug, Serialize, ToSchema)]
pub struct RallyResponse {
    pub outcome: RallyOutcome,
    pub board: BoardView,
}

/// Result of an undo request.
#[derive(Debug, Serialize, ToSchema)]
pub struct UndoResponse {
    pub outcome: UndoOutcome,
    pub board: BoardView,
}

/// Result of a timeout call.
#[derive(Debug, Serialize, ToSchema)]
pub struct TimeoutResponse {
    /// Tally box the timeout is drawn above.
    pub box_index: u32,
    pub board: BoardView,
}

/// Printed tally row of one panel.
#[derive(Debug, Serialize, ToSchema)]
pub struct TallyView {
    pub team: UiTeam,
    pub score: u32,
    pub boxes: Vec<TallyBox>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::SetupUpdate;

    #[test]
    fn fresh_board_view() {
        let view = BoardView::from(&Scoreboard::new());
        assert_eq!(view.score_call, "0 - 0 - 2");
        assert_eq!(view.serving_team, None);
        assert!(!view.ready);
        assert!(!view.can_undo);
        assert_eq!(view.points_to_win, 11);
        assert_eq!(view.mid_point, 6);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "none");
        assert_eq!(json["phase"], "setup");
        assert_eq!(json["scores"]["A"], 0);
    }

    #[test]
    fn view_reports_serving_panel_and_scores() {
        let mut board = Scoreboard::new();
        board
            .update_setup(SetupUpdate {
                players: Some(Players {
                    a: ["Ann".into(), "Abe".into()],
                    b: ["Bea".into(), "Bob".into()],
                }),
                ..SetupUpdate::default()
            })
            .unwrap();
        board.pick_serve(Corner::TopRight, true).unwrap();
        board.start_rally().unwrap();
        board.record_rally(UiTeam::B).unwrap();

        let view = BoardView::from(&board);
        assert!(view.ready);
        assert_eq!(view.serving_team, Some(UiTeam::B));
        assert_eq!(view.scores.b, 1);
        assert_eq!(view.scores.a, 0);
        assert_eq!(view.score_call, "1 - 0 - 2");
        assert_eq!(serde_json::to_value(&view).unwrap()["status"], "point");
    }

    #[test]
    fn setup_request_validation() {
        let ok: SetupRequest =
            serde_json::from_str(r#"{"division": "Open", "points_to_win": 15}"#).unwrap();
        assert!(ok.validate().is_ok());

        let bad_target: SetupRequest = serde_json::from_str(r#"{"points_to_win": 21}"#).unwrap();
        assert!(bad_target.validate().is_err());

        let long = SetupRequest {
            division: Some("x".repeat(81)),
            ..SetupRequest::default()
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn serve_pick_defaults_to_checked() {
        let request: ServePickRequest =
            serde_json::from_str(r#"{"corner": "bottom_left"}"#).unwrap();
        assert_eq!(request.corner, Corner::BottomLeft);
        assert!(request.checked);
    }
}

//! The owned per-match scoreboard tying scoring, court state, timeouts and
//! setup edits together.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    rally::{Corner, CourtState, Players, RallyController, RallyOutcome, UiTeam},
    tally::{self, TeamTally},
    undo::{SetupHistory, SetupSnapshot},
};

/// Supported game lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PointsTarget {
    /// Game to 11, sides change at 6.
    #[default]
    Eleven,
    /// Game to 15, sides change at 8.
    Fifteen,
}

impl PointsTarget {
    /// Points needed to win.
    pub fn points(self) -> u32 {
        match self {
            PointsTarget::Eleven => 11,
            PointsTarget::Fifteen => 15,
        }
    }

    /// Score at which the teams change ends.
    pub fn mid_point(self) -> u32 {
        match self {
            PointsTarget::Eleven => 6,
            PointsTarget::Fifteen => 8,
        }
    }
}

/// Raised when a game length other than 11 or 15 is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unsupported point target {0}; expected 11 or 15")]
pub struct UnsupportedTarget(pub u32);

impl TryFrom<u32> for PointsTarget {
    type Error = UnsupportedTarget;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            11 => Ok(PointsTarget::Eleven),
            15 => Ok(PointsTarget::Fifteen),
            other => Err(UnsupportedTarget(other)),
        }
    }
}

impl From<PointsTarget> for u32 {
    fn from(value: PointsTarget) -> Self {
        value.points()
    }
}

/// Match-level settings edited during setup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchConfig {
    /// Division or title shown above the board.
    pub division: String,
    /// Game length.
    pub points_to_win: PointsTarget,
}

/// Coarse board phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Names, sides and serve are being set up.
    #[default]
    Setup,
    /// Rallies are being played.
    Playing,
}

/// Short status shown after the last action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RallyStatus {
    /// Nothing to report.
    #[default]
    None,
    /// Serving team scored.
    Point,
    /// Partner serves next.
    SecondServe,
    /// Serve passed to the other team.
    SideOut,
    /// Last action was undone.
    Replay,
}

impl From<RallyOutcome> for RallyStatus {
    fn from(outcome: RallyOutcome) -> Self {
        match outcome {
            RallyOutcome::ServerScored => RallyStatus::Point,
            RallyOutcome::HandChange => RallyStatus::SecondServe,
            RallyOutcome::SideOut => RallyStatus::SideOut,
        }
    }
}

/// Timeout presses per panel, stored as the box index at press time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeoutMarks {
    a: Vec<u32>,
    b: Vec<u32>,
}

impl TimeoutMarks {
    /// Build from persisted lists.
    pub fn new(a: Vec<u32>, b: Vec<u32>) -> Self {
        Self { a, b }
    }

    /// Presses of `team`, oldest first.
    pub fn get(&self, team: UiTeam) -> &[u32] {
        match team {
            UiTeam::A => &self.a,
            UiTeam::B => &self.b,
        }
    }

    fn get_mut(&mut self, team: UiTeam) -> &mut Vec<u32> {
        match team {
            UiTeam::A => &mut self.a,
            UiTeam::B => &mut self.b,
        }
    }

    pub(crate) fn push(&mut self, team: UiTeam, box_index: u32) {
        self.get_mut(team).push(box_index);
    }

    /// Remove the most recent press of `team` at `box_index`.
    pub(crate) fn remove_last(&mut self, team: UiTeam, box_index: u32) -> bool {
        let marks = self.get_mut(team);
        match marks.iter().rposition(|&index| index == box_index) {
            Some(position) => {
                marks.remove(position);
                true
            }
            None => false,
        }
    }
}

/// Operations refused because of the board's current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    /// A rally is already in play.
    #[error("a rally is already in play")]
    RallyLive,
    /// No rally is in play.
    #[error("no rally is in play")]
    RallyNotLive,
    /// Names or serve pick are missing.
    #[error("enter all four player names and pick the first server")]
    NotReady,
    /// A team already reached the point target.
    #[error("the game is over")]
    GameOver,
    /// The edit is only allowed before the first rally starts.
    #[error("setup can only be changed before the match starts")]
    NotInSetup,
    /// The action needs a started match.
    #[error("the match has not started")]
    NotStarted,
}

/// Partial setup edit; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupUpdate {
    /// New division label.
    pub division: Option<String>,
    /// New name slots.
    pub players: Option<Players>,
    /// New game length.
    pub points_to_win: Option<PointsTarget>,
}

impl SetupUpdate {
    /// Whether the edit touches no field.
    pub fn is_empty(&self) -> bool {
        self.division.is_none() && self.players.is_none() && self.points_to_win.is_none()
    }
}

/// Lifecycle flags carried across persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifecycle {
    /// Coarse phase.
    pub phase: MatchPhase,
    /// Whether the board left setup at least once.
    pub started: bool,
    /// Whether the ball is in play.
    pub rally_live: bool,
    /// Status of the last action.
    pub status: RallyStatus,
}

/// One doubles match: scoring engine, court state, timeouts and setup history.
#[derive(Debug, Clone)]
pub struct Scoreboard {
    pub(crate) id: Uuid,
    pub(crate) config: MatchConfig,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) rally: RallyController,
    pub(crate) timeouts: TimeoutMarks,
    pub(crate) setup_history: SetupHistory,
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Scoreboard {
    /// Fresh board for a new match.
    pub fn new() -> Self {
        let config = MatchConfig::default();
        let rally = RallyController::new(config.points_to_win.mid_point());
        let setup_history = SetupHistory::new(SetupSnapshot {
            config: config.clone(),
            court: rally.court(),
        });
        Self {
            id: Uuid::new_v4(),
            config,
            lifecycle: Lifecycle::default(),
            rally,
            timeouts: TimeoutMarks::default(),
            setup_history,
        }
    }

    /// Reassemble a board from restored parts. The rally is never live after a restore.
    pub fn restore(
        id: Uuid,
        config: MatchConfig,
        lifecycle: Lifecycle,
        rally: RallyController,
        timeouts: TimeoutMarks,
    ) -> Self {
        let setup_history = SetupHistory::new(SetupSnapshot {
            config: config.clone(),
            court: rally.court(),
        });
        Self {
            id,
            config,
            lifecycle: Lifecycle {
                rally_live: false,
                ..lifecycle
            },
            rally,
            timeouts,
            setup_history,
        }
    }

    /// Replace every field with a fresh match.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Match identifier, renewed on reset.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current settings.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Lifecycle flags.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Rally controller (scoring engine and court state).
    pub fn rally(&self) -> &RallyController {
        &self.rally
    }

    /// Timeout presses.
    pub fn timeouts(&self) -> &TimeoutMarks {
        &self.timeouts
    }

    /// Whether all four names are set.
    pub fn players_ready(&self) -> bool {
        self.rally.players().all_named()
    }

    /// Whether either team reached the point target.
    pub fn game_over(&self) -> bool {
        self.rally.engine().scores().max() >= self.config.points_to_win.points()
    }

    /// Points of `team`.
    pub fn score_of(&self, team: UiTeam) -> u32 {
        let logical = self.rally.mapping().logical(team);
        self.rally.engine().scores().get(logical)
    }

    /// Whether [`Scoreboard::undo`] has anything to revert.
    pub fn can_undo(&self) -> bool {
        !self.rally.log().is_empty() || self.lifecycle.started || self.setup_history.can_pop()
    }

    /// Tally of `team`, rebuilt from the full history.
    pub fn tally(&self, team: UiTeam) -> TeamTally {
        tally::reconstruct(
            self.rally.engine(),
            self.rally.mapping(),
            self.timeouts.get(team),
            team,
        )
    }

    /// Put the ball in play.
    pub fn start_rally(&mut self) -> Result<(), BoardError> {
        if self.lifecycle.rally_live {
            return Err(BoardError::RallyLive);
        }
        if self.game_over() {
            return Err(BoardError::GameOver);
        }
        if !self.players_ready() || !self.rally.server_picked() {
            return Err(BoardError::NotReady);
        }

        self.lifecycle.started = true;
        self.lifecycle.phase = MatchPhase::Playing;
        self.lifecycle.rally_live = true;
        Ok(())
    }

    /// Record the live rally as won by `winner`.
    pub fn record_rally(&mut self, winner: UiTeam) -> Result<RallyOutcome, BoardError> {
        if !self.lifecycle.rally_live {
            return Err(BoardError::RallyNotLive);
        }
        self.lifecycle.rally_live = false;
        let outcome = self.rally.apply_rally(winner).ok_or(BoardError::NotReady)?;
        self.lifecycle.status = outcome.into();
        Ok(outcome)
    }

    /// Call a timeout for `team` between rallies.
    pub fn call_timeout(&mut self, team: UiTeam) -> Result<u32, BoardError> {
        if !self.lifecycle.started {
            return Err(BoardError::NotStarted);
        }
        if self.lifecycle.rally_live {
            return Err(BoardError::RallyLive);
        }
        let box_index = self.score_of(team);
        self.timeouts.push(team, box_index);
        self.rally.log_timeout(team, box_index);
        debug!(?team, box_index, "timeout called");
        Ok(box_index)
    }

    /// Apply a setup edit and record it for undo.
    pub fn update_setup(&mut self, update: SetupUpdate) -> Result<(), BoardError> {
        self.ensure_setup()?;
        if update.is_empty() {
            return Ok(());
        }
        if let Some(division) = update.division {
            self.config.division = division;
        }
        if let Some(players) = update.players {
            self.rally.set_players(players);
        }
        if let Some(target) = update.points_to_win {
            self.config.points_to_win = target;
            self.rally.set_mid_point(target.mid_point());
        }
        self.push_setup_snapshot();
        Ok(())
    }

    /// Pick or clear the opening serve corner.
    pub fn pick_serve(&mut self, corner: Corner, checked: bool) -> Result<(), BoardError> {
        self.ensure_setup()?;
        self.rally.pick_serve(corner, checked);
        self.push_setup_snapshot();
        Ok(())
    }

    /// Change ends before the match.
    pub fn swap_sides(&mut self) -> Result<(), BoardError> {
        self.ensure_setup()?;
        self.rally.rotate_sides();
        self.push_setup_snapshot();
        Ok(())
    }

    /// Swap the two players of `team` before the match.
    pub fn swap_team_rows(&mut self, team: UiTeam) -> Result<(), BoardError> {
        self.ensure_setup()?;
        self.rally.swap_team_rows(team);
        self.push_setup_snapshot();
        Ok(())
    }

    fn ensure_setup(&self) -> Result<(), BoardError> {
        if self.lifecycle.started {
            Err(BoardError::NotInSetup)
        } else {
            Ok(())
        }
    }

    fn push_setup_snapshot(&mut self) {
        self.setup_history.push(SetupSnapshot {
            config: self.config.clone(),
            court: self.rally.court(),
        });
    }

    /// Leave play and return to setup, clearing the serve pick.
    pub(crate) fn return_to_setup(&mut self) {
        self.lifecycle.phase = MatchPhase::Setup;
        self.lifecycle.started = false;
        self.lifecycle.rally_live = false;
        self.rally.clear_serve();
    }

    pub(crate) fn restore_setup(&mut self, snapshot: SetupSnapshot) {
        let SetupSnapshot { config, court } = snapshot;
        self.config = config;
        self.rally.restore_court(court);
    }

    /// Court state; handy for assertions and views.
    pub fn court(&self) -> CourtState {
        self.rally.court()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::undo::UndoOutcome;

    fn players() -> Players {
        Players {
            a: ["Ann".into(), "Abe".into()],
            b: ["Bea".into(), "Bob".into()],
        }
    }

    fn ready_board() -> Scoreboard {
        let mut board = Scoreboard::new();
        board
            .update_setup(SetupUpdate {
                players: Some(players()),
                ..SetupUpdate::default()
            })
            .unwrap();
        board.pick_serve(Corner::BottomLeft, true).unwrap();
        board
    }

    fn play(board: &mut Scoreboard, winner: UiTeam) -> RallyOutcome {
        board.start_rally().unwrap();
        board.record_rally(winner).unwrap()
    }

    #[test]
    fn start_requires_names_and_server() {
        let mut board = Scoreboard::new();
        assert_eq!(board.start_rally(), Err(BoardError::NotReady));

        board
            .update_setup(SetupUpdate {
                players: Some(players()),
                ..SetupUpdate::default()
            })
            .unwrap();
        assert_eq!(board.start_rally(), Err(BoardError::NotReady));

        board.pick_serve(Corner::TopRight, true).unwrap();
        assert_eq!(board.start_rally(), Ok(()));
        assert_eq!(board.start_rally(), Err(BoardError::RallyLive));
        assert_eq!(board.lifecycle().phase, MatchPhase::Playing);
    }

    #[test]
    fn rally_needs_ball_in_play() {
        let mut board = ready_board();
        assert_eq!(board.record_rally(UiTeam::A), Err(BoardError::RallyNotLive));
        assert_eq!(play(&mut board, UiTeam::A), RallyOutcome::ServerScored);
        assert_eq!(board.lifecycle().status, RallyStatus::Point);
        assert!(!board.lifecycle().rally_live);
        assert_eq!(board.score_of(UiTeam::A), 1);
    }

    #[test]
    fn status_follows_outcome() {
        let mut board = ready_board();
        play(&mut board, UiTeam::B);
        assert_eq!(board.lifecycle().status, RallyStatus::SideOut);
        play(&mut board, UiTeam::A);
        assert_eq!(board.lifecycle().status, RallyStatus::SecondServe);
    }

    #[test]
    fn setup_is_locked_once_started() {
        let mut board = ready_board();
        play(&mut board, UiTeam::A);
        assert_eq!(board.swap_sides(), Err(BoardError::NotInSetup));
        assert_eq!(
            board.update_setup(SetupUpdate {
                division: Some("Open".into()),
                ..SetupUpdate::default()
            }),
            Err(BoardError::NotInSetup)
        );
        assert_eq!(board.swap_team_rows(UiTeam::B), Err(BoardError::NotInSetup));
    }

    #[test]
    fn timeouts_use_current_score_as_box() {
        let mut board = ready_board();
        assert_eq!(board.call_timeout(UiTeam::A), Err(BoardError::NotStarted));

        play(&mut board, UiTeam::A);
        play(&mut board, UiTeam::A);
        assert_eq!(board.call_timeout(UiTeam::A), Ok(2));
        assert_eq!(board.call_timeout(UiTeam::B), Ok(0));

        board.start_rally().unwrap();
        assert_eq!(board.call_timeout(UiTeam::B), Err(BoardError::RallyLive));

        assert_eq!(board.tally(UiTeam::A).timeouts.into_iter().collect::<Vec<_>>(), [2]);
        assert_eq!(board.timeouts().get(UiTeam::B), &[0]);
    }

    #[test]
    fn game_over_blocks_new_rallies() {
        let mut board = ready_board();
        for _ in 0..11 {
            play(&mut board, UiTeam::A);
        }
        assert!(board.game_over());
        assert_eq!(board.start_rally(), Err(BoardError::GameOver));
    }

    #[test]
    fn fifteen_point_game_moves_midpoint() {
        let mut board = ready_board();
        board
            .update_setup(SetupUpdate {
                points_to_win: Some(PointsTarget::Fifteen),
                ..SetupUpdate::default()
            })
            .unwrap();
        assert_eq!(board.court().mid_point, 8);

        for _ in 0..7 {
            play(&mut board, UiTeam::A);
        }
        assert!(!board.rally().autoswap_done());
        play(&mut board, UiTeam::A);
        assert!(board.rally().autoswap_done());
    }

    #[test]
    fn points_target_parses_supported_values_only() {
        assert_eq!(PointsTarget::try_from(15), Ok(PointsTarget::Fifteen));
        assert_eq!(PointsTarget::try_from(21), Err(UnsupportedTarget(21)));
        let parsed: PointsTarget = serde_json::from_str("11").unwrap();
        assert_eq!(parsed, PointsTarget::Eleven);
        assert!(serde_json::from_str::<PointsTarget>("9").is_err());
    }

    #[test]
    fn remove_last_picks_latest_duplicate() {
        let mut marks = TimeoutMarks::new(vec![1, 3, 1, 2], Vec::new());
        assert!(marks.remove_last(UiTeam::A, 1));
        assert_eq!(marks.get(UiTeam::A), &[1, 3, 2]);
        assert!(!marks.remove_last(UiTeam::B, 1));
    }

    #[test]
    fn reset_starts_a_new_match() {
        let mut board = ready_board();
        play(&mut board, UiTeam::A);
        let id = board.id();
        board.reset();
        assert_ne!(board.id(), id);
        assert_eq!(board.rally().engine().rally_count(), 0);
        assert!(board.rally().log().is_empty());
        assert!(!board.players_ready());
        assert!(!board.can_undo());
    }

    #[test]
    fn failed_record_leaves_no_live_rally() {
        let mut board = Scoreboard::new();
        board.lifecycle.started = true;
        board.lifecycle.rally_live = true;
        assert_eq!(board.record_rally(UiTeam::A), Err(BoardError::NotReady));
        assert!(!board.lifecycle().rally_live);
        assert_eq!(board.record_rally(UiTeam::A), Err(BoardError::RallyNotLive));
    }

    #[test]
    fn empty_setup_edit_adds_no_undo_step() {
        let mut board = Scoreboard::new();
        board.update_setup(SetupUpdate::default()).unwrap();
        assert!(!board.can_undo());

        board
            .update_setup(SetupUpdate {
                division: Some("Open".into()),
                ..SetupUpdate::default()
            })
            .unwrap();
        board.update_setup(SetupUpdate::default()).unwrap();
        assert_eq!(board.undo(), UndoOutcome::SetupRestored);
        assert!(!board.can_undo());
        assert_eq!(board.config().division, "");
    }
}

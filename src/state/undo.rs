//! Single undo entry point walking back timeouts, rallies and setup edits.

use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::state::{
    board::{MatchConfig, RallyStatus, Scoreboard},
    rally::CourtState,
};

/// Setup fields captured after each setup edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupSnapshot {
    /// Match settings.
    pub config: MatchConfig,
    /// Court state (names, sides, serve pick).
    pub court: CourtState,
}

/// Stack of setup snapshots. The initial entry is never popped.
#[derive(Debug, Clone)]
pub struct SetupHistory {
    stack: Vec<SetupSnapshot>,
}

impl SetupHistory {
    /// History seeded with `initial`.
    pub fn new(initial: SetupSnapshot) -> Self {
        Self {
            stack: vec![initial],
        }
    }

    /// Record the state after an edit.
    pub fn push(&mut self, snapshot: SetupSnapshot) {
        self.stack.push(snapshot);
    }

    /// Whether an edit can be reverted.
    pub fn can_pop(&self) -> bool {
        self.stack.len() > 1
    }

    /// Drop the newest snapshot and return the one now on top.
    pub fn pop(&mut self) -> Option<SetupSnapshot> {
        if !self.can_pop() {
            return None;
        }
        self.stack.pop();
        self.stack.last().cloned()
    }
}

/// What a call to [`Scoreboard::undo`] reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UndoOutcome {
    /// A timeout press was removed.
    Timeout,
    /// A rally was reverted.
    Rally,
    /// A started board without rallies went back to setup.
    ReturnedToSetup,
    /// A setup edit was reverted.
    SetupRestored,
    /// Nothing left to undo.
    Nothing,
}

impl Scoreboard {
    /// Revert the most recent action, whatever log it lives in.
    pub fn undo(&mut self) -> UndoOutcome {
        let outcome = self.undo_step();
        if outcome != UndoOutcome::Nothing {
            self.lifecycle.status = RallyStatus::Replay;
            self.lifecycle.rally_live = false;
        }
        debug!(?outcome, "undo");
        outcome
    }

    fn undo_step(&mut self) -> UndoOutcome {
        if let Some((team, box_index)) = self.rally.pop_timeout() {
            self.timeouts.remove_last(team, box_index);
            return UndoOutcome::Timeout;
        }

        if !self.rally.log().is_empty() {
            if !self.rally.undo_last_rally() {
                return UndoOutcome::Nothing;
            }
            if self.rally.log().is_empty() {
                self.return_to_setup();
            }
            return UndoOutcome::Rally;
        }

        if self.lifecycle.started {
            self.return_to_setup();
            return UndoOutcome::ReturnedToSetup;
        }

        match self.setup_history.pop() {
            Some(snapshot) => {
                self.restore_setup(snapshot);
                UndoOutcome::SetupRestored
            }
            None => UndoOutcome::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        board::{MatchPhase, PointsTarget, SetupUpdate},
        rally::{Corner, Orientation, Players, ServePick, UiTeam},
    };

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

    fn play(board: &mut Scoreboard, winner: UiTeam) {
        board.start_rally().unwrap();
        board.record_rally(winner).unwrap();
    }

    #[test]
    fn timeout_is_undone_before_rally() {
        let mut board = ready_board();
        play(&mut board, UiTeam::A);
        board.call_timeout(UiTeam::B).unwrap();
        let scores = board.rally().engine().scores();

        assert_eq!(board.undo(), UndoOutcome::Timeout);
        assert!(board.timeouts().get(UiTeam::B).is_empty());
        assert_eq!(board.rally().engine().scores(), scores);
        assert_eq!(board.lifecycle().status, RallyStatus::Replay);

        assert_eq!(board.undo(), UndoOutcome::Rally);
        assert_eq!(board.rally().engine().rally_count(), 0);
    }

    #[test]
    fn duplicate_timeout_indices_lose_one_press() {
        let mut board = ready_board();
        play(&mut board, UiTeam::B);
        board.call_timeout(UiTeam::A).unwrap();
        board.call_timeout(UiTeam::A).unwrap();
        assert_eq!(board.timeouts().get(UiTeam::A), &[0, 0]);

        assert_eq!(board.undo(), UndoOutcome::Timeout);
        assert_eq!(board.timeouts().get(UiTeam::A), &[0]);
        assert_eq!(board.tally(UiTeam::A).timeouts.len(), 1);
    }

    #[test]
    fn undoing_last_rally_returns_to_setup() {
        let mut board = ready_board();
        play(&mut board, UiTeam::A);
        play(&mut board, UiTeam::B);

        assert_eq!(board.undo(), UndoOutcome::Rally);
        assert!(board.lifecycle().started);
        assert_eq!(board.score_of(UiTeam::A), 1);

        assert_eq!(board.undo(), UndoOutcome::Rally);
        let lifecycle = board.lifecycle();
        assert_eq!(lifecycle.phase, MatchPhase::Setup);
        assert!(!lifecycle.started);
        assert!(!lifecycle.rally_live);
        assert!(!board.rally().server_picked());
        assert_eq!(board.rally().serve_pick(), ServePick::default());
        assert_eq!(board.rally().players(), players());

        // Setup is editable again.
        assert!(board.swap_sides().is_ok());
    }

    #[test]
    fn started_board_without_rallies_returns_to_setup() {
        let mut board = ready_board();
        board.start_rally().unwrap();

        assert_eq!(board.undo(), UndoOutcome::ReturnedToSetup);
        assert!(!board.lifecycle().started);
        assert!(!board.lifecycle().rally_live);
        assert!(!board.rally().server_picked());
    }

    #[test]
    fn setup_edits_undo_one_level_at_a_time() {
        let mut board = Scoreboard::new();
        board
            .update_setup(SetupUpdate {
                division: Some("Mixed 4.0".into()),
                ..SetupUpdate::default()
            })
            .unwrap();
        board
            .update_setup(SetupUpdate {
                points_to_win: Some(PointsTarget::Fifteen),
                ..SetupUpdate::default()
            })
            .unwrap();
        board.swap_sides().unwrap();

        assert_eq!(board.undo(), UndoOutcome::SetupRestored);
        assert_eq!(board.rally().orientation(), Orientation::ALeft);
        assert_eq!(board.config().points_to_win, PointsTarget::Fifteen);

        assert_eq!(board.undo(), UndoOutcome::SetupRestored);
        assert_eq!(board.config().points_to_win, PointsTarget::Eleven);
        assert_eq!(board.court().mid_point, 6);
        assert_eq!(board.config().division, "Mixed 4.0");

        assert_eq!(board.undo(), UndoOutcome::SetupRestored);
        assert_eq!(board.config().division, "");

        assert_eq!(board.undo(), UndoOutcome::Nothing);
        assert_eq!(board.lifecycle().status, RallyStatus::Replay);
    }

    #[test]
    fn full_walkback_ends_on_initial_setup() {
        let mut board = ready_board();
        for winner in [UiTeam::A, UiTeam::A, UiTeam::B, UiTeam::B, UiTeam::A] {
            play(&mut board, winner);
        }
        board.call_timeout(UiTeam::A).unwrap();

        let mut steps = 0;
        while board.undo() != UndoOutcome::Nothing {
            steps += 1;
            assert!(steps < 32);
        }
        // One timeout, five rallies, serve pick, names.
        assert_eq!(steps, 8);
        assert_eq!(board.rally().engine().rally_count(), 0);
        assert!(!board.players_ready());
    }

    #[test]
    fn setup_history_keeps_initial_entry() {
        let initial = SetupSnapshot {
            config: MatchConfig::default(),
            court: CourtState::new(6),
        };
        let mut history = SetupHistory::new(initial.clone());
        assert!(history.pop().is_none());

        let mut edited = initial.clone();
        edited.config.division = "Open".into();
        history.push(edited);
        assert!(history.can_pop());
        assert_eq!(history.pop(), Some(initial.clone()));
        assert!(!history.can_pop());
        assert!(history.pop().is_none());
    }
}

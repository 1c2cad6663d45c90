//! Rally classification and the court-facing state (badges, sides, name slots)
//! kept in step with the [`ServeEngine`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

use crate::state::serve_engine::{ServeEngine, TeamId};

/// Stable label of a player panel, independent of court side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum UiTeam {
    /// Panel `A`.
    A,
    /// Panel `B`.
    B,
}

impl UiTeam {
    /// The other panel.
    pub fn other(self) -> Self {
        match self {
            UiTeam::A => UiTeam::B,
            UiTeam::B => UiTeam::A,
        }
    }
}

/// Court row occupied by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Row {
    /// Row drawn at the top of the board.
    Top,
    /// Row drawn at the bottom of the board.
    Bot,
}

impl Row {
    /// The opposite row.
    pub fn flip(self) -> Self {
        match self {
            Row::Top => Row::Bot,
            Row::Bot => Row::Top,
        }
    }
}

/// Marker for the serving or receiving position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Badge {
    /// Panel holding the badge, unset before a server is picked.
    pub team: Option<UiTeam>,
    /// Row holding the badge.
    pub row: Option<Row>,
}

impl Badge {
    /// Badge placed on `team` at `row`.
    pub fn at(team: UiTeam, row: Row) -> Self {
        Self {
            team: Some(team),
            row: Some(row),
        }
    }

    fn flip_row(&mut self) {
        self.row = self.row.map(Row::flip);
    }
}

/// Serving and receiving badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Badges {
    /// Position of the active server.
    pub serving: Badge,
    /// Position of the diagonal receiver.
    pub receiving: Badge,
}

impl Badges {
    fn flip_rows(&mut self) {
        self.serving.flip_row();
        self.receiving.flip_row();
    }
}

/// Which panel currently plays from the left side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Orientation {
    /// Panel `A` on the left.
    #[default]
    #[serde(rename = "A-left")]
    ALeft,
    /// Panel `B` on the left.
    #[serde(rename = "B-left")]
    BLeft,
}

impl Orientation {
    /// Panel standing on the left.
    pub fn left_team(self) -> UiTeam {
        match self {
            Orientation::ALeft => UiTeam::A,
            Orientation::BLeft => UiTeam::B,
        }
    }

    /// Panel standing on the right.
    pub fn right_team(self) -> UiTeam {
        self.left_team().other()
    }

    fn flipped(self) -> Self {
        match self {
            Orientation::ALeft => Orientation::BLeft,
            Orientation::BLeft => Orientation::ALeft,
        }
    }
}

/// Bijection between panels and logical scoring teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamMapping {
    a: TeamId,
}

impl Default for TeamMapping {
    fn default() -> Self {
        Self { a: TeamId::One }
    }
}

impl TeamMapping {
    /// Mapping where `team` is logical team [`TeamId::One`].
    pub fn with_first_server(team: UiTeam) -> Self {
        match team {
            UiTeam::A => Self { a: TeamId::One },
            UiTeam::B => Self { a: TeamId::Two },
        }
    }

    /// Mapping built from the logical id given to panel `A`.
    pub fn from_a(a: TeamId) -> Self {
        Self { a }
    }

    /// Logical team bound to `team`.
    pub fn logical(self, team: UiTeam) -> TeamId {
        match team {
            UiTeam::A => self.a,
            UiTeam::B => self.a.other(),
        }
    }

    /// Panel bound to the logical `team`.
    pub fn ui(self, team: TeamId) -> UiTeam {
        if self.a == team { UiTeam::A } else { UiTeam::B }
    }
}

/// Player names per panel, slot `0` in the top row and slot `1` in the bottom row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Players {
    /// Names on panel `A`.
    #[serde(rename = "A")]
    #[schema(value_type = Vec<String>)]
    pub a: [String; 2],
    /// Names on panel `B`.
    #[serde(rename = "B")]
    #[schema(value_type = Vec<String>)]
    pub b: [String; 2],
}

impl Players {
    /// Names of `team`.
    pub fn team(&self, team: UiTeam) -> &[String; 2] {
        match team {
            UiTeam::A => &self.a,
            UiTeam::B => &self.b,
        }
    }

    /// Exchange the two row occupants of `team`.
    pub fn swap_rows(&mut self, team: UiTeam) {
        match team {
            UiTeam::A => self.a.swap(0, 1),
            UiTeam::B => self.b.swap(0, 1),
        }
    }

    /// Whether all four names are filled in.
    pub fn all_named(&self) -> bool {
        self.a.iter().chain(self.b.iter()).all(|name| !name.trim().is_empty())
    }
}

/// Serve corner offered during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    /// Bottom row of the left panel.
    BottomLeft,
    /// Top row of the right panel.
    TopRight,
}

/// Which corner has been picked as the opening server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServePick {
    /// Bottom-left corner picked.
    pub bottom_left: bool,
    /// Top-right corner picked.
    pub top_right: bool,
}

impl ServePick {
    fn swapped(self) -> Self {
        Self {
            bottom_left: self.top_right,
            top_right: self.bottom_left,
        }
    }
}

/// How a rally changed the serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RallyOutcome {
    /// Serving team won the rally and scored.
    ServerScored,
    /// First server lost; the partner serves next.
    HandChange,
    /// Second server lost; the serve passes to the other team.
    SideOut,
}

/// Undo record for one rally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RallyEntry {
    /// Classification of the rally.
    pub kind: RallyOutcome,
    /// Serving badge panel before the rally.
    pub prev_serving_team: Option<UiTeam>,
    /// Serving badge row before the rally.
    pub prev_serving_row: Option<Row>,
    /// Receiving badge panel before the rally.
    pub prev_receiving_team: Option<UiTeam>,
    /// Receiving badge row before the rally.
    pub prev_receiving_row: Option<Row>,
    /// Whether this rally triggered the midpoint side swap.
    pub autoswap_triggered: bool,
    /// Autoswap flag before the rally.
    pub prev_autoswap_done: bool,
}

/// Entry of the combined action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEntry {
    /// A recorded rally.
    Rally(RallyEntry),
    /// A timeout called by `team`, drawn above box `box_index`.
    Timeout {
        /// Panel that called the timeout.
        team: UiTeam,
        /// Tally box the timeout belongs to.
        box_index: u32,
    },
}

/// Chronological log of undoable actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLog {
    entries: Vec<LogEntry>,
}

impl ActionLog {
    /// Build a log from persisted entries.
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Whether the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rally entries.
    pub fn rally_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, LogEntry::Rally(_)))
            .count()
    }

    fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    fn pop(&mut self) -> Option<LogEntry> {
        self.entries.pop()
    }
}

/// Court-facing state that cannot be derived from the logical score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtState {
    /// Serving / receiving badges.
    pub badges: Badges,
    /// Panel to logical team mapping.
    pub mapping: TeamMapping,
    /// Which panel plays on the left.
    pub orientation: Orientation,
    /// Whether the midpoint swap already happened.
    pub autoswap_done: bool,
    /// Score that triggers the midpoint swap.
    pub mid_point: u32,
    /// Name slots per panel.
    pub players: Players,
    /// Opening serve corner.
    pub serve_pick: ServePick,
}

impl CourtState {
    /// Pre-match court with the given midpoint.
    pub fn new(mid_point: u32) -> Self {
        Self {
            badges: Badges::default(),
            mapping: TeamMapping::default(),
            orientation: Orientation::default(),
            autoswap_done: false,
            mid_point,
            players: Players::default(),
            serve_pick: ServePick::default(),
        }
    }

    /// 180° change of ends: sides, rows, badges and serve corners all rotate.
    fn rotate(&mut self) {
        self.orientation = self.orientation.flipped();
        self.players.swap_rows(UiTeam::A);
        self.players.swap_rows(UiTeam::B);
        self.badges.flip_rows();
        self.serve_pick = self.serve_pick.swapped();
    }

    fn clear_serve(&mut self) {
        self.serve_pick = ServePick::default();
        self.badges = Badges::default();
        self.autoswap_done = false;
    }
}

/// Restoring a controller from persisted parts failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action log holds {logged} rallies but the score history holds {recorded}")]
pub struct LogMismatch {
    /// Rally entries in the action log.
    pub logged: usize,
    /// Rallies replayed into the engine.
    pub recorded: usize,
}

/// Applies rallies to the [`ServeEngine`] and keeps the court state aligned.
#[derive(Debug, Clone)]
pub struct RallyController {
    engine: ServeEngine,
    court: CourtState,
    log: ActionLog,
}

impl RallyController {
    /// Fresh controller for a match whose midpoint swap happens at `mid_point`.
    pub fn new(mid_point: u32) -> Self {
        Self {
            engine: ServeEngine::new(),
            court: CourtState::new(mid_point),
            log: ActionLog::default(),
        }
    }

    /// Reassemble a controller, checking that log and engine describe the same rallies.
    pub fn restore(
        engine: ServeEngine,
        court: CourtState,
        log: ActionLog,
    ) -> Result<Self, LogMismatch> {
        let logged = log.rally_count();
        let recorded = engine.rally_count();
        if logged != recorded {
            return Err(LogMismatch { logged, recorded });
        }
        Ok(Self { engine, court, log })
    }

    /// Logical scoring state.
    pub fn engine(&self) -> &ServeEngine {
        &self.engine
    }

    /// Combined action log.
    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Copy of the court state.
    pub fn court(&self) -> CourtState {
        self.court.clone()
    }

    /// Current badges.
    pub fn badges(&self) -> Badges {
        self.court.badges
    }

    /// Current side orientation.
    pub fn orientation(&self) -> Orientation {
        self.court.orientation
    }

    /// Whether the midpoint swap happened.
    pub fn autoswap_done(&self) -> bool {
        self.court.autoswap_done
    }

    /// Panel to logical team mapping.
    pub fn mapping(&self) -> TeamMapping {
        self.court.mapping
    }

    /// Current name slots.
    pub fn players(&self) -> Players {
        self.court.players.clone()
    }

    /// Current serve corner pick.
    pub fn serve_pick(&self) -> ServePick {
        self.court.serve_pick
    }

    /// Panel on the left side.
    pub fn left_team(&self) -> UiTeam {
        self.court.orientation.left_team()
    }

    /// Whether an opening server has been chosen.
    pub fn server_picked(&self) -> bool {
        self.court.badges.serving.team.is_some()
    }

    /// Apply a rally won by `ui_winner`. Returns `None` when no server is picked yet.
    pub fn apply_rally(&mut self, ui_winner: UiTeam) -> Option<RallyOutcome> {
        let prev_serving_team = self.court.badges.serving.team?;
        let mapping = self.court.mapping;
        let winner = mapping.logical(ui_winner);
        let prev = self.court.badges;
        let prev_autoswap_done = self.court.autoswap_done;
        let prev_server = self.engine.server();

        self.engine.record_rally(winner);

        let kind = if winner == prev_server {
            self.court.badges.flip_rows();
            self.court.players.swap_rows(prev_serving_team);
            RallyOutcome::ServerScored
        } else if self.engine.server() == prev_server {
            self.court.badges.flip_rows();
            RallyOutcome::HandChange
        } else {
            let serving = mapping.ui(self.engine.server());
            let row = if serving == self.left_team() { Row::Bot } else { Row::Top };
            self.court.badges = Badges {
                serving: Badge::at(serving, row),
                receiving: Badge::at(serving.other(), row.flip()),
            };
            RallyOutcome::SideOut
        };

        let mut autoswap_triggered = false;
        if !self.court.autoswap_done && self.engine.scores().max() == self.court.mid_point {
            self.court.rotate();
            self.court.autoswap_done = true;
            autoswap_triggered = true;
            debug!(mid_point = self.court.mid_point, "midpoint reached; sides swapped");
        }

        self.log.push(LogEntry::Rally(RallyEntry {
            kind,
            prev_serving_team: prev.serving.team,
            prev_serving_row: prev.serving.row,
            prev_receiving_team: prev.receiving.team,
            prev_receiving_row: prev.receiving.row,
            autoswap_triggered,
            prev_autoswap_done,
        }));
        debug!(outcome = ?kind, "rally classified");

        Some(kind)
    }

    /// Undo the most recent rally. Returns `false` when the last log entry is not a rally.
    pub fn undo_last_rally(&mut self) -> bool {
        let Some(LogEntry::Rally(entry)) = self.log.last().copied() else {
            return false;
        };
        if !self.engine.can_undo() {
            return false;
        }
        self.log.pop();

        if entry.autoswap_triggered {
            self.court.rotate();
            self.court.autoswap_done = entry.prev_autoswap_done;
        }

        match entry.kind {
            RallyOutcome::ServerScored => {
                self.court.badges.flip_rows();
                if let Some(team) = entry.prev_serving_team {
                    self.court.players.swap_rows(team);
                }
            }
            RallyOutcome::HandChange => self.court.badges.flip_rows(),
            RallyOutcome::SideOut => {
                self.court.badges = Badges {
                    serving: Badge {
                        team: entry.prev_serving_team,
                        row: entry.prev_serving_row,
                    },
                    receiving: Badge {
                        team: entry.prev_receiving_team,
                        row: entry.prev_receiving_row,
                    },
                };
            }
        }

        self.engine.undo();

        if self.log.is_empty() {
            self.court.clear_serve();
        }
        debug!(outcome = ?entry.kind, "rally undone");
        true
    }

    /// Append a timeout entry to the action log.
    pub fn log_timeout(&mut self, team: UiTeam, box_index: u32) {
        self.log.push(LogEntry::Timeout { team, box_index });
    }

    /// Pop the last entry if it is a timeout.
    pub fn pop_timeout(&mut self) -> Option<(UiTeam, u32)> {
        match self.log.last().copied() {
            Some(LogEntry::Timeout { team, box_index }) => {
                self.log.pop();
                Some((team, box_index))
            }
            _ => None,
        }
    }

    /// Pick (or un-pick) the opening serve corner.
    ///
    /// The picked side becomes logical team 1 and its server starts from the
    /// corner; the receiver takes the diagonal row on the other side.
    pub fn pick_serve(&mut self, corner: Corner, checked: bool) {
        self.court.serve_pick = match corner {
            Corner::BottomLeft => ServePick {
                bottom_left: checked,
                top_right: false,
            },
            Corner::TopRight => ServePick {
                bottom_left: false,
                top_right: checked,
            },
        };

        if !checked {
            self.court.badges = Badges::default();
            return;
        }

        let left = self.court.orientation.left_team();
        let right = self.court.orientation.right_team();
        let (serving, receiving) = match corner {
            Corner::BottomLeft => (Badge::at(left, Row::Bot), Badge::at(right, Row::Top)),
            Corner::TopRight => (Badge::at(right, Row::Top), Badge::at(left, Row::Bot)),
        };
        self.court.badges = Badges { serving, receiving };
        let first = match corner {
            Corner::BottomLeft => left,
            Corner::TopRight => right,
        };
        self.court.mapping = TeamMapping::with_first_server(first);
    }

    /// Manual change of ends before the match.
    pub fn rotate_sides(&mut self) {
        self.court.rotate();
    }

    /// Exchange the two row occupants of `team`.
    pub fn swap_team_rows(&mut self, team: UiTeam) {
        self.court.players.swap_rows(team);
    }

    /// Replace the name slots.
    pub fn set_players(&mut self, players: Players) {
        self.court.players = players;
    }

    /// Change the midpoint that arms the autoswap.
    pub fn set_mid_point(&mut self, mid_point: u32) {
        self.court.mid_point = mid_point;
    }

    /// Drop serve pick and badges, as when play returns to setup.
    pub fn clear_serve(&mut self) {
        self.court.clear_serve();
    }

    /// Replace the whole court state; used when restoring a setup snapshot.
    pub fn restore_court(&mut self, court: CourtState) {
        self.court = court;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::serve_engine::{Hand, Scores};

    fn named() -> Players {
        Players {
            a: ["Ann".into(), "Abe".into()],
            b: ["Bea".into(), "Bob".into()],
        }
    }

    fn ready(corner: Corner) -> RallyController {
        let mut rally = RallyController::new(6);
        rally.set_players(named());
        rally.pick_serve(corner, true);
        rally
    }

    #[test]
    fn bottom_left_pick_serves_left_team_first() {
        let rally = ready(Corner::BottomLeft);
        assert_eq!(rally.badges().serving, Badge::at(UiTeam::A, Row::Bot));
        assert_eq!(rally.badges().receiving, Badge::at(UiTeam::B, Row::Top));
        assert_eq!(rally.mapping().logical(UiTeam::A), TeamId::One);
    }

    #[test]
    fn top_right_pick_maps_right_team_to_first_server() {
        let rally = ready(Corner::TopRight);
        assert_eq!(rally.badges().serving, Badge::at(UiTeam::B, Row::Top));
        assert_eq!(rally.badges().receiving, Badge::at(UiTeam::A, Row::Bot));
        assert_eq!(rally.mapping().logical(UiTeam::B), TeamId::One);
        assert_eq!(
            rally.serve_pick(),
            ServePick {
                bottom_left: false,
                top_right: true
            }
        );
    }

    #[test]
    fn unchecking_pick_clears_badges() {
        let mut rally = ready(Corner::BottomLeft);
        rally.pick_serve(Corner::BottomLeft, false);
        assert_eq!(rally.badges(), Badges::default());
        assert!(!rally.server_picked());
    }

    #[test]
    fn rally_without_server_is_ignored() {
        let mut rally = RallyController::new(6);
        assert_eq!(rally.apply_rally(UiTeam::A), None);
        assert!(rally.log().is_empty());
        assert_eq!(rally.engine().rally_count(), 0);
    }

    #[test]
    fn server_scored_flips_badges_and_swaps_names() {
        let mut rally = ready(Corner::BottomLeft);
        assert_eq!(rally.apply_rally(UiTeam::A), Some(RallyOutcome::ServerScored));
        assert_eq!(rally.badges().serving, Badge::at(UiTeam::A, Row::Top));
        assert_eq!(rally.badges().receiving, Badge::at(UiTeam::B, Row::Bot));
        assert_eq!(rally.players().a, ["Abe".to_string(), "Ann".to_string()]);
        assert_eq!(rally.players().b, named().b);
    }

    #[test]
    fn side_out_places_new_server_by_side() {
        let mut rally = ready(Corner::BottomLeft);
        // Opening server is on the second hand, so a lost rally is a side-out.
        assert_eq!(rally.apply_rally(UiTeam::B), Some(RallyOutcome::SideOut));
        assert_eq!(rally.engine().server(), TeamId::Two);
        // B plays on the right, so it serves from the top row.
        assert_eq!(rally.badges().serving, Badge::at(UiTeam::B, Row::Top));
        assert_eq!(rally.badges().receiving, Badge::at(UiTeam::A, Row::Bot));
        assert_eq!(rally.players(), named());

        assert_eq!(rally.apply_rally(UiTeam::A), Some(RallyOutcome::HandChange));
        assert_eq!(rally.engine().hand(), Hand::Second);
        assert_eq!(rally.badges().serving, Badge::at(UiTeam::B, Row::Bot));
        assert_eq!(rally.badges().receiving, Badge::at(UiTeam::A, Row::Top));

        assert_eq!(rally.apply_rally(UiTeam::A), Some(RallyOutcome::SideOut));
        // A plays on the left, so it serves from the bottom row.
        assert_eq!(rally.badges().serving, Badge::at(UiTeam::A, Row::Bot));
        assert_eq!(rally.badges().receiving, Badge::at(UiTeam::B, Row::Top));
    }

    #[test]
    fn undo_reverses_each_outcome_exactly() {
        let mut rally = ready(Corner::BottomLeft);
        let winners = [
            UiTeam::A,
            UiTeam::B,
            UiTeam::B,
            UiTeam::A,
            UiTeam::A,
            UiTeam::B,
            UiTeam::A,
        ];
        let mut courts = vec![rally.court()];
        let mut engines = vec![rally.engine().state()];
        for winner in winners {
            rally.apply_rally(winner);
            courts.push(rally.court());
            engines.push(rally.engine().state());
        }

        while courts.len() > 2 {
            courts.pop();
            engines.pop();
            assert!(rally.undo_last_rally());
            assert_eq!(&rally.court(), courts.last().unwrap());
            assert_eq!(&rally.engine().state(), engines.last().unwrap());
        }

        assert!(rally.undo_last_rally());
        assert!(rally.log().is_empty());
        assert_eq!(rally.badges(), Badges::default());
        assert_eq!(rally.serve_pick(), ServePick::default());
        assert_eq!(rally.players(), named());
        assert!(!rally.undo_last_rally());
    }

    #[test]
    fn autoswap_fires_once_at_midpoint() {
        let mut rally = ready(Corner::BottomLeft);
        let mut swaps = 0;
        for _ in 0..5 {
            rally.apply_rally(UiTeam::A);
            assert!(!rally.autoswap_done());
        }

        let before = rally.players();
        let badges_before = rally.badges();
        rally.apply_rally(UiTeam::A);
        assert_eq!(rally.engine().scores(), Scores::new(6, 0));
        assert!(rally.autoswap_done());
        assert_eq!(rally.orientation(), Orientation::BLeft);
        // Serving team swapped once for the point and once for the change of ends.
        assert_eq!(rally.players().a, before.a);
        assert_eq!(rally.players().b, [before.b[1].clone(), before.b[0].clone()]);
        assert_eq!(rally.badges().serving.row, badges_before.serving.row);
        assert_eq!(
            rally.serve_pick(),
            ServePick {
                bottom_left: false,
                top_right: true
            }
        );

        for entry in rally.log().entries() {
            if let LogEntry::Rally(entry) = entry {
                if entry.autoswap_triggered {
                    swaps += 1;
                }
            }
        }
        assert_eq!(swaps, 1);

        for winner in [UiTeam::B, UiTeam::B, UiTeam::A, UiTeam::A] {
            rally.apply_rally(winner);
        }
        assert_eq!(rally.orientation(), Orientation::BLeft);
    }

    #[test]
    fn undoing_autoswap_rally_restores_sides() {
        let mut rally = ready(Corner::BottomLeft);
        for _ in 0..5 {
            rally.apply_rally(UiTeam::A);
        }
        let court = rally.court();
        rally.apply_rally(UiTeam::A);
        assert!(rally.autoswap_done());

        assert!(rally.undo_last_rally());
        assert_eq!(rally.court(), court);
        assert!(!rally.autoswap_done());

        rally.apply_rally(UiTeam::A);
        assert!(rally.autoswap_done());
    }

    #[test]
    fn timeout_entries_block_rally_undo() {
        let mut rally = ready(Corner::BottomLeft);
        rally.apply_rally(UiTeam::A);
        rally.log_timeout(UiTeam::B, 0);

        assert!(!rally.undo_last_rally());
        assert_eq!(rally.pop_timeout(), Some((UiTeam::B, 0)));
        assert_eq!(rally.pop_timeout(), None);
        assert!(rally.undo_last_rally());
    }

    #[test]
    fn manual_rotation_is_self_inverse() {
        let mut rally = ready(Corner::BottomLeft);
        let court = rally.court();
        rally.rotate_sides();
        assert_eq!(rally.orientation(), Orientation::BLeft);
        assert_eq!(rally.badges().serving, Badge::at(UiTeam::A, Row::Top));
        rally.rotate_sides();
        assert_eq!(rally.court(), court);
    }

    #[test]
    fn restore_rejects_mismatched_log() {
        let engine = ServeEngine::replay([TeamId::One]);
        let err = RallyController::restore(engine, CourtState::new(6), ActionLog::default())
            .unwrap_err();
        assert_eq!(
            err,
            LogMismatch {
                logged: 0,
                recorded: 1
            }
        );
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;
use uuid::Uuid;

use crate::state::{
    board::{
        Lifecycle, MatchConfig, MatchPhase, PointsTarget, RallyStatus, Scoreboard, TimeoutMarks,
        UnsupportedTarget,
    },
    rally::{
        ActionLog, Badges, CourtState, LogEntry, LogMismatch, Orientation, Players,
        RallyController, RallyEntry, RallyOutcome, Row, ServePick, TeamMapping, UiTeam,
    },
    serve_engine::{ServeEngine, TeamId},
};

/// Full match snapshot as written by every storage backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedMatch {
    /// Match identifier.
    pub id: Uuid,
    /// Rally winners as logical team ids (`1` or `2`).
    pub history: Vec<u8>,
    /// Which panel plays on the left.
    pub orientation: Orientation,
    /// Serving / receiving badges.
    pub badges: Badges,
    /// Logical team bound to each panel.
    pub ui_to_logical: UiToLogicalEntity,
    /// Opening serve corner pick.
    pub serve_pick: ServePick,
    /// Whether the midpoint swap already happened.
    pub autoswap_done: bool,
    /// Timeout presses per panel.
    pub timeouts: TimeoutsEntity,
    /// Combined undo log.
    pub action_log: Vec<ActionEntity>,
    /// Division label.
    pub division: String,
    /// Player names.
    pub players: Players,
    /// Game length (11 or 15).
    pub points_to_win: u32,
    /// Coarse phase.
    pub phase: MatchPhase,
    /// Whether the match left setup.
    pub started: bool,
    /// Status of the last action.
    pub status: RallyStatus,
    /// RFC 3339 timestamp of the snapshot.
    pub saved_at: String,
}

/// Panel to logical team mapping as stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiToLogicalEntity {
    /// Logical id of panel `A`.
    #[serde(rename = "A")]
    pub a: u8,
    /// Logical id of panel `B`.
    #[serde(rename = "B")]
    pub b: u8,
}

/// Timeout box indices per panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutsEntity {
    /// Presses of panel `A`.
    #[serde(rename = "A", default)]
    pub a: Vec<u32>,
    /// Presses of panel `B`.
    #[serde(rename = "B", default)]
    pub b: Vec<u32>,
}

/// One action log entry as stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEntity {
    /// Recorded rally with the deltas needed to undo it.
    Rally {
        /// Rally classification.
        kind: RallyOutcome,
        /// Serving badge panel before the rally.
        prev_serving_team: Option<UiTeam>,
        /// Serving badge row before the rally.
        prev_serving_row: Option<Row>,
        /// Receiving badge panel before the rally.
        prev_receiving_team: Option<UiTeam>,
        /// Receiving badge row before the rally.
        prev_receiving_row: Option<Row>,
        /// Whether the rally triggered the midpoint swap.
        #[serde(default)]
        autoswap_triggered: bool,
        /// Autoswap flag before the rally.
        #[serde(default)]
        prev_autoswap_done: bool,
    },
    /// Timeout press.
    Timeout {
        /// Panel that called it.
        team: UiTeam,
        /// Box index at press time.
        index: u32,
    },
}

impl From<&LogEntry> for ActionEntity {
    fn from(entry: &LogEntry) -> Self {
        match *entry {
            LogEntry::Rally(rally) => ActionEntity::Rally {
                kind: rally.kind,
                prev_serving_team: rally.prev_serving_team,
                prev_serving_row: rally.prev_serving_row,
                prev_receiving_team: rally.prev_receiving_team,
                prev_receiving_row: rally.prev_receiving_row,
                autoswap_triggered: rally.autoswap_triggered,
                prev_autoswap_done: rally.prev_autoswap_done,
            },
            LogEntry::Timeout { team, box_index } => ActionEntity::Timeout {
                team,
                index: box_index,
            },
        }
    }
}

impl From<ActionEntity> for LogEntry {
    fn from(entity: ActionEntity) -> Self {
        match entity {
            ActionEntity::Rally {
                kind,
                prev_serving_team,
                prev_serving_row,
                prev_receiving_team,
                prev_receiving_row,
                autoswap_triggered,
                prev_autoswap_done,
            } => LogEntry::Rally(RallyEntry {
                kind,
                prev_serving_team,
                prev_serving_row,
                prev_receiving_team,
                prev_receiving_row,
                autoswap_triggered,
                prev_autoswap_done,
            }),
            ActionEntity::Timeout { team, index } => LogEntry::Timeout {
                team,
                box_index: index,
            },
        }
    }
}

/// Reasons a stored snapshot cannot be turned back into a [`Scoreboard`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PersistedMatchError {
    /// The panel mapping is not a bijection onto `{1, 2}`.
    #[error("invalid panel mapping A={a} B={b}")]
    InvalidMapping {
        /// Stored id of panel `A`.
        a: u8,
        /// Stored id of panel `B`.
        b: u8,
    },
    /// Game length other than 11 or 15.
    #[error(transparent)]
    UnsupportedTarget(#[from] UnsupportedTarget),
    /// Action log and score history disagree.
    #[error(transparent)]
    LogMismatch(#[from] LogMismatch),
}

impl From<&Scoreboard> for PersistedMatch {
    fn from(board: &Scoreboard) -> Self {
        let rally = board.rally();
        let engine = rally.engine();
        let mapping = rally.mapping();
        let config = board.config();
        let lifecycle = board.lifecycle();
        Self {
            id: board.id(),
            history: engine.history().into_iter().map(TeamId::as_raw).collect(),
            orientation: rally.orientation(),
            badges: rally.badges(),
            ui_to_logical: UiToLogicalEntity {
                a: mapping.logical(UiTeam::A).as_raw(),
                b: mapping.logical(UiTeam::B).as_raw(),
            },
            serve_pick: rally.serve_pick(),
            autoswap_done: rally.autoswap_done(),
            timeouts: TimeoutsEntity {
                a: board.timeouts().get(UiTeam::A).to_vec(),
                b: board.timeouts().get(UiTeam::B).to_vec(),
            },
            action_log: rally.log().entries().iter().map(ActionEntity::from).collect(),
            division: config.division.clone(),
            players: rally.players(),
            points_to_win: config.points_to_win.points(),
            phase: lifecycle.phase,
            started: lifecycle.started,
            status: lifecycle.status,
            saved_at: now_rfc3339(),
        }
    }
}

impl TryFrom<PersistedMatch> for Scoreboard {
    type Error = PersistedMatchError;

    fn try_from(value: PersistedMatch) -> Result<Self, Self::Error> {
        let points_to_win = PointsTarget::try_from(value.points_to_win)?;
        let mapping = match (
            TeamId::from_raw(value.ui_to_logical.a),
            TeamId::from_raw(value.ui_to_logical.b),
        ) {
            (Some(a), Some(b)) if a != b => TeamMapping::from_a(a),
            _ => {
                return Err(PersistedMatchError::InvalidMapping {
                    a: value.ui_to_logical.a,
                    b: value.ui_to_logical.b,
                });
            }
        };

        let winners = value.history.iter().filter_map(|&raw| {
            let winner = TeamId::from_raw(raw);
            if winner.is_none() {
                warn!(winner = raw, "skipping invalid rally winner in stored history");
            }
            winner
        });
        let engine = ServeEngine::replay(winners);

        let court = CourtState {
            badges: value.badges,
            mapping,
            orientation: value.orientation,
            autoswap_done: value.autoswap_done,
            mid_point: points_to_win.mid_point(),
            players: value.players,
            serve_pick: value.serve_pick,
        };
        let log = ActionLog::from_entries(
            value.action_log.into_iter().map(LogEntry::from).collect(),
        );
        let rally = RallyController::restore(engine, court, log)?;

        Ok(Scoreboard::restore(
            value.id,
            MatchConfig {
                division: value.division,
                points_to_win,
            },
            Lifecycle {
                phase: value.phase,
                started: value.started,
                rally_live: false,
                status: value.status,
            },
            rally,
            TimeoutMarks::new(value.timeouts.a, value.timeouts.b),
        ))
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

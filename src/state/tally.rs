//! Paper-style tally derived from the engine's rally history.
//!
//! The tally is always recomputed from the full log; nothing here is stored.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::{
    rally::{TeamMapping, UiTeam},
    serve_engine::{Hand, ServeEngine, TeamId},
};

/// Stroke drawn through a scored box, telling which server won the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Mark {
    /// Point won by the first server.
    #[serde(rename = "/")]
    Forward,
    /// Point won by the second server.
    #[serde(rename = "\\")]
    Backward,
}

impl From<Hand> for Mark {
    fn from(hand: Hand) -> Self {
        match hand {
            Hand::First => Mark::Forward,
            Hand::Second => Mark::Backward,
        }
    }
}

/// Tally content for one panel, keyed by 0-based box index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamTally {
    /// Point strokes.
    pub marks: BTreeMap<u32, Mark>,
    /// Boxes carrying a side-out bar.
    pub sideouts: BTreeSet<u32>,
    /// Boxes carrying a timeout marker.
    pub timeouts: BTreeSet<u32>,
}

/// Rebuild the tally of `team` from the engine history and its timeout presses.
///
/// # Panics
///
/// Panics when the engine histories disagree in length, which means the
/// match state is corrupt.
pub fn reconstruct(
    engine: &ServeEngine,
    mapping: TeamMapping,
    timeouts: &[u32],
    team: UiTeam,
) -> TeamTally {
    let winners = engine.history();
    let servers = engine.server_history();
    let hands = engine.hand_history();
    assert_eq!(winners.len(), servers.len(), "server history out of step");
    assert_eq!(winners.len(), hands.len(), "hand history out of step");

    let owner = mapping.logical(team);
    let mut next_box = [0u32; 2];
    let mut tally = TeamTally::default();

    for ((winner, server), hand) in winners.into_iter().zip(servers).zip(hands) {
        let next = &mut next_box[slot(server)];
        if winner == server {
            if server == owner {
                tally.marks.insert(*next, hand.into());
            }
            *next += 1;
        } else if hand == Hand::Second && server == owner {
            tally.sideouts.insert(*next);
        }
    }

    tally.timeouts = timeouts.iter().copied().collect();
    tally
}

fn slot(team: TeamId) -> usize {
    match team {
        TeamId::One => 0,
        TeamId::Two => 1,
    }
}

/// One box of the printed tally row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TallyBox {
    /// 0-based box index.
    pub index: u32,
    /// Printed point number.
    pub number: u32,
    /// Stroke through the box, if the point was scored.
    pub mark: Option<Mark>,
    /// Side-out bar on this box.
    pub side_out: bool,
    /// Timeout marker above this box.
    pub timeout: bool,
    /// Box where the change of ends happens.
    pub swap: bool,
}

/// Lay a tally out as one box per point up to `points_to_win`.
pub fn tally_boxes(tally: &TeamTally, points_to_win: u32, mid_point: u32) -> Vec<TallyBox> {
    let swap_index = mid_point.checked_sub(1);
    (0..points_to_win)
        .map(|index| TallyBox {
            index,
            number: index + 1,
            mark: tally.marks.get(&index).copied(),
            side_out: tally.sideouts.contains(&index),
            timeout: tally.timeouts.contains(&index),
            swap: Some(index) == swap_index,
        })
        .collect()
}

use serde::Serialize;

use crate::state::{board::Scoreboard, rally::Players};

/// Body posted to the broadcast overlay after every board change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayState {
    pub division: String,
    pub players: Players,
    #[serde(rename = "sideoutScoreString")]
    pub sideout_score_string: String,
}

impl From<&Scoreboard> for OverlayState {
    fn from(board: &Scoreboard) -> Self {
        Self {
            division: board.config().division.clone(),
            players: board.rally().players(),
            sideout_score_string: board.rally().engine().score_call(),
        }
    }
}

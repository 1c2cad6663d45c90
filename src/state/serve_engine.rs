//! Serve rotation and scoring rules for doubles play, with snapshot-based undo.

use tracing::debug;

/// Logical team identifier used by the scoring rules (team `1` serves first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeamId {
    /// Team that opens the match on serve.
    One,
    /// Team that opens the match on return.
    Two,
}

impl TeamId {
    /// Parse a raw wire identifier, rejecting anything outside `{1, 2}`.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            1 => Some(TeamId::One),
            2 => Some(TeamId::Two),
            _ => None,
        }
    }

    /// Numeric identifier as stored and displayed.
    pub fn as_raw(self) -> u8 {
        match self {
            TeamId::One => 1,
            TeamId::Two => 2,
        }
    }

    /// The opposing team.
    pub fn other(self) -> Self {
        match self {
            TeamId::One => TeamId::Two,
            TeamId::Two => TeamId::One,
        }
    }
}

/// Which of the serving team's two players currently holds the serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    /// First server of the team's service turn.
    First,
    /// Second server; a lost rally now is a side-out.
    Second,
}

impl Hand {
    /// Numeric hand as used in the score call.
    pub fn as_raw(self) -> u8 {
        match self {
            Hand::First => 1,
            Hand::Second => 2,
        }
    }
}

/// Points per logical team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scores {
    one: u32,
    two: u32,
}

impl Scores {
    /// Build a score pair explicitly.
    pub fn new(one: u32, two: u32) -> Self {
        Self { one, two }
    }

    /// Points of `team`.
    pub fn get(&self, team: TeamId) -> u32 {
        match team {
            TeamId::One => self.one,
            TeamId::Two => self.two,
        }
    }

    /// Highest of the two scores, used for the midpoint and game-over checks.
    pub fn max(&self) -> u32 {
        self.one.max(self.two)
    }

    fn award(&mut self, team: TeamId) {
        match team {
            TeamId::One => self.one += 1,
            TeamId::Two => self.two += 1,
        }
    }
}

/// Complete logical state of a match; also the unit stored on the undo stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeState {
    /// Team currently serving.
    pub server: TeamId,
    /// Active hand of the serving team.
    pub hand: Hand,
    /// Current points.
    pub scores: Scores,
    /// Winner of every rally, in order.
    pub history: Vec<TeamId>,
    /// Server in place immediately before each rally.
    pub server_history: Vec<TeamId>,
    /// Hand in place immediately before each rally.
    pub hand_history: Vec<Hand>,
}

impl ServeState {
    /// Opening state: team 1 serves with a single server (hand 2), no points.
    pub fn initial() -> Self {
        Self {
            server: TeamId::One,
            hand: Hand::Second,
            scores: Scores::default(),
            history: Vec::new(),
            server_history: Vec::new(),
            hand_history: Vec::new(),
        }
    }
}

impl Default for ServeState {
    fn default() -> Self {
        Self::initial()
    }
}

/// State machine applying rally winners to the serve rotation.
///
/// Every transition pushes a full copy of the state so that [`ServeEngine::undo`]
/// is a plain restore instead of an inverse rule.
#[derive(Debug, Clone)]
pub struct ServeEngine {
    current: ServeState,
    stack: Vec<ServeState>,
}

impl Default for ServeEngine {
    fn default() -> Self {
        let initial = ServeState::initial();
        Self {
            stack: vec![initial.clone()],
            current: initial,
        }
    }
}

impl ServeEngine {
    /// Create an engine in the opening state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an engine by feeding recorded winners through [`ServeEngine::record_rally`].
    pub fn replay<I>(winners: I) -> Self
    where
        I: IntoIterator<Item = TeamId>,
    {
        let mut engine = Self::new();
        for winner in winners {
            engine.record_rally(winner);
        }
        engine
    }

    /// Apply the outcome of one rally won by `winner`.
    pub fn record_rally(&mut self, winner: TeamId) {
        let state = &mut self.current;
        state.history.push(winner);
        state.server_history.push(state.server);
        state.hand_history.push(state.hand);

        if winner == state.server {
            state.scores.award(winner);
        } else {
            match state.hand {
                Hand::First => state.hand = Hand::Second,
                Hand::Second => {
                    state.server = state.server.other();
                    state.hand = Hand::First;
                }
            }
        }

        debug!(
            winner = winner.as_raw(),
            server = state.server.as_raw(),
            hand = state.hand.as_raw(),
            "rally recorded"
        );
        self.stack.push(self.current.clone());
    }

    /// Step back one rally. Returns `false` when nothing has been recorded.
    pub fn undo(&mut self) -> bool {
        if self.stack.len() <= 1 {
            return false;
        }
        self.stack.pop();
        if let Some(previous) = self.stack.last() {
            self.current = previous.clone();
        }
        true
    }

    /// Back to the opening state with an empty undo stack.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether [`ServeEngine::undo`] would succeed.
    pub fn can_undo(&self) -> bool {
        self.stack.len() > 1
    }

    /// Number of rallies recorded so far.
    pub fn rally_count(&self) -> usize {
        self.current.history.len()
    }

    /// Team currently serving.
    pub fn server(&self) -> TeamId {
        self.current.server
    }

    /// Active hand of the serving team.
    pub fn hand(&self) -> Hand {
        self.current.hand
    }

    /// Current points.
    pub fn scores(&self) -> Scores {
        self.current.scores
    }

    /// Rally winners in order.
    pub fn history(&self) -> Vec<TeamId> {
        self.current.history.clone()
    }

    /// Server before each rally.
    pub fn server_history(&self) -> Vec<TeamId> {
        self.current.server_history.clone()
    }

    /// Hand before each rally.
    pub fn hand_history(&self) -> Vec<Hand> {
        self.current.hand_history.clone()
    }

    /// Copy of the whole logical state.
    pub fn state(&self) -> ServeState {
        self.current.clone()
    }

    /// Spoken score call: serving score, receiving score, hand.
    pub fn score_call(&self) -> String {
        let scores = self.current.scores;
        let server = self.current.server;
        format!(
            "{} - {} - {}",
            scores.get(server),
            scores.get(server.other()),
            self.current.hand.as_raw()
        )
    }
}

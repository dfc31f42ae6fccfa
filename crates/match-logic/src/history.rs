//! Game history and the state encoding derived from it

use serde::{Deserialize, Serialize};

use crate::strategy::Move;

/// Width of the state vector fed to the generator
pub const STATE_DIM: usize = 2;

/// Value used in both state slots before any round has been played
pub const ROUND_ZERO_SENTINEL: f32 = -1.0;

/// Which seat of the game a player occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Ordered (move_a, move_b) pairs of one game, oldest first
///
/// Append-only while a game is running. Each game owns its own history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    rounds: Vec<(Move, Move)>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rounds: usize) -> Self {
        Self {
            rounds: Vec::with_capacity(rounds),
        }
    }

    pub fn push(&mut self, move_a: Move, move_b: Move) {
        self.rounds.push((move_a, move_b));
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn rounds(&self) -> &[(Move, Move)] {
        &self.rounds
    }

    /// History truncated to the first `len` rounds
    pub fn prefix(&self, len: usize) -> History {
        History {
            rounds: self.rounds[..len.min(self.rounds.len())].to_vec(),
        }
    }

    /// Moves made by `side`, oldest first
    pub fn own(&self, side: Side) -> impl Iterator<Item = Move> + '_ {
        self.rounds.iter().map(move |pair| pick(*pair, side))
    }

    /// Moves made against `side`, oldest first
    pub fn opponent(&self, side: Side) -> impl Iterator<Item = Move> + '_ {
        self.own(side.other())
    }

    pub fn own_last(&self, side: Side) -> Option<Move> {
        self.rounds.last().map(|pair| pick(*pair, side))
    }

    pub fn opponent_last(&self, side: Side) -> Option<Move> {
        self.own_last(side.other())
    }

    /// Whether either player has defected at any point
    pub fn any_defection(&self) -> bool {
        self.rounds
            .iter()
            .any(|(a, b)| *a == Move::Defect || *b == Move::Defect)
    }

    /// Encode the most recent round from the point of view of `side`
    pub fn state_vector(&self, side: Side) -> StateVector {
        self.state_before(self.rounds.len(), side)
    }

    /// State `side` observed when choosing its move for `round`
    pub fn state_before(&self, round: usize, side: Side) -> StateVector {
        match round.checked_sub(1).and_then(|i| self.rounds.get(i)) {
            None => StateVector::initial(),
            Some(pair) => StateVector::new(pick(*pair, side.other()), pick(*pair, side)),
        }
    }
}

fn pick((move_a, move_b): (Move, Move), side: Side) -> Move {
    match side {
        Side::A => move_a,
        Side::B => move_b,
    }
}

/// `[opponent_previous, own_previous]`, each 0 (cooperate) or 1 (defect),
/// or the sentinel on round 0
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateVector([f32; STATE_DIM]);

impl StateVector {
    pub fn new(opponent_previous: Move, own_previous: Move) -> Self {
        Self([opponent_previous.as_f32(), own_previous.as_f32()])
    }

    pub fn initial() -> Self {
        Self([ROUND_ZERO_SENTINEL; STATE_DIM])
    }

    pub fn is_initial(&self) -> bool {
        self.0 == [ROUND_ZERO_SENTINEL; STATE_DIM]
    }

    pub fn opponent_previous(&self) -> f32 {
        self.0[0]
    }

    pub fn own_previous(&self) -> f32 {
        self.0[1]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn values(&self) -> [f32; STATE_DIM] {
        self.0
    }
}

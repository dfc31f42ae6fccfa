//! Match Logic for the adversarial Prisoner's Dilemma study
//!
//! Core game logic for the Iterated Prisoner's Dilemma: the fixed payoff
//! matrix, the closed catalog of reference strategies, and the match engine
//! that plays two action producers against each other. The same engine
//! generates expert training data and replays trained generators during
//! evaluation.

mod error;
mod game;
mod history;
mod random;
mod strategy;

pub use error::{MatchError, Result};
pub use game::{play, Agent, GameRecord, RoundResult, StrategyAgent};
pub use history::{History, Side, StateVector, ROUND_ZERO_SENTINEL, STATE_DIM};
pub use random::SeededRng;
pub use strategy::{Move, StrategyBase};

/// Payoff matrix indexed by `[move_a][move_b]`, holding `(score_a, score_b)`
const PAYOFF_TABLE: [[(u8, u8); 2]; 2] = [
    // A cooperates
    [(3, 3), (0, 5)],
    // A defects
    [(5, 0), (1, 1)],
];

/// Payoff matrix for the Prisoner's Dilemma
/// Returns (score_a, score_b)
#[inline]
pub fn payoff(a: Move, b: Move) -> (u8, u8) {
    PAYOFF_TABLE[a.index()][b.index()]
}

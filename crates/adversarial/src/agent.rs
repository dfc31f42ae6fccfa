//! Letting a trained generator sit at the table

use match_logic::{Agent, History, MatchError, Move, SeededRng, Side};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::ProbabilityModel;

/// Generator outputs at or above this probability are read as DEFECT
pub const DEFECT_THRESHOLD: f32 = 0.5;

/// How a generator's P(defect) becomes a discrete move
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionPolicy {
    /// DEFECT iff p >= 0.5
    #[default]
    Threshold,
    /// DEFECT with probability p
    Sample,
}

impl ActionPolicy {
    pub fn decide(self, probability: f32, rng: &mut SeededRng) -> Result<Move, MatchError> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(MatchError::DomainViolation { value: probability });
        }
        let defect = match self {
            ActionPolicy::Threshold => probability >= DEFECT_THRESHOLD,
            ActionPolicy::Sample => rng.random::<f32>() < probability,
        };
        Ok(if defect { Move::Defect } else { Move::Cooperate })
    }
}

/// Borrows a generator read-only and plays it as an [`Agent`]
pub struct GeneratorAgent<'a, M: ?Sized> {
    model: &'a M,
    policy: ActionPolicy,
    rng: SeededRng,
}

impl<'a, M: ProbabilityModel + ?Sized> GeneratorAgent<'a, M> {
    pub fn new(model: &'a M, policy: ActionPolicy, rng: SeededRng) -> Self {
        Self { model, policy, rng }
    }

    pub fn policy(&self) -> ActionPolicy {
        self.policy
    }
}

impl<M: ProbabilityModel + ?Sized> Agent for GeneratorAgent<'_, M> {
    fn act(&mut self, history: &History, side: Side) -> match_logic::Result<Move> {
        let state = history.state_vector(side);
        let probability = self.model.probability(state.as_slice());
        self.policy.decide(probability, &mut self.rng)
    }
}

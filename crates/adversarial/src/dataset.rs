//! Sampling "real" (state, action) pairs from expert self-play

use match_logic::{play, SeededRng, Side, StrategyAgent, StrategyBase, STATE_DIM};
use ndarray::{Array1, Array2};
use rand::Rng;
use tracing::trace;

use crate::error::Result;

/// States observed by expert players and the moves they made there
#[derive(Clone, Debug)]
pub struct ExpertBatch {
    /// One [`StateVector`](match_logic::StateVector) per row
    pub states: Array2<f32>,
    /// 0 for cooperate, 1 for defect
    pub actions: Array1<f32>,
}

impl ExpertBatch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Play `games` expert-vs-expert games and collect both players' decisions
///
/// Each game pairs two experts drawn uniformly, possibly the same one twice,
/// so a batch holds `games * rounds_per_game * 2` rows.
pub fn sample_expert_batch(
    rng: &mut SeededRng,
    games: usize,
    rounds_per_game: usize,
) -> Result<ExpertBatch> {
    let rows = games * rounds_per_game * 2;
    let mut states = Vec::with_capacity(rows * STATE_DIM);
    let mut actions = Vec::with_capacity(rows);

    for game in 0..games {
        let expert_a = pick_expert(rng);
        let expert_b = pick_expert(rng);
        let mut agent_a = StrategyAgent::new(expert_a, rng.for_stream(2 * game as u64));
        let mut agent_b = StrategyAgent::new(expert_b, rng.for_stream(2 * game as u64 + 1));
        trace!(game, %expert_a, %expert_b, "sampling expert game");

        let record = play(&mut agent_a, &mut agent_b, rounds_per_game)?;
        for side in [Side::A, Side::B] {
            for (state, action) in record.state_action_pairs(side) {
                states.extend_from_slice(state.as_slice());
                actions.push(action.as_f32());
            }
        }
    }

    let states = Array2::from_shape_vec((actions.len(), STATE_DIM), states)?;
    Ok(ExpertBatch {
        states,
        actions: Array1::from(actions),
    })
}

fn pick_expert(rng: &mut SeededRng) -> StrategyBase {
    StrategyBase::EXPERTS[rng.random_range(0..StrategyBase::EXPERTS.len())]
}

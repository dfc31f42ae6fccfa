//! Match execution engine

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::Result;
use crate::history::{History, Side, StateVector};
use crate::payoff;
use crate::random::SeededRng;
use crate::strategy::{Move, StrategyBase};

/// Anything that can pick the next move of a game
///
/// Agents only ever see rounds that are already complete, never the move
/// the other player is choosing in the same round.
pub trait Agent {
    fn act(&mut self, history: &History, side: Side) -> Result<Move>;
}

/// A catalog strategy together with the randomness it plays with
#[derive(Clone, Debug)]
pub struct StrategyAgent {
    base: StrategyBase,
    rng: SeededRng,
}

impl StrategyAgent {
    pub fn new(base: StrategyBase, rng: SeededRng) -> Self {
        Self { base, rng }
    }

    /// Convenience constructor for a fixed seed
    pub fn seeded(base: StrategyBase, seed: u64) -> Self {
        Self::new(base, SeededRng::new(seed, 0))
    }

    pub fn base(&self) -> StrategyBase {
        self.base
    }
}

impl Agent for StrategyAgent {
    fn act(&mut self, history: &History, side: Side) -> Result<Move> {
        Ok(self.base.next_move(history, side, &mut self.rng))
    }
}

/// Result of a single round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: usize,
    pub move_a: Move,
    pub move_b: Move,
    pub score_a: u8,
    pub score_b: u8,
    pub cumulative_a: u32,
    pub cumulative_b: u32,
}

/// Result of a complete game
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub history: History,
    pub rounds: Vec<RoundResult>,
    pub total_score_a: u32,
    pub total_score_b: u32,
}

impl GameRecord {
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    /// (state, move) pairs as seen by `side`, one per round
    pub fn state_action_pairs(&self, side: Side) -> impl Iterator<Item = (StateVector, Move)> + '_ {
        self.history
            .own(side)
            .enumerate()
            .map(move |(round, own)| (self.history.state_before(round, side), own))
    }

    /// Mean payoff per round for (A, B); zero for an empty game
    pub fn mean_payoffs(&self) -> (f64, f64) {
        if self.rounds.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.rounds.len() as f64;
        (self.total_score_a as f64 / n, self.total_score_b as f64 / n)
    }
}

/// Run a complete game between two agents
///
/// # Arguments
/// * `agent_a` - Player in seat A
/// * `agent_b` - Player in seat B
/// * `rounds` - Number of rounds; zero yields an empty record
///
/// # Returns
/// Complete game record with round-by-round details, or the first error an
/// agent reports
pub fn play<A, B>(agent_a: &mut A, agent_b: &mut B, rounds: usize) -> Result<GameRecord>
where
    A: Agent + ?Sized,
    B: Agent + ?Sized,
{
    let mut history = History::with_capacity(rounds);
    let mut results: Vec<RoundResult> = Vec::with_capacity(rounds);
    let mut total_a = 0u32;
    let mut total_b = 0u32;

    for round in 0..rounds {
        // Both players decide from the same snapshot
        let move_a = agent_a.act(&history, Side::A)?;
        let move_b = agent_b.act(&history, Side::B)?;

        let (score_a, score_b) = payoff(move_a, move_b);
        total_a += score_a as u32;
        total_b += score_b as u32;
        trace!(round, ?move_a, ?move_b, score_a, score_b, "round resolved");

        results.push(RoundResult {
            round,
            move_a,
            move_b,
            score_a,
            score_b,
            cumulative_a: total_a,
            cumulative_b: total_b,
        });

        history.push(move_a, move_b);
    }

    Ok(GameRecord {
        history,
        rounds: results,
        total_score_a: total_a,
        total_score_b: total_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;

    fn agent(base: StrategyBase) -> StrategyAgent {
        StrategyAgent::seeded(base, 42)
    }

    /// Reports which moves it could see, to check simultaneous play
    struct PeekingAgent {
        seen: Vec<usize>,
    }

    impl Agent for PeekingAgent {
        fn act(&mut self, history: &History, _side: Side) -> crate::Result<Move> {
            self.seen.push(history.len());
            Ok(Move::Cooperate)
        }
    }

    struct BrokenAgent;

    impl Agent for BrokenAgent {
        fn act(&mut self, _history: &History, _side: Side) -> crate::Result<Move> {
            Err(MatchError::DomainViolation { value: f32::NAN })
        }
    }

    #[test]
    fn test_zero_rounds() {
        let result = play(&mut agent(StrategyBase::TitForTat), &mut agent(StrategyBase::Random), 0).unwrap();

        assert!(result.history.is_empty());
        assert!(result.rounds.is_empty());
        assert_eq!((result.total_score_a, result.total_score_b), (0, 0));
        assert_eq!(result.mean_payoffs(), (0.0, 0.0));
    }

    #[test]
    fn test_cooperate_vs_cooperate() {
        let result = play(
            &mut agent(StrategyBase::AlwaysCooperate),
            &mut agent(StrategyBase::AlwaysCooperate),
            5,
        )
        .unwrap();

        // Both always cooperate, should get 3 points each per round
        for round in &result.rounds {
            assert_eq!(round.move_a, Move::Cooperate);
            assert_eq!(round.move_b, Move::Cooperate);
            assert_eq!(round.score_a, 3);
            assert_eq!(round.score_b, 3);
        }

        assert_eq!((result.total_score_a, result.total_score_b), (15, 15));
    }

    #[test]
    fn test_defect_vs_cooperate() {
        let result = play(
            &mut agent(StrategyBase::AlwaysDefect),
            &mut agent(StrategyBase::AlwaysCooperate),
            3,
        )
        .unwrap();

        for round in &result.rounds {
            assert_eq!(round.score_a, 5);
            assert_eq!(round.score_b, 0);
        }

        assert_eq!((result.total_score_a, result.total_score_b), (15, 0));
        assert_eq!(result.mean_payoffs(), (5.0, 0.0));
    }

    #[test]
    fn test_tft_vs_tft() {
        let result = play(&mut agent(StrategyBase::TitForTat), &mut agent(StrategyBase::TitForTat), 20).unwrap();

        // TFT vs TFT: both start cooperating and continue cooperating
        for round in &result.rounds {
            assert_eq!(round.move_a, Move::Cooperate);
            assert_eq!(round.move_b, Move::Cooperate);
        }
    }

    #[test]
    fn test_tft_vs_always_defect() {
        let result = play(&mut agent(StrategyBase::TitForTat), &mut agent(StrategyBase::AlwaysDefect), 10).unwrap();

        // Round 0: TFT cooperates, AD defects
        assert_eq!(result.rounds[0].move_a, Move::Cooperate);
        assert_eq!(result.rounds[0].move_b, Move::Defect);

        // Round 1+: TFT retaliates, both defect
        for round in result.rounds.iter().skip(1) {
            assert_eq!(round.move_a, Move::Defect);
            assert_eq!(round.move_b, Move::Defect);
        }
    }

    #[test]
    fn test_wsls_vs_always_defect_alternates() {
        let result = play(
            &mut agent(StrategyBase::WinStayLoseShift),
            &mut agent(StrategyBase::AlwaysDefect),
            6,
        )
        .unwrap();

        let moves: Vec<_> = result.rounds.iter().map(|r| r.move_a).collect();
        assert_eq!(
            moves,
            vec![
                Move::Cooperate,
                Move::Defect,
                Move::Cooperate,
                Move::Defect,
                Move::Cooperate,
                Move::Defect
            ]
        );
    }

    #[test]
    fn test_cumulative_scores() {
        let result = play(&mut agent(StrategyBase::TitForTat), &mut agent(StrategyBase::Random), 30).unwrap();

        let mut expected_a = 0u32;
        let mut expected_b = 0u32;

        for (i, round) in result.rounds.iter().enumerate() {
            assert_eq!(round.round, i);
            expected_a += round.score_a as u32;
            expected_b += round.score_b as u32;
            assert_eq!(round.cumulative_a, expected_a);
            assert_eq!(round.cumulative_b, expected_b);
        }
        assert_eq!(result.total_score_a, expected_a);
        assert_eq!(result.total_score_b, expected_b);
        assert_eq!(result.history.len(), 30);
    }

    #[test_log::test]
    fn test_match_determinism() {
        let result1 = play(&mut agent(StrategyBase::Random), &mut agent(StrategyBase::WinStayLoseShift), 50).unwrap();
        let result2 = play(&mut agent(StrategyBase::Random), &mut agent(StrategyBase::WinStayLoseShift), 50).unwrap();

        assert_eq!(result1, result2);
        assert_eq!(
            serde_json::to_vec(&result1).unwrap(),
            serde_json::to_vec(&result2).unwrap()
        );
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a1 = StrategyAgent::seeded(StrategyBase::Random, 1);
        let mut a2 = StrategyAgent::seeded(StrategyBase::Random, 2);
        let result1 = play(&mut a1, &mut agent(StrategyBase::AlwaysCooperate), 64).unwrap();
        let result2 = play(&mut a2, &mut agent(StrategyBase::AlwaysCooperate), 64).unwrap();

        assert_ne!(result1.history, result2.history);
    }

    #[test]
    fn test_state_action_pairs() {
        let result = play(&mut agent(StrategyBase::TitForTat), &mut agent(StrategyBase::AlwaysDefect), 3).unwrap();
        let pairs: Vec<_> = result.state_action_pairs(Side::A).collect();

        assert_eq!(pairs.len(), 3);
        assert!(pairs[0].0.is_initial());
        assert_eq!(pairs[0].1, Move::Cooperate);
        // Opponent defected, we cooperated -> retaliate
        assert_eq!(pairs[1].0.values(), [1.0, 0.0]);
        assert_eq!(pairs[1].1, Move::Defect);
        assert_eq!(pairs[2].0.values(), [1.0, 1.0]);
    }

    #[test]
    fn test_agents_see_same_snapshot() {
        let mut a = PeekingAgent { seen: Vec::new() };
        let mut b = PeekingAgent { seen: Vec::new() };
        play(&mut a, &mut b, 4).unwrap();

        assert_eq!(a.seen, vec![0, 1, 2, 3]);
        assert_eq!(a.seen, b.seen);
    }

    #[test]
    fn test_agent_error_stops_game() {
        let err = play(&mut agent(StrategyBase::TitForTat), &mut BrokenAgent, 10).unwrap_err();
        assert!(matches!(err, MatchError::DomainViolation { .. }));
    }

    #[test]
    fn test_dyn_agents() {
        let mut a: Box<dyn Agent> = Box::new(agent(StrategyBase::AlwaysDefect));
        let mut b: Box<dyn Agent> = Box::new(agent(StrategyBase::AlwaysDefect));
        let result = play(a.as_mut(), b.as_mut(), 4).unwrap();
        assert_eq!((result.total_score_a, result.total_score_b), (4, 4));
    }
}

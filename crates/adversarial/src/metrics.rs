//! Mimicry and payoff metrics for one evaluation game
//!
//! The opponent's move is the label and the generator's move the
//! prediction, with DEFECT as the positive class. Ratios whose denominator
//! is zero are reported as 0.

use match_logic::{GameRecord, Move, Side, StrategyBase};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, label: Move, prediction: Move) {
        match (label, prediction) {
            (Move::Defect, Move::Defect) => self.true_positives += 1,
            (Move::Cooperate, Move::Defect) => self.false_positives += 1,
            (Move::Cooperate, Move::Cooperate) => self.true_negatives += 1,
            (Move::Defect, Move::Cooperate) => self.false_negatives += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl FromIterator<(Move, Move)> for ConfusionMatrix {
    fn from_iter<I: IntoIterator<Item = (Move, Move)>>(iter: I) -> Self {
        let mut matrix = ConfusionMatrix::default();
        for (label, prediction) in iter {
            matrix.record(label, prediction);
        }
        matrix
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Outcome of the generator playing one catalog strategy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub strategy: StrategyBase,
    pub rounds: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub generator_total_payoff: u32,
    pub opponent_total_payoff: u32,
    pub generator_mean_payoff: f64,
    pub opponent_mean_payoff: f64,
    /// Share of rounds in which the generator cooperated
    pub generator_cooperation_rate: f64,
    pub confusion: ConfusionMatrix,
}

impl Metrics {
    /// Score a finished game in which the generator sat at `generator_side`
    pub fn from_game(strategy: StrategyBase, generator_side: Side, record: &GameRecord) -> Self {
        let history = &record.history;
        let confusion: ConfusionMatrix = history
            .opponent(generator_side)
            .zip(history.own(generator_side))
            .collect();

        let (generator_total_payoff, opponent_total_payoff) = match generator_side {
            Side::A => (record.total_score_a, record.total_score_b),
            Side::B => (record.total_score_b, record.total_score_a),
        };
        let (mean_a, mean_b) = record.mean_payoffs();
        let (generator_mean_payoff, opponent_mean_payoff) = match generator_side {
            Side::A => (mean_a, mean_b),
            Side::B => (mean_b, mean_a),
        };
        let cooperations = history
            .own(generator_side)
            .filter(|m| *m == Move::Cooperate)
            .count();

        Self {
            strategy,
            rounds: record.round_count(),
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            generator_total_payoff,
            opponent_total_payoff,
            generator_mean_payoff,
            opponent_mean_payoff,
            generator_cooperation_rate: ratio(cooperations, record.round_count()),
            confusion,
        }
    }
}

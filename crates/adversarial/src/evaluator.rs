//! Replaying a generator against every catalog strategy
//!
//! The generator always sits in seat A. Each strategy gets its own pair of
//! random streams, so evaluating one strategy alone or the whole catalog
//! gives the same numbers.

use match_logic::{play, SeededRng, Side, StrategyAgent, StrategyBase, STATE_DIM};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::agent::{ActionPolicy, GeneratorAgent};
use crate::config::EvaluationConfig;
use crate::error::{GanError, Result};
use crate::metrics::Metrics;
use crate::model::ProbabilityModel;

/// Per-strategy metrics in catalog order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rounds: usize,
    pub policy: ActionPolicy,
    pub per_strategy: Vec<Metrics>,
}

impl EvaluationReport {
    pub fn get(&self, strategy: StrategyBase) -> Option<&Metrics> {
        self.per_strategy.iter().find(|m| m.strategy == strategy)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Clone, Debug)]
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Play `strategy` for the configured number of rounds
    #[instrument(level = "debug", skip(self, generator))]
    pub fn evaluate<M>(&self, generator: &M, strategy: StrategyBase) -> Result<Metrics>
    where
        M: ProbabilityModel + ?Sized,
    {
        check_generator(generator)?;

        let root = SeededRng::new(self.config.seed, catalog_index(strategy));
        let mut agent = GeneratorAgent::new(generator, self.config.policy, root.for_stream(0));
        let mut opponent = StrategyAgent::new(strategy, root.for_stream(1));

        let record = play(&mut agent, &mut opponent, self.config.rounds)?;
        let metrics = Metrics::from_game(strategy, Side::A, &record);
        info!(
            %strategy,
            accuracy = metrics.accuracy,
            f1 = metrics.f1,
            generator_mean_payoff = metrics.generator_mean_payoff,
            opponent_mean_payoff = metrics.opponent_mean_payoff,
            "evaluated"
        );
        Ok(metrics)
    }

    pub fn evaluate_by_name<M>(&self, generator: &M, name: &str) -> Result<Metrics>
    where
        M: ProbabilityModel + ?Sized,
    {
        let strategy = StrategyBase::from_name(name)?;
        self.evaluate(generator, strategy)
    }

    /// Evaluate against every catalog strategy, reporting each separately
    #[instrument(level = "info", skip_all)]
    pub fn evaluate_all<M>(&self, generator: &M) -> Result<EvaluationReport>
    where
        M: ProbabilityModel + ?Sized,
    {
        let per_strategy = StrategyBase::ALL
            .into_iter()
            .map(|strategy| self.evaluate(generator, strategy))
            .collect::<Result<Vec<_>>>()?;

        Ok(EvaluationReport {
            rounds: self.config.rounds,
            policy: self.config.policy,
            per_strategy,
        })
    }
}

/// Threshold-policy evaluation with default seeding
pub fn evaluate<M>(generator: &M, strategy: StrategyBase, rounds: usize) -> Result<Metrics>
where
    M: ProbabilityModel + ?Sized,
{
    Evaluator::new(EvaluationConfig {
        rounds,
        ..Default::default()
    })?
    .evaluate(generator, strategy)
}

fn check_generator<M: ProbabilityModel + ?Sized>(generator: &M) -> Result<()> {
    if generator.input_dim() != STATE_DIM {
        return Err(GanError::Configuration(format!(
            "generator takes {} inputs, expected {STATE_DIM}",
            generator.input_dim()
        )));
    }
    Ok(())
}

fn catalog_index(strategy: StrategyBase) -> u64 {
    StrategyBase::ALL
        .iter()
        .position(|s| *s == strategy)
        .unwrap_or_default() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{ConstantModel, MirrorModel};
    use approx::assert_relative_eq;
    use match_logic::MatchError;

    #[test_log::test]
    fn test_always_defecting_generator_vs_cooperator() {
        let metrics = evaluate(&ConstantModel(1.0), StrategyBase::AlwaysCooperate, 100).unwrap();

        assert_eq!(metrics.rounds, 100);
        assert_eq!(metrics.accuracy, 0.0);
        assert_relative_eq!(metrics.generator_mean_payoff, 5.0);
        assert_relative_eq!(metrics.opponent_mean_payoff, 0.0);
        assert_eq!(metrics.generator_total_payoff, 500);
        assert_eq!(metrics.opponent_total_payoff, 0);
    }

    #[test]
    fn test_mirror_generator_replicates_tit_for_tat() {
        let metrics = evaluate(&MirrorModel, StrategyBase::TitForTat, 100).unwrap();

        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.generator_total_payoff, metrics.opponent_total_payoff);
        assert_eq!(metrics.generator_total_payoff, 300);
        assert_eq!(metrics.generator_cooperation_rate, 1.0);
    }

    #[test]
    fn test_mirror_generator_vs_always_defect() {
        let metrics = evaluate(&MirrorModel, StrategyBase::AlwaysDefect, 10).unwrap();

        // Cooperates once, then mirrors the defections
        assert_relative_eq!(metrics.accuracy, 0.9);
        assert_relative_eq!(metrics.precision, 1.0);
        assert_relative_eq!(metrics.recall, 0.9);
        assert_eq!(metrics.generator_total_payoff, 9);
        assert_eq!(metrics.opponent_total_payoff, 14);
    }

    #[test]
    fn test_evaluate_all_covers_catalog_in_order() {
        let evaluator = Evaluator::new(EvaluationConfig {
            rounds: 20,
            ..Default::default()
        })
        .unwrap();
        let report = evaluator.evaluate_all(&MirrorModel).unwrap();

        let strategies: Vec<_> = report.per_strategy.iter().map(|m| m.strategy).collect();
        assert_eq!(strategies, StrategyBase::ALL.to_vec());
        assert_eq!(report.rounds, 20);
        assert!(report.per_strategy.iter().all(|m| m.rounds == 20));
    }

    #[test]
    fn test_evaluate_all_matches_single_evaluations() {
        let evaluator = Evaluator::new(EvaluationConfig {
            rounds: 50,
            policy: ActionPolicy::Sample,
            seed: 99,
        })
        .unwrap();
        let model = ConstantModel(0.4);
        let report = evaluator.evaluate_all(&model).unwrap();

        for strategy in StrategyBase::ALL {
            let single = evaluator.evaluate(&model, strategy).unwrap();
            assert_eq!(report.get(strategy), Some(&single));
        }
    }

    #[test]
    fn test_sampled_evaluation_is_reproducible() {
        let config = EvaluationConfig {
            rounds: 100,
            policy: ActionPolicy::Sample,
            seed: 3,
        };
        let a = Evaluator::new(config.clone()).unwrap();
        let b = Evaluator::new(config).unwrap();
        let model = ConstantModel(0.5);

        assert_eq!(
            a.evaluate(&model, StrategyBase::Random).unwrap(),
            b.evaluate(&model, StrategyBase::Random).unwrap()
        );
    }

    #[test]
    fn test_evaluate_by_name() {
        let evaluator = Evaluator::new(EvaluationConfig::default()).unwrap();
        let metrics = evaluator.evaluate_by_name(&MirrorModel, "grim_trigger").unwrap();
        assert_eq!(metrics.strategy, StrategyBase::GrimTrigger);

        let err = evaluator.evaluate_by_name(&MirrorModel, "Pavlov2").unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, GanError::Match(MatchError::StrategyNotFound(_))));
    }

    #[test]
    fn test_zero_rounds_rejected() {
        assert!(matches!(
            evaluate(&MirrorModel, StrategyBase::TitForTat, 0),
            Err(GanError::Configuration(_))
        ));
    }

    #[test]
    fn test_domain_violation_surfaces() {
        let err = evaluate(&ConstantModel(2.0), StrategyBase::TitForTat, 10).unwrap_err();
        assert!(matches!(
            err,
            GanError::Match(MatchError::DomainViolation { .. })
        ));
    }

    #[test]
    fn test_report_json() {
        let evaluator = Evaluator::new(EvaluationConfig {
            rounds: 5,
            ..Default::default()
        })
        .unwrap();
        let report = evaluator.evaluate_all(&ConstantModel(0.0)).unwrap();
        let json = report.to_json_pretty().unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rows = parsed["per_strategy"].as_array().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0]["strategy"], "AlwaysCooperate");
        assert_eq!(rows[4]["strategy"], "WinStayLoseShift");
        assert_eq!(parsed["policy"], "Threshold");
    }
}

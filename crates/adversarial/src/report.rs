//! Train-then-evaluate runs and their structured output

use burn::module::AutodiffModule;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::RunConfig;
use crate::error::Result;
use crate::evaluator::{EvaluationReport, Evaluator};
use crate::trainer::{AdversarialTrainer, EpochLosses, StepLosses};

/// Everything a run produced, as plain data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub config: RunConfig,
    pub epochs: Vec<EpochLosses>,
    pub steps: Vec<StepLosses>,
    pub evaluation: EvaluationReport,
}

impl TrainingReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Train fresh networks, then replay the generator against the catalog
pub fn run(config: &RunConfig) -> Result<TrainingReport> {
    config.validate()?;
    let evaluator = Evaluator::new(config.evaluation.clone())?;

    let mut trainer = AdversarialTrainer::from_config(config.trainer.clone())?;
    trainer.train()?;
    let (generator, _discriminator, history) = trainer.into_parts();

    // Inference-only copy: evaluation never records gradients
    let evaluation = evaluator.evaluate_all(&generator.valid())?;
    info!(
        steps = history.len(),
        strategies = evaluation.per_strategy.len(),
        "run complete"
    );

    Ok(TrainingReport {
        config: config.clone(),
        epochs: history.epochs(),
        steps: history.steps,
        evaluation,
    })
}

//! Run configuration, loadable from JSON

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::ActionPolicy;
use crate::error::{GanError, Result};

/// Hyperparameters of the adversarial training loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Number of epochs; training never stops early
    pub epochs: usize,
    /// Training steps per epoch
    pub steps_per_epoch: usize,
    /// Expert games sampled per step
    pub batch_size: usize,
    /// Rounds in each sampled expert game
    pub rounds_per_game: usize,
    pub generator_learning_rate: f32,
    pub discriminator_learning_rate: f32,
    /// L2 norm each parameter gradient is clipped to before every update
    pub max_gradient_norm: f32,
    /// Hidden layer widths used for both networks, at least one layer
    pub hidden_layers: Vec<usize>,
    /// How generator probabilities become the moves the discriminator sees
    pub policy: ActionPolicy,
    /// Seeds weight initialisation and batch sampling
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            steps_per_epoch: 1,
            batch_size: 32,
            rounds_per_game: 10,
            generator_learning_rate: 0.01,
            discriminator_learning_rate: 0.01,
            max_gradient_norm: 1.0,
            hidden_layers: vec![16, 16],
            policy: ActionPolicy::Threshold,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("epochs", self.epochs)?;
        require_positive("steps_per_epoch", self.steps_per_epoch)?;
        require_positive("batch_size", self.batch_size)?;
        require_positive("rounds_per_game", self.rounds_per_game)?;
        require_positive_float("generator_learning_rate", self.generator_learning_rate)?;
        require_positive_float("discriminator_learning_rate", self.discriminator_learning_rate)?;
        require_positive_float("max_gradient_norm", self.max_gradient_norm)?;

        if self.hidden_layers.is_empty() {
            return Err(GanError::Configuration(
                "hidden_layers must name at least one layer".to_string(),
            ));
        }
        if self.hidden_layers.contains(&0) {
            return Err(GanError::Configuration(
                "hidden_layers widths must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn total_steps(&self) -> usize {
        self.epochs * self.steps_per_epoch
    }
}

/// How trained generators are replayed against the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Rounds per evaluation game
    pub rounds: usize,
    pub policy: ActionPolicy,
    /// Seeds the Random opponent and sampled generator moves
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            rounds: 100,
            policy: ActionPolicy::Threshold,
            seed: 7,
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("rounds", self.rounds)
    }
}

/// Everything a train-then-evaluate run needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub trainer: TrainerConfig,
    pub evaluation: EvaluationConfig,
}

impl RunConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Also requires training and evaluation to read the generator the same way
    pub fn validate(&self) -> Result<()> {
        self.trainer.validate()?;
        self.evaluation.validate()?;
        if self.trainer.policy != self.evaluation.policy {
            return Err(GanError::Configuration(format!(
                "trainer policy {:?} differs from evaluation policy {:?}",
                self.trainer.policy, self.evaluation.policy
            )));
        }
        Ok(())
    }
}

fn require_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(GanError::Configuration(format!(
            "{name} must be greater than 0"
        )));
    }
    Ok(())
}

fn require_positive_float(name: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GanError::Configuration(format!(
            "{name} must be a positive finite number, got {value}"
        )));
    }
    Ok(())
}

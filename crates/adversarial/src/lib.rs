//! Adversarial imitation of expert Prisoner's Dilemma play
//!
//! A generator maps the previous round (opponent move, own move) to a
//! probability of defecting. A discriminator sees (state, action) pairs and
//! learns to tell expert moves from generator moves. Training alternates the
//! two; evaluation replays the trained generator against every catalog
//! strategy and reports mimicry and payoff metrics per strategy.
//!
//! Both networks are [`burn`] modules; training runs on
//! [`TrainingBackend`] (CPU with autodiff) and evaluation only reads them.
//!
//! # Example
//!
//! ```no_run
//! use ipd_adversarial::{run, RunConfig};
//!
//! let report = run(&RunConfig::default())?;
//! for metrics in &report.evaluation.per_strategy {
//!     println!("{}: accuracy {:.2}", metrics.strategy, metrics.accuracy);
//! }
//! # Ok::<(), ipd_adversarial::GanError>(())
//! ```

mod agent;
mod config;
mod dataset;
mod error;
mod evaluator;
mod loss;
mod metrics;
mod mlp;
mod model;
mod report;
mod trainer;

#[cfg(test)]
mod test_util;

pub use agent::{ActionPolicy, GeneratorAgent, DEFECT_THRESHOLD};
pub use config::{EvaluationConfig, RunConfig, TrainerConfig};
pub use dataset::{sample_expert_batch, ExpertBatch};
pub use error::{GanError, Result};
pub use evaluator::{evaluate, EvaluationReport, Evaluator};
pub use loss::{binary_cross_entropy, Label};
pub use metrics::{ConfusionMatrix, Metrics};
pub use mlp::Mlp;
pub use model::{ModelRole, ProbabilityModel};
pub use report::{run, TrainingReport};
pub use trainer::{
    AdversarialTrainer, EpochLosses, StepLosses, TrainingBackend, TrainingHistory,
    DISCRIMINATOR_INPUT_DIM,
};

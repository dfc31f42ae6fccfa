//! Error types for training and evaluation

use match_logic::MatchError;
use thiserror::Error;

use crate::model::ModelRole;

#[derive(Error, Debug)]
pub enum GanError {
    /// Rejected before any work starts; never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A loss or gradient stopped being finite. Training is aborted and the
    /// offending update is not applied; `loss` is the last loss computed.
    #[error("{model} diverged at epoch {epoch}, step {step} (loss {loss})")]
    NumericDivergence {
        model: ModelRole,
        epoch: usize,
        step: usize,
        loss: f32,
    },

    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    /// Feature rows that do not fit the expected matrix shape
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GanError {
    /// Unknown strategy names count as configuration mistakes too
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GanError::Configuration(_) | GanError::Match(MatchError::StrategyNotFound(_))
        )
    }
}

/// Result type for training and evaluation
pub type Result<T> = std::result::Result<T, GanError>;

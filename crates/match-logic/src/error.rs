//! Error types for the match engine

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    /// No catalog strategy answers to the requested name.
    #[error("Unknown strategy: {0}")]
    StrategyNotFound(String),

    /// An action producer emitted something that is neither cooperate nor defect.
    #[error("Action producer returned {value}, expected a value in [0, 1]")]
    DomainViolation { value: f32 },
}

/// Result type for match engine operations
pub type Result<T> = std::result::Result<T, MatchError>;

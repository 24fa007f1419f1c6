use thiserror::Error;

use super::types::State;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// The transition table failed validation; nothing can be simulated.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A modified row lost all of its mass. The modifier rules only scale by
    /// non-negative factors, so this means a broken table or a logic bug.
    #[error("Invalid distribution from {state}: weights sum to {total}")]
    InvalidDistribution { state: State, total: f64 },
}

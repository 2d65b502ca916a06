use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("num_particles must be at least 2 (got {0})")]
    InvalidParticles(usize),
    #[error("num_trials must be at least 1 (got {0})")]
    InvalidTrials(usize),
    #[error("worker count must be at least 1 (got {0})")]
    InvalidWorkers(usize),
    #[error("trial has not reached both equilibrium and recurrence yet (step {steps})")]
    Incomplete { steps: u64 },
    #[error("simulation cancelled")]
    Cancelled,
    #[error("trial {index} failed: {reason}")]
    TrialFailed { index: usize, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// Configuration errors are raised before any trial starts.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidParticles(_) | Self::InvalidTrials(_) | Self::InvalidWorkers(_))
    }
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::seed::{clock_seed, derive_seeds};
use crate::types::Generator;

/// Everything a run needs; built by the caller and passed down explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    pub num_particles: usize,
    pub num_trials: usize,
    pub workers: usize,
    pub base_seed: u64,
    #[serde(default)]
    pub generator: Generator,
}

impl SimConfig {
    /// Single worker, Mersenne Twister, seeded from the wall clock.
    pub fn new(num_particles: usize, num_trials: usize) -> Self {
        Self { num_particles, num_trials, workers: 1, base_seed: clock_seed(), generator: Generator::Mt64 }
    }

    pub fn with_workers(mut self, workers: usize) -> Self { self.workers = workers; self }
    pub fn with_seed(mut self, base_seed: u64) -> Self { self.base_seed = base_seed; self }
    pub fn with_generator(mut self, generator: Generator) -> Self { self.generator = generator; self }

    pub fn validate(&self) -> Result<()> {
        if self.num_particles < 2 { return Err(SimError::InvalidParticles(self.num_particles)); }
        if self.num_trials < 1 { return Err(SimError::InvalidTrials(self.num_trials)); }
        if self.workers < 1 { return Err(SimError::InvalidWorkers(self.workers)); }
        Ok(())
    }

    pub fn seeds(&self) -> Vec<u64> { derive_seeds(self.base_seed, self.num_trials) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_degenerate_runs() {
        assert!(matches!(SimConfig::new(1, 10).validate(), Err(SimError::InvalidParticles(1))));
        assert!(matches!(SimConfig::new(4, 0).validate(), Err(SimError::InvalidTrials(0))));
        assert!(matches!(SimConfig::new(4, 3).with_workers(0).validate(), Err(SimError::InvalidWorkers(0))));
        assert!(SimConfig::new(2, 1).validate().is_ok());
    }

    #[test]
    fn seeds_follow_base() {
        let cfg = SimConfig::new(10, 3).with_seed(100);
        assert_eq!(cfg.seeds(), vec![100, 102, 104]);
    }

    #[test]
    fn json_without_generator_defaults_to_mt64() {
        let cfg: SimConfig = serde_json::from_str(
            r#"{"num_particles":8,"num_trials":2,"workers":4,"base_seed":9}"#,
        ).unwrap();
        assert_eq!(cfg.generator, Generator::Mt64);
        assert_eq!(cfg, SimConfig::new(8, 2).with_workers(4).with_seed(9));
    }
}

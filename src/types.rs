use serde::{Deserialize, Serialize};

/// Outcome of one finished trial.
///
/// `histogram[k]` counts the steps after which exactly `k` particles were
/// in the reference box, so `histogram.len() == num_particles + 1` and the
/// histogram sums to `total_steps()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub equilibrium_step: u64,
    pub poincare_step: u64,
    pub histogram: Vec<u64>,
}

impl TrialRecord {
    pub fn new(num_particles: usize) -> Self {
        Self { equilibrium_step: 0, poincare_step: 0, histogram: vec![0; num_particles + 1] }
    }

    #[inline] pub fn num_particles(&self) -> usize { self.histogram.len().saturating_sub(1) }

    /// Both stopping steps have been observed.
    #[inline]
    pub fn is_complete(&self) -> bool { self.equilibrium_step != 0 && self.poincare_step != 0 }

    #[inline]
    pub fn total_steps(&self) -> u64 { self.equilibrium_step.max(self.poincare_step) }
}

/// Which bit generator drives particle selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Generator {
    #[default]
    Mt64,
    SplitMix64,
}

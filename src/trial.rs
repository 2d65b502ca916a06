// src/trial.rs
// One Ehrenfest urn trial: every particle starts in box 1, each step flips
// one uniformly chosen particle, and the trial ends once the occupancy has
// hit n/2 (equilibrium) and returned to n (Poincare recurrence).

use std::sync::atomic::{AtomicBool, Ordering};

use rand::RngCore;

use crate::error::{Result, SimError};
use crate::selector::ParticleSelector;
use crate::types::TrialRecord;

pub struct Trial<R> {
    state: Vec<bool>,    // true = particle is in box 1
    count: usize,        // particles in box 1, always == sum(state)
    step: u64,
    record: TrialRecord,
    selector: ParticleSelector<R>,
}

impl<R: RngCore> Trial<R> {
    pub fn new(num_particles: usize, rng: R) -> Result<Self> {
        if num_particles < 2 { return Err(SimError::InvalidParticles(num_particles)); }
        Ok(Self {
            state: vec![true; num_particles],
            count: num_particles,
            step: 0,
            record: TrialRecord::new(num_particles),
            selector: ParticleSelector::new(rng, num_particles),
        })
    }

    #[inline] pub fn num_particles(&self) -> usize { self.state.len() }
    #[inline] pub fn equilibrium_target(&self) -> usize { self.state.len() / 2 }
    /// Steps taken so far.
    #[inline] pub fn steps(&self) -> u64 { self.step }
    /// Current occupancy count of box 1.
    #[inline] pub fn occupancy(&self) -> usize { self.count }
    #[inline] pub fn state(&self) -> &[bool] { &self.state }
    #[inline] pub fn is_terminal(&self) -> bool { self.record.is_complete() }

    /// Flips one particle and returns the new occupancy. Does nothing once terminal.
    pub fn step(&mut self) -> usize {
        if self.is_terminal() { return self.count; }

        let i = self.selector.select();
        let bit = &mut self.state[i];
        *bit = !*bit;
        if *bit { self.count += 1; } else { self.count -= 1; }
        self.step += 1;

        self.record.histogram[self.count] += 1;
        if self.record.equilibrium_step == 0 && self.count == self.equilibrium_target() {
            self.record.equilibrium_step = self.step;
        }
        if self.record.poincare_step == 0 && self.count == self.state.len() {
            self.record.poincare_step = self.step;
        }
        self.count
    }

    /// Evolves until both stopping steps are known. There is no step cap:
    /// recurrence time is unbounded but finite almost surely.
    pub fn run(&mut self) -> &TrialRecord {
        while !self.is_terminal() { self.step(); }
        &self.record
    }

    /// Like `run`, but checks `stop` between steps.
    pub fn run_until(&mut self, stop: &AtomicBool) -> Result<&TrialRecord> {
        while !self.is_terminal() {
            if stop.load(Ordering::Relaxed) { return Err(SimError::Cancelled); }
            self.step();
        }
        Ok(&self.record)
    }

    pub fn record(&self) -> Result<&TrialRecord> {
        if !self.is_terminal() { return Err(SimError::Incomplete { steps: self.step }); }
        Ok(&self.record)
    }

    pub fn into_record(self) -> Result<TrialRecord> {
        if !self.is_terminal() { return Err(SimError::Incomplete { steps: self.step }); }
        Ok(self.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{Mt64, SplitMix64};
    use rand::SeedableRng;

    fn trial(n: usize, seed: u64) -> Trial<Mt64> {
        Trial::new(n, Mt64::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn rejects_fewer_than_two_particles() {
        assert!(matches!(Trial::new(1, Mt64::seed_from_u64(1)), Err(SimError::InvalidParticles(1))));
        assert!(matches!(Trial::new(0, Mt64::seed_from_u64(1)), Err(SimError::InvalidParticles(0))));
    }

    #[test]
    fn starts_with_every_particle_in_box_one() {
        let t = trial(6, 1);
        assert_eq!(t.occupancy(), 6);
        assert!(t.state().iter().all(|&b| b));
        assert_eq!(t.steps(), 0);
        assert!(!t.is_terminal());
    }

    #[test]
    fn first_flip_always_leaves_box_one() {
        for seed in 0..32 {
            let mut t = trial(4, seed);
            assert_eq!(t.step(), 3);
        }
    }

    #[test]
    fn each_step_flips_exactly_one_particle() {
        let mut t = trial(9, 5);
        let mut prev = t.state().to_vec();
        for _ in 0..500 {
            if t.is_terminal() { break; }
            t.step();
            let diff = prev.iter().zip(t.state()).filter(|(a, b)| a != b).count();
            assert_eq!(diff, 1);
            assert_eq!(t.occupancy(), t.state().iter().filter(|&&b| b).count());
            prev = t.state().to_vec();
        }
    }

    #[test]
    fn premature_record_access_fails() {
        let mut t = trial(8, 3);
        assert!(matches!(t.record(), Err(SimError::Incomplete { steps: 0 })));
        t.step();
        assert!(matches!(t.record(), Err(SimError::Incomplete { steps: 1 })));
        assert!(matches!(t.into_record(), Err(SimError::Incomplete { .. })));
    }

    #[test]
    fn stopping_steps_are_first_hits() {
        for n in 2..=9 {
            for seed in 0..10 {
                let mut t = trial(n, seed);
                let mut path = Vec::new();
                while !t.is_terminal() { path.push(t.step()); }
                let rec = t.into_record().unwrap();

                let first = |target: usize| path.iter().position(|&c| c == target).map(|p| p as u64 + 1);
                assert_eq!(Some(rec.equilibrium_step), first(n / 2), "n={} seed={}", n, seed);
                assert_eq!(Some(rec.poincare_step), first(n), "n={} seed={}", n, seed);
                assert_eq!(path.len() as u64, rec.total_steps());
            }
        }
    }

    #[test]
    fn histogram_sums_to_total_steps() {
        for n in [2usize, 3, 4, 7, 10] {
            let mut t = trial(n, 11);
            let rec = t.run().clone();
            assert_eq!(rec.histogram.len(), n + 1);
            assert_eq!(rec.histogram.iter().sum::<u64>(), rec.total_steps());
            assert!(rec.equilibrium_step > 0 && rec.poincare_step > 0);
            // the final step always lands on one of the two targets
            assert_eq!(t.steps(), rec.total_steps());
        }
    }

    #[test]
    fn two_particles_reach_equilibrium_on_first_step() {
        for seed in 0..50 {
            let rec = trial(2, seed).run().clone();
            assert_eq!(rec.equilibrium_step, 1);
            assert_eq!(rec.poincare_step % 2, 0);
            // odd steps always land on count 1
            assert_eq!(rec.histogram[1], rec.poincare_step / 2);
        }
    }

    #[test]
    fn four_particles_seed_42_terminates_with_positive_steps() {
        let rec = trial(4, 42).run().clone();
        assert!(rec.equilibrium_step > 0);
        assert!(rec.poincare_step > 0);
        // recurrence was observed, so the full box was visited at least once
        assert!(rec.histogram[4] >= 1);
        assert!(rec.histogram[2] >= 1);
    }

    #[test]
    fn small_systems_terminate_well_within_cap() {
        const CAP: u64 = 1_000_000;
        for n in 2..=10 {
            for seed in 0..5 {
                let mut t = Trial::new(n, SplitMix64::seed_from_u64(seed)).unwrap();
                while !t.is_terminal() && t.steps() < CAP { t.step(); }
                assert!(t.is_terminal(), "n={} seed={} hit the cap", n, seed);
            }
        }
    }

    #[test]
    fn steps_after_terminal_are_ignored() {
        let mut t = trial(3, 8);
        let rec = t.run().clone();
        let c = t.occupancy();
        assert_eq!(t.step(), c);
        assert_eq!(t.steps(), rec.total_steps());
        assert_eq!(t.record().unwrap(), &rec);
    }

    #[test]
    fn run_until_observes_stop_flag() {
        let stop = AtomicBool::new(true);
        let mut t = trial(12, 1);
        assert!(matches!(t.run_until(&stop), Err(SimError::Cancelled)));
        assert_eq!(t.steps(), 0);

        stop.store(false, Ordering::Relaxed);
        let rec = t.run_until(&stop).unwrap().clone();
        assert_eq!(rec, trial(12, 1).run().clone());
    }
}

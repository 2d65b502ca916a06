// src/sim.rs
// Runs many independent trials on a fixed worker pool and gathers their
// records in trial order.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use rand::{RngCore, SeedableRng};
use tracing::{debug, error, info};

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::par::parallel_map_indexed;
use crate::progress::{ProgressSink, ProgressTicker};
use crate::seed::{Mt64, SplitMix64};
use crate::trial::Trial;
use crate::types::{Generator, TrialRecord};

/// Runs `cfg.num_trials` trials and returns their records, indexed by trial.
pub fn run_simulation(cfg: &SimConfig, progress: &dyn ProgressSink) -> Result<Vec<TrialRecord>> {
    run_simulation_until(cfg, progress, &AtomicBool::new(false))
}

/// `run_simulation` with a cooperative stop flag. A stopped run yields
/// `SimError::Cancelled`, never a partial set of records.
pub fn run_simulation_until(
    cfg: &SimConfig,
    progress: &dyn ProgressSink,
    stop: &AtomicBool,
) -> Result<Vec<TrialRecord>> {
    cfg.validate()?;
    let seeds = cfg.seeds();
    info!(
        num_particles = cfg.num_particles,
        num_trials = cfg.num_trials,
        workers = cfg.workers,
        base_seed = cfg.base_seed,
        generator = ?cfg.generator,
        "starting simulation"
    );
    if cfg.num_particles % 2 == 1 {
        debug!(equilibrium_target = cfg.num_particles / 2, "odd particle count, equilibrium target rounds down");
    }

    let t0 = Instant::now();
    let records = run_trials(cfg.num_particles, &seeds, cfg.workers, cfg.generator, progress, stop)?;
    let steps: u64 = records.iter().map(TrialRecord::total_steps).sum();
    info!(elapsed_ms = t0.elapsed().as_millis() as u64, total_steps = steps, "simulation finished");
    Ok(records)
}

/// Trial `i` always runs with `seeds[i]`, whatever worker picks it up, so
/// the result does not depend on `workers`.
pub fn run_trials(
    num_particles: usize,
    seeds: &[u64],
    workers: usize,
    generator: Generator,
    progress: &dyn ProgressSink,
    stop: &AtomicBool,
) -> Result<Vec<TrialRecord>> {
    if num_particles < 2 { return Err(SimError::InvalidParticles(num_particles)); }
    if seeds.is_empty() { return Err(SimError::InvalidTrials(0)); }
    if workers < 1 { return Err(SimError::InvalidWorkers(workers)); }

    collect_trials(seeds, workers, progress, |seed, i| {
        let rec = run_trial_until(num_particles, seed, generator, stop);
        if let Ok(r) = &rec {
            debug!(trial = i, seed, equilibrium = r.equilibrium_step, poincare = r.poincare_step, "trial finished");
        }
        rec
    })
}

/// Runs `job(seeds[i], i)` for every trial on the pool and folds the
/// outcomes. Cancelled trials do not advance progress; finished and failed
/// ones do, so a run that ends normally always reports `(T, T)`.
fn collect_trials<F>(seeds: &[u64], workers: usize, progress: &dyn ProgressSink, job: F) -> Result<Vec<TrialRecord>>
where
    F: Fn(u64, usize) -> Result<TrialRecord> + Sync,
{
    let total = seeds.len();
    let ticker = ProgressTicker::new(progress, total);

    let results = parallel_map_indexed(
        seeds,
        workers,
        |&seed, i| job(seed, i),
        |_, res| {
            if !matches!(res, Ok(Err(SimError::Cancelled))) { ticker.tick(); }
        },
    );

    let mut records = Vec::with_capacity(total);
    let mut failure: Option<SimError> = None;
    let mut cancelled = false;
    for (index, res) in results.into_iter().enumerate() {
        let reason = match res {
            Ok(Ok(rec)) => { records.push(rec); continue; }
            Ok(Err(SimError::Cancelled)) => { cancelled = true; continue; }
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic,
        };
        error!(trial = index, %reason, "trial failed");
        failure.get_or_insert(SimError::TrialFailed { index, reason });
    }

    if let Some(e) = failure { return Err(e); }
    if cancelled { return Err(SimError::Cancelled); }
    Ok(records)
}

/// One complete trial from its seed.
pub fn run_trial(num_particles: usize, seed: u64, generator: Generator) -> Result<TrialRecord> {
    run_trial_until(num_particles, seed, generator, &AtomicBool::new(false))
}

fn run_trial_until(num_particles: usize, seed: u64, generator: Generator, stop: &AtomicBool) -> Result<TrialRecord> {
    match generator {
        Generator::Mt64 => evolve(num_particles, Mt64::seed_from_u64(seed), stop),
        Generator::SplitMix64 => evolve(num_particles, SplitMix64::seed_from_u64(seed), stop),
    }
}

fn evolve<R: RngCore>(num_particles: usize, rng: R, stop: &AtomicBool) -> Result<TrialRecord> {
    let mut trial = Trial::new(num_particles, rng)?;
    trial.run_until(stop)?;
    trial.into_record()
}

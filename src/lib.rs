//! ehrenfest — seeded Ehrenfest urn simulations.
//!
//! N particles start in box 1; each step moves one uniformly chosen particle
//! to the other box. Every trial records its first return to a half-full box
//! (equilibrium), its first return to the starting state (Poincare
//! recurrence), and a histogram of the occupancies it visited.
//!
//! Modules:
//! - `seed`: Mt64 / SplitMix64 bit generators, per-trial seed derivation.
//! - `selector`: draw -> particle index.
//! - `trial`: the per-trial state machine.
//! - `types`: TrialRecord, Generator.
//! - `config`: SimConfig + validation.
//! - `par`: index-ordered worker pool.
//! - `progress`: ProgressSink, text progress bar.
//! - `sim`: run many trials and collect records.
//! - `persist`: text / JSON-lines record writer.
//! - `header`: run manifest for reproducibility.

pub mod error;
pub mod types;
pub mod seed;
pub mod selector;
pub mod trial;
pub mod config;
pub mod par;
pub mod progress;
pub mod sim;
pub mod persist;
pub mod header;

pub use error::{Result, SimError};
pub use types::{Generator, TrialRecord};
pub use seed::{clock_seed, derive_seeds, Mt64, SplitMix64};
pub use selector::ParticleSelector;
pub use trial::Trial;
pub use config::SimConfig;
pub use progress::{format_elapsed, NoProgress, ProgressBar, ProgressSink};
pub use sim::{run_simulation, run_simulation_until, run_trial, run_trials};
pub use persist::{save_records, write_records, RecordFormat};
pub use header::RunManifest;

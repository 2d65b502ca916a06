use std::{path::PathBuf, time::Instant};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ehrenfest::{
    clock_seed, format_elapsed, run_simulation, save_records, Generator, NoProgress, ProgressBar,
    RecordFormat, RunManifest, SimConfig,
};

#[derive(Clone, Copy, ValueEnum, Debug)]
enum GeneratorArg { Mt64, SplitMix64 }
impl From<GeneratorArg> for Generator {
    fn from(g: GeneratorArg) -> Self {
        match g { GeneratorArg::Mt64 => Generator::Mt64, GeneratorArg::SplitMix64 => Generator::SplitMix64 }
    }
}

#[derive(Clone, Copy, ValueEnum, Debug)]
enum FormatArg { Text, Jsonl }
impl From<FormatArg> for RecordFormat {
    fn from(f: FormatArg) -> Self {
        match f { FormatArg::Text => RecordFormat::Text, FormatArg::Jsonl => RecordFormat::JsonLines }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ehrenfest",
    version,
    about = "A simulation of the Ehrenfest model of diffusion for N particles in two boxes",
    arg_required_else_help = true
)]
struct Args {
    /// Number of particles for the simulation (N >= 2)
    #[arg(long)] num_particles: usize,
    /// Number of independent trials
    #[arg(long, default_value_t = 30)] num_trials: usize,
    /// Worker threads running trials concurrently
    #[arg(long, default_value_t = 1)] num_threads: usize,
    #[arg(long, default_value = "EhrenfestModel.dat")] output_file: PathBuf,
    /// 0 = silent, 1 = summary, 2 = summary + progress bar
    #[arg(long, alias = "set-verbose", default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=2))]
    verbose: u8,

    /// Base seed; trial i uses seed + 2i. Defaults to the wall clock.
    #[arg(long)] seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = GeneratorArg::Mt64)] generator: GeneratorArg,
    #[arg(long, value_enum, default_value_t = FormatArg::Text)] format: FormatArg,
    /// Also write `<output-file>.json` describing the run
    #[arg(long, default_value_t = false)] manifest: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let t0 = Instant::now();

    let cfg = SimConfig {
        num_particles: args.num_particles,
        num_trials: args.num_trials,
        workers: args.num_threads,
        base_seed: args.seed.unwrap_or_else(clock_seed),
        generator: args.generator.into(),
    };
    cfg.validate().context("invalid configuration")?;
    if let Ok(avail) = std::thread::available_parallelism() {
        if cfg.workers > avail.get() {
            warn!(requested = cfg.workers, available = avail.get(), "more worker threads than cores");
        }
    }

    if args.verbose > 0 {
        println!("\n EhrenfestModel initialized. Running {} trials of N = {} (seed {}) ...",
                 cfg.num_trials, cfg.num_particles, cfg.base_seed);
    }

    let records = if args.verbose > 1 {
        run_simulation(&cfg, &ProgressBar::stderr())
    } else {
        run_simulation(&cfg, &NoProgress)
    }.context("simulation failed")?;

    let format: RecordFormat = args.format.into();
    if args.verbose > 0 {
        println!("\n Writing data to \"{}\" ... ", args.output_file.display());
    }
    save_records(&args.output_file, &records, format)
        .with_context(|| format!("writing {}", args.output_file.display()))?;

    if args.manifest {
        let path = RunManifest::path_for(&args.output_file);
        RunManifest::new(cfg, format, &args.output_file)
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if args.verbose > 0 {
        println!(" done");
        println!(" --------------------------------------------------");
        println!(" Total Elapsed Time: {}\n", format_elapsed(t0.elapsed()));
    }
    Ok(())
}

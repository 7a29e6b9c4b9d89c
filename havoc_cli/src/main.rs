use havoc_core::config::HavocConfig;
use havoc_core::replay::digest;
use havoc_core::{
    ChainRng, DEFAULT_SEED, MutationMode, ReplayLog, ReplayRecord, mutate_bytes, read_replay_log,
    replay,
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Deterministic havoc-style byte mutation", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mutate seed inputs and write the results to an output directory
    Run(RunArgs),
    /// Reproduce mutations recorded in a replay log
    Replay {
        /// Replay log written by `run`
        #[clap(short, long)]
        log: PathBuf,
        /// The exact input the recorded mutations started from
        #[clap(short, long)]
        input: PathBuf,
        /// Replay only the record at this position in the log
        #[clap(long)]
        index: Option<usize>,
        /// Write the reproduced bytes here instead of printing hex
        #[clap(short, long, requires = "index")]
        output: Option<PathBuf>,
    },
    /// Print bounded draws from a freshly seeded generator
    Rand {
        #[clap(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        #[clap(long)]
        max: u32,
        #[clap(long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    #[clap(long)]
    seed: Option<u64>,
    #[clap(long, value_enum)]
    mode: Option<ModeArg>,
    #[clap(short, long)]
    iterations: Option<u64>,
    #[clap(short, long)]
    threads: Option<usize>,
    /// Seed input file or directory; may be repeated
    #[clap(long = "input")]
    inputs: Vec<PathBuf>,
    #[clap(short, long)]
    output_dir: Option<PathBuf>,
    #[clap(long)]
    replay_log: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    FixedSize,
    VariableLength,
}

impl From<ModeArg> for MutationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::FixedSize => MutationMode::FixedSize,
            ModeArg::VariableLength => MutationMode::VariableLength,
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Replay {
            log,
            input,
            index,
            output,
        } => replay_from_log(&log, &input, index, output.as_deref()),
        Commands::Rand { seed, max, count } => {
            let mut rng = ChainRng::new(seed);
            for _ in 0..count {
                println!("{}", rng.rand_range(max));
            }
            println!("state: {:#018x}", rng.state());
            Ok(())
        }
    }
}

fn load_config(config_file: Option<PathBuf>) -> Result<HavocConfig, anyhow::Error> {
    match config_file {
        Some(config_path) => {
            info!("Loading configuration from specified path: {config_path:?}");
            HavocConfig::load_from_file(&config_path)
        }
        None => {
            let default_config_path = PathBuf::from("havoc.toml");
            if default_config_path.exists() {
                info!("No config file specified via CLI, loading default: {default_config_path:?}");
                HavocConfig::load_from_file(&default_config_path)
            } else {
                info!("No config file specified and default 'havoc.toml' not found, using built-in defaults.");
                Ok(HavocConfig::default())
            }
        }
    }
}

/// Reads every file named directly, plus the files directly inside named directories.
fn load_seed_inputs(paths: &[PathBuf]) -> Result<Vec<Vec<u8>>, anyhow::Error> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_file() {
            inputs.push(std::fs::read(path).with_context(|| format!("reading seed {path:?}"))?);
        } else if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if file_path.is_file() {
                    inputs.push(
                        std::fs::read(&file_path)
                            .with_context(|| format!("reading seed {file_path:?}"))?,
                    );
                }
            }
        } else {
            warn!("Seed path {path:?} does not exist, skipping");
        }
    }
    Ok(inputs)
}

struct Shared<'a> {
    inputs: &'a [Vec<u8>],
    mode: MutationMode,
    seed: u64,
    iterations: u64,
    output_dir: &'a Path,
    seen: Option<Mutex<HashSet<[u8; 16]>>>,
    replay_log: Option<Mutex<ReplayLog>>,
}

#[derive(Default, Debug)]
struct WorkerStats {
    mutations: u64,
    written: u64,
}

fn run_worker(worker: usize, shared: &Shared<'_>) -> Result<WorkerStats, anyhow::Error> {
    let mut rng = ChainRng::for_worker(shared.seed, worker);
    let mut stats = WorkerStats::default();
    debug!("Worker {} starting from state {:#018x}", worker, rng.state());

    for iteration in 0..shared.iterations {
        let input = &shared.inputs[rng.below(shared.inputs.len())];
        let state = rng.state();
        let output = mutate_bytes(&mut rng, input, shared.mode)?;
        stats.mutations += 1;

        if let Some(log) = &shared.replay_log {
            let record =
                ReplayRecord::capture(worker, iteration, state, shared.mode, input, &output);
            log.lock()
                .map_err(|_| anyhow::anyhow!("replay log lock poisoned"))?
                .append(&record)?;
        }

        let file_name = match &shared.seen {
            Some(seen) => {
                let hash = md5::compute(&output).0;
                let fresh = seen
                    .lock()
                    .map_err(|_| anyhow::anyhow!("dedupe set lock poisoned"))?
                    .insert(hash);
                if !fresh {
                    continue;
                }
                format!("{}.bin", digest(&output))
            }
            None => format!("w{worker}_{iteration:08}.bin"),
        };
        std::fs::write(shared.output_dir.join(&file_name), &output)
            .with_context(|| format!("writing {file_name}"))?;
        stats.written += 1;
    }
    Ok(stats)
}

fn run(args: RunArgs) -> Result<(), anyhow::Error> {
    let mut config = load_config(args.config_file)?;

    if let Some(seed) = args.seed {
        config.engine.seed = seed;
    }
    if let Some(mode) = args.mode {
        config.engine.mode = mode.into();
    }
    if let Some(iterations) = args.iterations {
        config.run.iterations = iterations;
    }
    if let Some(threads) = args.threads {
        config.run.threads = threads;
    }
    if !args.inputs.is_empty() {
        config.run.input_paths = Some(args.inputs);
    }
    if let Some(output_dir) = args.output_dir {
        config.run.output_dir = output_dir;
    }
    if let Some(replay_log) = args.replay_log {
        config.run.replay_log = Some(replay_log);
    }
    info!("Effective configuration: {config:#?}");

    let mut inputs = match &config.run.input_paths {
        Some(paths) => load_seed_inputs(paths)?,
        None => Vec::new(),
    };
    if inputs.is_empty() {
        inputs.push(b"INIT".to_vec());
    }

    std::fs::create_dir_all(&config.run.output_dir)
        .with_context(|| format!("creating output dir {:?}", config.run.output_dir))?;

    let replay_log = match &config.run.replay_log {
        Some(path) => Some(Mutex::new(ReplayLog::open(path)?)),
        None => None,
    };
    let shared = Shared {
        inputs: &inputs,
        mode: config.engine.mode,
        seed: config.engine.seed,
        iterations: config.run.iterations,
        output_dir: &config.run.output_dir,
        seen: config.run.dedupe.then(|| Mutex::new(HashSet::new())),
        replay_log,
    };
    let threads = config.run.threads.max(1);

    info!(
        "Starting {} worker(s), {} mutations each, over {} seed input(s)...",
        threads,
        config.run.iterations,
        inputs.len()
    );
    let start_time = Instant::now();

    let results: Vec<Result<WorkerStats, anyhow::Error>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|worker| {
                let shared = &shared;
                scope.spawn(move || run_worker(worker, shared))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("worker thread panicked")))
            })
            .collect()
    });

    let mut total = WorkerStats::default();
    for stats in results {
        let stats = stats?;
        total.mutations += stats.mutations;
        total.written += stats.written;
    }
    if let Some(log) = &shared.replay_log {
        log.lock()
            .map_err(|_| anyhow::anyhow!("replay log lock poisoned"))?
            .flush()?;
    }

    let elapsed = start_time.elapsed();
    let per_sec = if elapsed.as_secs_f64() > 0.0 {
        total.mutations as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    info!(
        "Finished in {:.2?}: {} mutations, {} outputs written to {:?} ({:.2} mutations/sec)",
        elapsed, total.mutations, total.written, config.run.output_dir, per_sec
    );
    Ok(())
}

/// `<worker> <iteration> <hex bytes>`
fn hex_line(record: &ReplayRecord, reproduced: &[u8]) -> String {
    format!("{} {} {}", record.worker, record.iteration, hex::encode(reproduced))
}

fn replay_from_log(
    log_path: &Path,
    input_path: &Path,
    index: Option<usize>,
    output: Option<&Path>,
) -> Result<(), anyhow::Error> {
    let records = read_replay_log(log_path)?;
    let input = std::fs::read(input_path).with_context(|| format!("reading {input_path:?}"))?;

    let selected: Vec<&ReplayRecord> = match index {
        Some(i) => vec![records.get(i).ok_or_else(|| {
            anyhow::anyhow!("replay log has {} records, no index {}", records.len(), i)
        })?],
        None => {
            let input_md5 = digest(&input);
            records.iter().filter(|r| r.input_md5 == input_md5).collect()
        }
    };
    if selected.is_empty() {
        anyhow::bail!("no record in {log_path:?} matches input {input_path:?}");
    }
    info!("Replaying {} record(s)", selected.len());

    for record in selected {
        let reproduced = replay(record, &input)?;
        match output {
            Some(path) => {
                std::fs::write(path, &reproduced).with_context(|| format!("writing {path:?}"))?;
                info!(
                    "Worker {} iteration {} reproduced ({} bytes) -> {:?}",
                    record.worker,
                    record.iteration,
                    reproduced.len(),
                    path
                );
            }
            None => println!("{}", hex_line(record, &reproduced)),
        }
    }
    Ok(())
}

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use neds::{
    Config, RandomSource, SimEvent, Simulation,
    record::{Recorder, TrajectoryWriter},
};
use std::{
    path::PathBuf,
    sync::{Arc, Weak},
    thread,
};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    config: PathBuf,

    /// Override the configured random seed.
    #[arg(long, allow_hyphen_values = true)]
    seed: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the continuous loop on a worker thread and record a trajectory.
    Run {
        #[arg(long)]
        output: PathBuf,
    },

    /// Perform a fixed number of ticks synchronously.
    Step {
        #[arg(long, default_value_t = 1)]
        count: u64,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let cfg = Config::from_file(&args.config).context("failed to construct cfg")?;
    log::info!("{cfg:#?}");

    let rng = match args.seed.or(cfg.run.seed) {
        Some(seed) => RandomSource::from_seed(seed),
        None => RandomSource::from_fresh_seed(),
    };
    let sim = Simulation::new(
        cfg.dimensions(),
        cfg.world.population,
        cfg.food_range(),
        cfg.run.delay_ms,
        rng,
    )
    .context("failed to construct simulation")?;

    match args.command {
        Command::Run { output } => run_loop(Arc::new(sim), &cfg, output)?,
        Command::Step { count } => step_n(&sim, count),
    }

    Ok(())
}

fn run_loop(sim: Arc<Simulation>, cfg: &Config, output: PathBuf) -> Result<()> {
    let writer = TrajectoryWriter::create(&output).context("failed to open trajectory")?;
    let recorder = Recorder::new(&sim, writer, cfg.output.ticks_per_record);
    let status = recorder.status();
    sim.add_listener(recorder);

    if let Some(max_ticks) = cfg.run.max_ticks {
        let weak: Weak<Simulation> = Arc::downgrade(&sim);
        sim.add_listener(move |event: SimEvent| {
            let Some(sim) = weak.upgrade() else {
                return;
            };
            if event == SimEvent::Step && sim.tick() >= max_ticks {
                sim.cancel();
            }
        });
    }

    let worker = {
        let sim = Arc::clone(&sim);
        thread::spawn(move || sim.run())
    };
    worker
        .join()
        .map_err(|_| anyhow!("simulation thread panicked"))?;

    status.check()?;
    log::info!("wrote {output:?}");
    Ok(())
}

fn step_n(sim: &Simulation, count: u64) {
    for _ in 0..count {
        if sim.population() == 0 {
            log::info!("population died out");
            break;
        }
        sim.step();
    }

    let stats = sim.stats();
    log::info!("{stats:#?}");
    if let Some(oldest) = sim.oldest_agent() {
        log::info!("oldest: {oldest}");
    }
    sim.dump_index();
}

//! Train a vanilla policy gradient agent from a JSON settings file.
//!
//! ```text
//! vpg --settings settings/settings.json --iterations 200000 --csv metrics.csv
//! RUST_LOG=vpg=debug vpg
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::backend::{Autodiff, NdArray};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vpg::{
    make_env, ActorCriticConfig, AdamVpgLearner, BatchScheduler, ConsoleLogger, ConstantLr,
    CsvLogger, Environment, LrScheduler, MultiLogger, OneCycleLr, SchedulerConfig, TrainerConfig,
};

type Backend = Autodiff<NdArray<f32>>;

#[derive(Parser, Debug)]
#[command(name = "vpg")]
#[command(about = "Vanilla policy gradient trainer", long_about = None)]
struct Cli {
    /// Settings file path
    #[arg(short, long, default_value = "settings/settings.json")]
    settings: PathBuf,

    /// Override the number of environment steps
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write per-batch metrics to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<TrainerConfig> {
    let mut config = TrainerConfig::from_json_file(&cli.settings)
        .with_context(|| format!("loading {}", cli.settings.display()))?;

    if let Some(iterations) = cli.iterations {
        config = config.with_iterations(iterations);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if cli.csv.is_some() {
        config = config.with_csv_path(cli.csv.clone());
    }

    config.build().context("invalid settings")
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let env = make_env(&config.env_name, config.seed)?;
    let net = ActorCriticConfig::new(env.obs_size(), env.n_actions(), config.hidden_dim);
    let lr_scheduler: Box<dyn LrScheduler> = match config.cycle_steps {
        Some(steps) => Box::new(OneCycleLr::new(config.lr, steps)),
        None => Box::new(ConstantLr::new(config.lr)),
    };
    let learner =
        AdamVpgLearner::<Backend>::with_adam(net, lr_scheduler, config.seed, Default::default())
            .with_normalized_advantages(config.normalize_advantages);

    let mut logger = MultiLogger::new().add(ConsoleLogger::new(config.log_interval));
    if let Some(path) = &config.csv_path {
        let csv = CsvLogger::new(path)
            .with_context(|| format!("creating metrics file {}", path.display()))?;
        logger = logger.add(csv);
    }

    info!(
        env = %config.env_name,
        obs_size = net.obs_size,
        n_actions = net.n_actions,
        hidden_dim = net.hidden_dim,
        lr = config.lr,
        "building trainer"
    );

    let mut scheduler = BatchScheduler::new(SchedulerConfig::from(&config), env, learner)?
        .with_logger(Box::new(logger));
    let summary = scheduler.run(|_| {})?;

    if let Some(last) = summary.last_summary {
        info!(
            mean_return = last.mean_return,
            mean_length = last.mean_length,
            "final batch"
        );
    }

    Ok(())
}

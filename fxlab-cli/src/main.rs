//! FxLab CLI — backtest, evolve, and validate commands.
//!
//! Commands:
//! - `backtest` — run one genome over a CSV bar file and export artifacts
//! - `evolve` — run the genetic optimizer and export the best result
//! - `validate` — check a config file (and optionally its data) without running

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fxlab_core::domain::Timeframe;
use fxlab_core::engine::{curve_span, CancelToken};
use fxlab_core::store::BarStore;
use fxlab_core::strategy::Genome;
use fxlab_runner::{
    export_evolution, export_run, load_store, run_backtest, GeneticOptimizer, RunConfig,
};

#[derive(Parser)]
#[command(name = "fxlab", about = "FxLab CLI — forex backtesting and strategy evolution")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest from a TOML config over a CSV bar file.
    Backtest {
        /// Path to the TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// CSV file with finest-timeframe bars (timestamp,o,h,l,c,volume).
        #[arg(long)]
        data: PathBuf,

        /// JSON genome file. Defaults to the template's mid-range genome.
        #[arg(long)]
        genome: Option<PathBuf>,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Evolve strategy genomes with the genetic optimizer.
    Evolve {
        /// Path to the TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// CSV file with finest-timeframe bars.
        #[arg(long)]
        data: PathBuf,

        /// Output directory for evolution artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Validate a config file, and its data when given, without running.
    Validate {
        /// Path to the TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Optional CSV file to load-check against the config window.
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Backtest {
            config,
            data,
            genome,
            output_dir,
        } => cmd_backtest(&config, &data, genome.as_deref(), &output_dir),
        Commands::Evolve {
            config,
            data,
            output_dir,
        } => cmd_evolve(&config, &data, &output_dir),
        Commands::Validate { config, data } => cmd_validate(&config, data.as_deref()),
    }
}

fn load(config: &RunConfig, data: &std::path::Path) -> Result<BarStore> {
    let store = load_store(
        data,
        &config.instrument,
        Timeframe::H1,
        &[Timeframe::H4],
        config.start,
        config.end,
    )
    .with_context(|| format!("loading bars from {}", data.display()))?;
    println!(
        "loaded {} {} bars for {}",
        store.base_series().len(),
        store.base_timeframe(),
        store.instrument()
    );
    Ok(store)
}

fn cmd_backtest(
    config_path: &std::path::Path,
    data: &std::path::Path,
    genome_path: Option<&std::path::Path>,
    output_dir: &std::path::Path,
) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let store = load(&config, data)?;

    let genome = match genome_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading genome {}", path.display()))?;
            serde_json::from_str::<Genome>(&text)
                .with_context(|| format!("parsing genome {}", path.display()))?
        }
        None => Genome::default_for(config.optimizer.template),
    };

    let result = run_backtest(&store, &config, &genome, CancelToken::new())?;
    if let Some((start, end)) = curve_span(&result.equity_curve) {
        println!("replayed {start} .. {end}");
    }
    if let Some(metrics) = &result.metrics {
        println!(
            "fitness {:.4} | return {:+.2}% | max drawdown {:.2}% | trades {} | win rate {:.0}% | rejections {}",
            result.fitness,
            metrics.total_return * 100.0,
            metrics.max_drawdown * 100.0,
            metrics.trade_count,
            metrics.win_rate * 100.0,
            metrics.reject_count,
        );
    }
    if result.violations.daily_loss_breached {
        println!("warning: daily loss limit was breached during the run");
    }
    if result.violations.drawdown_breached {
        println!("warning: drawdown limit was breached during the run");
    }

    export_run(output_dir, &result)?;
    println!("artifacts written to {}", output_dir.display());
    Ok(())
}

fn cmd_evolve(
    config_path: &std::path::Path,
    data: &std::path::Path,
    output_dir: &std::path::Path,
) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let store = load(&config, data)?;
    println!(
        "evolving {} genomes over {} generations (seed {})",
        config.optimizer.population, config.optimizer.generations, config.seed
    );

    let optimizer = GeneticOptimizer::new(&store, &config);
    let outcome = optimizer.evolve(|summary| {
        println!(
            "gen {:>3} | best {:.4} | mean {:.4} | failures {}",
            summary.generation,
            summary.best_fitness,
            summary.mean_fitness,
            summary.failed_genomes.len()
        );
    });

    println!(
        "stopped after {} generations ({:?}); best fitness {:.4}",
        outcome.generations_run, outcome.stop_reason, outcome.best.fitness
    );
    println!(
        "best genome: {}",
        serde_json::to_string(&outcome.best.genome)?
    );

    export_evolution(output_dir, &outcome)?;
    println!("artifacts written to {}", output_dir.display());
    Ok(())
}

fn cmd_validate(config_path: &std::path::Path, data: Option<&std::path::Path>) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    println!("config ok: {}", config_path.display());
    println!("  instrument      {}", config.instrument);
    println!("  seed            {}", config.seed);
    println!("  config hash     {}", config.config_hash());
    println!(
        "  optimizer       pop {} / gens {} / elitism {}",
        config.optimizer.population, config.optimizer.generations, config.optimizer.elitism
    );
    if let Some(data) = data {
        let store = load(&config, data)?;
        let bars = store.base_series().bars();
        if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
            println!(
                "  data window     {} .. {}",
                first.timestamp, last.close_time()
            );
        }
    }
    Ok(())
}

//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, run_grid};
use crate::domain::cluster::{ClusterEvaluator, SkipReason};
use crate::domain::config_validation::{cluster_config, data_dir, strategy_params};
use crate::domain::error::StatArbError;
use crate::domain::metrics::BacktestMetrics;
use crate::domain::params::StrategyParams;
use crate::domain::price_series::{Cluster, align_series};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "statarb", about = "Cointegration screening and pair backtests")]
pub struct Cli {
    /// Log progress (info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Log diagnostics (debug level)
    #[arg(short, long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct Source {
    #[arg(short, long)]
    pub config: PathBuf,
    /// Overrides [data] dir
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct Pair {
    /// Independent leg
    #[arg(long)]
    pub x: String,
    /// Dependent leg
    #[arg(long)]
    pub y: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Test named clusters for cointegration
    Screen {
        #[command(flatten)]
        source: Source,
        /// NAME=SYM1,SYM2[,...]; repeat for more clusters
        #[arg(long = "cluster", value_parser = parse_cluster_arg, required = true)]
        clusters: Vec<(String, Vec<String>)>,
    },
    /// Backtest one pair with the configured strategy
    Backtest {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        pair: Pair,
        #[arg(long)]
        lookback: Option<usize>,
        #[arg(long)]
        entry_z: Option<f64>,
        #[arg(long)]
        exit_z: Option<f64>,
        #[arg(long)]
        coint_pval: Option<f64>,
    },
    /// Backtest one pair across the parameter grid
    Grid {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        pair: Pair,
        /// Rows to print, best Sharpe first
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show available symbols and their date ranges
    Info {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose, cli.debug);

    let result = match cli.command {
        Command::Screen { source, clusters } => run_screen(&source, &clusters),
        Command::Backtest {
            source,
            pair,
            lookback,
            entry_z,
            exit_z,
            coint_pval,
        } => {
            let overrides = Overrides {
                lookback,
                entry_z,
                exit_z,
                coint_pval,
            };
            run_pair_backtest(&source, &pair, &overrides)
        }
        Command::Grid { source, pair, top } => run_pair_grid(&source, &pair, top),
        Command::Validate { config } => run_validate(&config),
        Command::Info { source, symbol } => run_info(&source, symbol.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// `-d` wins over `-v`; `RUST_LOG` wins over both.
pub fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second call (tests driving `run` in-process) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn parse_cluster_arg(raw: &str) -> Result<(String, Vec<String>), String> {
    let (name, symbols) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=SYM1,SYM2, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("cluster name is empty".to_string());
    }
    let symbols: Vec<String> = symbols
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.len() < 2 {
        return Err(format!("cluster {name} needs at least two symbols"));
    }
    Ok((name.to_string(), symbols))
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StatArbError> {
    tracing::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

fn open_data(source: &Source, config: &dyn ConfigPort) -> Result<CsvAdapter, StatArbError> {
    let dir = match &source.data_dir {
        Some(dir) => dir.clone(),
        None => PathBuf::from(data_dir(config)?),
    };
    tracing::info!("reading prices from {}", dir.display());
    Ok(CsvAdapter::new(dir))
}

fn run_screen(source: &Source, clusters: &[(String, Vec<String>)]) -> Result<(), StatArbError> {
    let config = load_config(&source.config)?;
    let evaluator = ClusterEvaluator::new(cluster_config(&config)?);
    let data = open_data(source, &config)?;

    let mut named: BTreeMap<String, Cluster> = BTreeMap::new();
    for (name, symbols) in clusters {
        named.insert(name.clone(), data.fetch_cluster(symbols)?);
    }

    let screening = evaluator.filter_valid_clusters(&named);

    for (name, cluster) in &named {
        match screening.valid.get(name) {
            Some(result) => {
                println!("{name} ({}): {result}", cluster.names().join(","));
                if let Some(p) = result.pvalue {
                    println!("  p-value: {p:.4}");
                }
            }
            None if screening.skipped.iter().any(|s| &s.name == name) => {}
            None => println!("{name} ({}): not cointegrated", cluster.names().join(",")),
        }
    }
    for skipped in &screening.skipped {
        match &skipped.reason {
            SkipReason::TooManyAssets { assets } => println!(
                "{}: skipped, {} assets above limit {}",
                skipped.name,
                assets,
                evaluator.config().max_assets
            ),
            SkipReason::Rejected(reason) => println!("{}: skipped, {}", skipped.name, reason),
        }
    }

    eprintln!(
        "{} of {} clusters cointegrated",
        screening.valid.len(),
        named.len()
    );
    Ok(())
}

struct Overrides {
    lookback: Option<usize>,
    entry_z: Option<f64>,
    exit_z: Option<f64>,
    coint_pval: Option<f64>,
}

impl Overrides {
    fn apply(&self, base: StrategyParams) -> StrategyParams {
        StrategyParams {
            lookback: self.lookback.unwrap_or(base.lookback),
            entry_z: self.entry_z.unwrap_or(base.entry_z),
            exit_z: self.exit_z.unwrap_or(base.exit_z),
            coint_pval: self.coint_pval.unwrap_or(base.coint_pval),
            min_valid: base.min_valid,
        }
    }
}

fn load_pair(source: &Source, pair: &Pair, config: &dyn ConfigPort) -> Result<(Vec<f64>, Vec<f64>), StatArbError> {
    let data = open_data(source, config)?;
    let x = data.fetch_closes(&pair.x.to_uppercase())?;
    let y = data.fetch_closes(&pair.y.to_uppercase())?;
    let mut aligned = align_series(&[x, y]).into_iter();
    match (aligned.next(), aligned.next()) {
        (Some(x), Some(y)) => {
            tracing::info!(observations = x.len(), "aligned {} and {}", x.name, y.name);
            Ok((x.values, y.values))
        }
        _ => Err(StatArbError::Data {
            reason: "pair alignment produced no series".to_string(),
        }),
    }
}

fn run_pair_backtest(source: &Source, pair: &Pair, overrides: &Overrides) -> Result<(), StatArbError> {
    let config = load_config(&source.config)?;
    let params = overrides.apply(strategy_params(&config)?);
    params.validate()?;
    let (x, y) = load_pair(source, pair, &config)?;

    let result = run_backtest(&x, &y, &params)?;
    if result.is_empty() {
        eprintln!(
            "warning: {} bars is below min_valid {}, metrics are zeroed",
            x.len(),
            params.min_valid
        );
    }

    println!("Pair:              {} ~ {}", pair.y.to_uppercase(), pair.x.to_uppercase());
    println!("Bars:              {}", x.len());
    println!(
        "Params:            lookback={} entry_z={} exit_z={} coint_pval={}",
        params.lookback, params.entry_z, params.exit_z, params.coint_pval
    );
    print_metrics(&result.metrics.rounded());
    Ok(())
}

fn print_metrics(m: &BacktestMetrics) {
    println!("Total return:      {:.4}", m.total_return);
    println!("Sharpe:            {:.4}", m.sharpe);
    println!("Trades:            {}", m.trade_count);
    println!("Avg hedge ratio:   {:.4}", m.avg_hedge_ratio);
    println!("Coint valid %:     {:.2}", m.cointegration_valid_pct);
}

fn run_pair_grid(source: &Source, pair: &Pair, top: usize) -> Result<(), StatArbError> {
    let config = load_config(&source.config)?;
    let base = strategy_params(&config)?;
    let (x, y) = load_pair(source, pair, &config)?;

    let grid: Vec<StrategyParams> = StrategyParams::parameter_grid()
        .into_iter()
        .map(|p| StrategyParams {
            min_valid: base.min_valid,
            ..p
        })
        .collect();

    let results = run_grid(&x, &y, &grid);
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    let mut ok: Vec<(StrategyParams, BacktestMetrics)> = results
        .into_iter()
        .filter_map(|(p, r)| r.ok().map(|m| (p, m.rounded())))
        .collect();
    ok.sort_by(|a, b| b.1.sharpe.total_cmp(&a.1.sharpe));

    println!("lookback\tentry_z\texit_z\tcoint_pval\ttotal_return\tsharpe\ttrades");
    for (p, m) in ok.iter().take(top) {
        println!(
            "{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{}",
            p.lookback, p.entry_z, p.exit_z, p.coint_pval, m.total_return, m.sharpe, m.trade_count
        );
    }
    eprintln!("{} grid points evaluated, {} failed", grid.len(), failed);
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), StatArbError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;

    let params = strategy_params(&config)?;
    let cluster = cluster_config(&config)?;

    eprintln!("\n[strategy]");
    eprintln!("  lookback   = {}", params.lookback);
    eprintln!("  entry_z    = {}", params.entry_z);
    eprintln!("  exit_z     = {}", params.exit_z);
    eprintln!("  coint_pval = {}", params.coint_pval);
    eprintln!("  min_valid  = {}", params.min_valid);

    eprintln!("\n[cluster]");
    eprintln!("  p_threshold  = {}", cluster.p_threshold);
    eprintln!("  min_rank     = {}", cluster.min_rank);
    eprintln!("  max_assets   = {}", cluster.max_assets);
    eprintln!("  significance = {}", cluster.level.percent());
    eprintln!("  det_order    = {}", cluster.det_order.code());
    eprintln!("  k_ar_diff    = {}", cluster.k_ar_diff);

    match data_dir(&config) {
        Ok(dir) => eprintln!("\n[data]\n  dir = {dir}"),
        Err(_) => eprintln!("\n[data]\n  dir not set, pass --data-dir to data commands"),
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_info(source: &Source, symbol: Option<&str>) -> Result<(), StatArbError> {
    let config = load_config(&source.config)?;
    let data = open_data(source, &config)?;

    let symbols = match symbol {
        Some(s) => vec![s.to_uppercase()],
        None => data.list_symbols()?,
    };
    if symbols.is_empty() {
        eprintln!("No symbols found");
        return Ok(());
    }

    for s in &symbols {
        match data.data_range(s) {
            Ok(Some((first, last, count))) => println!("{s}: {count} bars, {first} to {last}"),
            Ok(None) => eprintln!("{s}: no data found"),
            Err(e) => eprintln!("error reading {s}: {e}"),
        }
    }
    Ok(())
}

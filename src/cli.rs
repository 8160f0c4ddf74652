//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration as StdDuration;
use tracing::info;

use crate::adapters::csv_adapter::{load_fills, CsvTickFeed};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::simulated_feed::SimulatedFeed;
use crate::adapters::text_report::{self, TextReport};
use crate::domain::config_validation::{load_settings, LivefolioSettings};
use crate::domain::driver::{CancelToken, Driver, DriverStats};
use crate::domain::engine::{MarketEngine, PublishedView};
use crate::domain::error::LivefolioError;
use crate::domain::indicator::IndicatorSnapshot;
use crate::domain::ledger::{FillRecord, OrderFill, PortfolioLedger};
use crate::ports::market_data_port::MarketDataPort;

/// Trades shown in the closing summary.
pub const TRADE_HISTORY_LIMIT: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "livefolio", about = "Live market analytics and portfolio revaluation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the simulated market feed and revalue the portfolio
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of revaluation cycles to run
        #[arg(short = 'n', long, default_value_t = 10)]
        cycles: u64,
        /// Overrides [feed] seed
        #[arg(long)]
        seed: Option<u64>,
        /// CSV of fills (symbol,side,quantity,price) applied on the first revaluation
        #[arg(long)]
        fills: Option<PathBuf>,
        /// Wait the revaluation interval between cycles
        #[arg(long)]
        realtime: bool,
        /// Print every published view
        #[arg(long)]
        watch: bool,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Replay recorded ticks from CSV (symbol,timestamp,price)
    Replay {
        #[arg(long)]
        ticks: PathBuf,
        #[arg(long)]
        fills: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many revaluations
        #[arg(short = 'n', long)]
        cycles: Option<u64>,
        #[arg(long)]
        watch: bool,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Show indicator readings after replaying recorded ticks
    Indicators {
        #[arg(long)]
        ticks: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Simulate {
            config,
            cycles,
            seed,
            fills,
            realtime,
            watch,
            format,
        } => run_simulate(
            config.as_deref(),
            cycles,
            seed,
            fills.as_deref(),
            realtime,
            watch,
            format,
        ),
        Command::Replay {
            ticks,
            fills,
            config,
            cycles,
            watch,
            format,
        } => run_replay(
            &ticks,
            fills.as_deref(),
            config.as_deref(),
            cycles,
            watch,
            format,
        ),
        Command::Indicators {
            ticks,
            symbol,
            format,
        } => run_indicators(&ticks, symbol.as_deref(), format),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Settings from `path`, or the defaults when no file is given.
pub fn build_settings(path: Option<&Path>) -> Result<LivefolioSettings, LivefolioError> {
    match path {
        Some(p) => {
            info!(path = %p.display(), "loading config");
            let adapter = FileConfigAdapter::from_file(p)?;
            load_settings(&adapter)
        }
        None => Ok(LivefolioSettings::default()),
    }
}

/// Engine seeded with the configured opening holdings.
pub fn build_engine(settings: &LivefolioSettings) -> Result<MarketEngine, LivefolioError> {
    let mut ledger = PortfolioLedger::new();
    for holding in &settings.holdings {
        ledger.insert_holding(holding.clone())?;
    }
    Ok(MarketEngine::with_ledger(settings.engine.clone(), ledger))
}

/// Everything a run reports when it finishes.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub stats: DriverStats,
    pub view: PublishedView,
    pub trades: Vec<FillRecord>,
}

impl RunSummary {
    pub fn from_engine(engine: &MarketEngine, stats: DriverStats) -> Self {
        RunSummary {
            stats,
            view: (*engine.reader().latest()).clone(),
            trades: engine.ledger().history(TRADE_HISTORY_LIMIT).to_vec(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, LivefolioError> {
        match format {
            OutputFormat::Json => to_json(self),
            OutputFormat::Text => {
                let mut out = text_report::format_view(&self.view);
                for snapshot in self.view.indicators.values() {
                    out.push_str(&text_report::format_indicators(snapshot));
                }
                out.push_str("Recent trades:\n");
                out.push_str(&text_report::format_trades(&self.trades));
                out.push_str(&format!(
                    "{} revaluations, {} ticks ingested, {} rejected, {} fills applied, {} rejected\n",
                    self.stats.revaluations,
                    self.stats.ticks_ingested,
                    self.stats.ticks_rejected,
                    self.stats.fills_applied,
                    self.stats.fills_rejected,
                ));
                Ok(out)
            }
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, LivefolioError> {
    serde_json::to_string_pretty(value)
        .map(|mut s| {
            s.push('\n');
            s
        })
        .map_err(|e| LivefolioError::Io(e.into()))
}

fn print(output: &str) -> Result<(), LivefolioError> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn load_fill_file(path: Option<&Path>) -> Result<Vec<OrderFill>, LivefolioError> {
    match path {
        Some(p) => {
            let fills = load_fills(p)?;
            info!(path = %p.display(), fills = fills.len(), "loaded fills");
            Ok(fills)
        }
        None => Ok(Vec::new()),
    }
}

/// Build a driver over `feed` with the configured schedule and queued fills.
pub fn build_driver<F: MarketDataPort>(
    settings: &LivefolioSettings,
    feed: F,
    fills: Vec<OrderFill>,
    watch: bool,
) -> Result<Driver<F>, LivefolioError> {
    let mut engine = build_engine(settings)?;
    if watch {
        engine.subscribe(Box::new(TextReport::new(std::io::stdout())));
    }
    let driver = Driver::new(engine, feed, &settings.schedule, Utc::now());
    Ok(if fills.is_empty() {
        driver
    } else {
        driver.with_fill_source(Box::new(fills))
    })
}

/// Run `cycles` revaluations of the simulated feed without waiting.
pub fn simulate(
    settings: &LivefolioSettings,
    cycles: u64,
    fills: Vec<OrderFill>,
) -> Result<RunSummary, LivefolioError> {
    let feed = SimulatedFeed::new(&settings.watchlist, settings.walk, settings.seed);
    let mut driver = build_driver(settings, feed, fills, false)?;
    let stats = driver.run_cycles(cycles, &CancelToken::new())?;
    Ok(RunSummary::from_engine(driver.engine(), stats))
}

/// Replay every batch of `feed`, or at most `cycles` revaluations.
pub fn replay(
    settings: &LivefolioSettings,
    feed: CsvTickFeed,
    fills: Vec<OrderFill>,
    cycles: Option<u64>,
) -> Result<RunSummary, LivefolioError> {
    let mut driver = build_driver(settings, feed, fills, false)?;
    let stats = driver.run_cycles(cycles.unwrap_or(u64::MAX), &CancelToken::new())?;
    Ok(RunSummary::from_engine(driver.engine(), stats))
}

fn run_simulate(
    config: Option<&Path>,
    cycles: u64,
    seed: Option<u64>,
    fills: Option<&Path>,
    realtime: bool,
    watch: bool,
    format: OutputFormat,
) -> Result<(), LivefolioError> {
    let mut settings = build_settings(config)?;
    if seed.is_some() {
        settings.seed = seed;
    }
    let fills = load_fill_file(fills)?;
    info!(
        symbols = settings.watchlist.count(),
        holdings = settings.holdings.len(),
        cycles,
        "starting simulation"
    );

    let feed = SimulatedFeed::new(&settings.watchlist, settings.walk, settings.seed);
    let mut driver = build_driver(&settings, feed, fills, watch)?;

    let stats = if realtime {
        let pause = StdDuration::from_millis(settings.schedule.revalue_interval_ms);
        for _ in 0..cycles {
            std::thread::sleep(pause);
            driver.step()?;
        }
        driver.stats().clone()
    } else {
        driver.run_cycles(cycles, &CancelToken::new())?
    };

    print(&RunSummary::from_engine(driver.engine(), stats).render(format)?)
}

fn run_replay(
    ticks: &Path,
    fills: Option<&Path>,
    config: Option<&Path>,
    cycles: Option<u64>,
    watch: bool,
    format: OutputFormat,
) -> Result<(), LivefolioError> {
    let settings = build_settings(config)?;
    let feed = CsvTickFeed::from_path(ticks)?;
    info!(
        path = %ticks.display(),
        batches = feed.remaining_batches(),
        "replaying ticks"
    );
    let fills = load_fill_file(fills)?;

    let summary = if watch {
        let mut driver = build_driver(&settings, feed, fills, true)?;
        let stats = driver.run_cycles(cycles.unwrap_or(u64::MAX), &CancelToken::new())?;
        RunSummary::from_engine(driver.engine(), stats)
    } else {
        replay(&settings, feed, fills, cycles)?
    };
    print(&summary.render(format)?)
}

/// Indicator snapshots after ingesting every batch, optionally for one symbol.
pub fn indicator_report(
    feed: &mut CsvTickFeed,
    symbol: Option<&str>,
) -> Result<Vec<IndicatorSnapshot>, LivefolioError> {
    let mut engine = MarketEngine::new(Default::default());
    while !feed.is_exhausted() {
        let now = Utc::now();
        let batch = feed.next_batch(now)?;
        engine.ingest_batch(&batch, now);
    }

    let view = engine.reader().latest();
    match symbol {
        Some(s) => {
            let wanted = s.to_uppercase();
            engine
                .indicator_snapshot(&wanted)
                .map(|snap| vec![snap])
                .ok_or_else(|| LivefolioError::MarketData {
                    reason: format!("no ticks for {}", wanted),
                })
        }
        None => Ok(view.indicators.values().cloned().collect()),
    }
}

fn run_indicators(
    ticks: &Path,
    symbol: Option<&str>,
    format: OutputFormat,
) -> Result<(), LivefolioError> {
    let mut feed = CsvTickFeed::from_path(ticks)?;
    let snapshots = indicator_report(&mut feed, symbol)?;

    let output = match format {
        OutputFormat::Json => to_json(&snapshots)?,
        OutputFormat::Text => snapshots
            .iter()
            .map(text_report::format_indicators)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    print(&output)
}

fn run_validate(config: &Path) -> Result<(), LivefolioError> {
    eprintln!("Validating config: {}", config.display());
    let settings = build_settings(Some(config))?;
    build_engine(&settings)?;

    eprintln!(
        "  engine:    series capacity {}, top movers {}",
        settings.engine.series_capacity, settings.engine.top_movers
    );
    eprintln!(
        "  feed:      {} symbols, jitter {}, floor {}",
        settings.watchlist.count(),
        settings.walk.amplitude(),
        settings.walk.floor()
    );
    eprintln!(
        "  schedule:  prices every {} ms, revaluation every {} ms",
        settings.schedule.price_interval_ms, settings.schedule.revalue_interval_ms
    );
    eprintln!("  portfolio: {} holdings", settings.holdings.len());
    eprintln!("Config OK");
    Ok(())
}

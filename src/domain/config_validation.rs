//! Configuration validation.
//!
//! Reads the `[engine]`, `[feed]`, `[schedule]` and `[portfolio]` sections
//! into typed settings, rejecting anything out of range before the engine
//! starts.

use crate::domain::driver::{ScheduleConfig, DEFAULT_INTERVAL_MS};
use crate::domain::engine::{EngineConfig, DEFAULT_TOP_MOVERS};
use crate::domain::error::LivefolioError;
use crate::domain::holding::Holding;
use crate::domain::price_walk::{PriceWalk, DEFAULT_FLOOR, DEFAULT_JITTER};
use crate::domain::series::{DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::domain::watchlist::{parse_holdings, parse_symbols, WatchEntry, Watchlist};
use crate::ports::config_port::ConfigPort;
use tracing::warn;

const KNOWN_SECTIONS: &[&str] = &["engine", "feed", "schedule", "portfolio"];

#[derive(Debug, Clone)]
pub struct LivefolioSettings {
    pub engine: EngineConfig,
    pub schedule: ScheduleConfig,
    pub walk: PriceWalk,
    pub seed: Option<u64>,
    pub watchlist: Watchlist,
    pub holdings: Vec<Holding>,
}

impl Default for LivefolioSettings {
    fn default() -> Self {
        LivefolioSettings {
            engine: EngineConfig::default(),
            schedule: ScheduleConfig::default(),
            walk: PriceWalk::default(),
            seed: None,
            watchlist: Watchlist::default_market(),
            holdings: Vec::new(),
        }
    }
}

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), LivefolioError> {
    load_settings(config).map(|_| ())
}

pub fn load_settings(config: &dyn ConfigPort) -> Result<LivefolioSettings, LivefolioError> {
    for section in config.sections() {
        if !KNOWN_SECTIONS.contains(&section.as_str()) {
            warn!(section = %section, "ignoring unknown config section");
        }
    }

    let engine = load_engine(config)?;
    let schedule = load_schedule(config)?;
    let walk = load_walk(config)?;
    let seed = read_u64(config, "feed", "seed")?;
    let holdings = load_holdings(config)?;
    let mut watchlist = load_watchlist(config)?;

    // Held symbols without a configured quote open at their average cost.
    for holding in &holdings {
        if !watchlist.entries.iter().any(|e| e.symbol == holding.symbol) {
            watchlist.entries.push(WatchEntry {
                symbol: holding.symbol.clone(),
                opening_price: holding.avg_cost,
            });
        }
    }

    Ok(LivefolioSettings {
        engine,
        schedule,
        walk,
        seed,
        watchlist,
        holdings,
    })
}

fn present(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_u64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<u64>, LivefolioError> {
    match present(config, section, key) {
        None => Ok(None),
        Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| {
            LivefolioError::config_invalid(
                section,
                key,
                format!("{} must be a non-negative integer", key),
            )
        }),
    }
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, LivefolioError> {
    match present(config, section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                LivefolioError::config_invalid(section, key, format!("{} must be a number", key))
            }),
    }
}

fn load_engine(config: &dyn ConfigPort) -> Result<EngineConfig, LivefolioError> {
    let series_capacity =
        read_u64(config, "engine", "series_capacity")?.unwrap_or(DEFAULT_CAPACITY as u64);
    if series_capacity > MAX_CAPACITY as u64 {
        return Err(LivefolioError::config_invalid(
            "engine",
            "series_capacity",
            format!("series_capacity must be at most {}", MAX_CAPACITY),
        ));
    }
    let top_movers = read_u64(config, "engine", "top_movers")?.unwrap_or(DEFAULT_TOP_MOVERS as u64);
    Ok(EngineConfig {
        series_capacity: series_capacity as usize,
        top_movers: top_movers as usize,
    })
}

fn load_schedule(config: &dyn ConfigPort) -> Result<ScheduleConfig, LivefolioError> {
    let interval = |key: &str| -> Result<u64, LivefolioError> {
        let value = read_u64(config, "schedule", key)?.unwrap_or(DEFAULT_INTERVAL_MS);
        if value == 0 {
            return Err(LivefolioError::config_invalid(
                "schedule",
                key,
                format!("{} must be positive", key),
            ));
        }
        Ok(value)
    };
    Ok(ScheduleConfig {
        price_interval_ms: interval("price_interval_ms")?,
        revalue_interval_ms: interval("revalue_interval_ms")?,
    })
}

fn load_walk(config: &dyn ConfigPort) -> Result<PriceWalk, LivefolioError> {
    let jitter = read_f64(config, "feed", "jitter", DEFAULT_JITTER)?;
    let floor = read_f64(config, "feed", "floor_price", DEFAULT_FLOOR)?;
    PriceWalk::new(jitter, floor)
}

fn load_watchlist(config: &dyn ConfigPort) -> Result<Watchlist, LivefolioError> {
    match present(config, "feed", "symbols") {
        None => Ok(Watchlist::default_market()),
        Some(raw) => parse_symbols(&raw)
            .map_err(|e| LivefolioError::config_invalid("feed", "symbols", e.to_string())),
    }
}

fn load_holdings(config: &dyn ConfigPort) -> Result<Vec<Holding>, LivefolioError> {
    match present(config, "portfolio", "holdings") {
        None => Ok(Vec::new()),
        Some(raw) => parse_holdings(&raw)
            .map_err(|e| LivefolioError::config_invalid("portfolio", "holdings", e.to_string())),
    }
}

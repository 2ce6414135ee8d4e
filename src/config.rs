//! Statistics engine configuration from environment variables

use crate::stats_core::deriver::{DEFAULT_DURATION_MINUTES, SUBSTITUTE_SENTINEL};
use crate::stats_core::recent::DEFAULT_RECENT_GAMES;
use crate::stats_core::trend::DEFAULT_TREND_WINDOW;
use crate::stats_core::DeriverOptions;
use std::env;
use std::str::FromStr;

pub const DEFAULT_DB_PATH: &str = "data/squadstats.db";
pub const DEFAULT_REBUILD_CONCURRENCY: usize = 8;
pub const MAX_REBUILD_CONCURRENCY: usize = 32;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Minutes credited when neither assignment nor selection carries a duration
    pub default_duration_minutes: u32,

    /// Size of the `recentGames` window in each summary
    pub recent_games: usize,

    /// Played facts considered by the trend heuristic
    pub trend_window: usize,

    /// Concurrent per-player aggregations during a rebuild
    pub rebuild_concurrency: usize,

    /// Position value that marks a substitute
    pub substitute_sentinel: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            recent_games: DEFAULT_RECENT_GAMES,
            trend_window: DEFAULT_TREND_WINDOW,
            rebuild_concurrency: DEFAULT_REBUILD_CONCURRENCY,
            substitute_sentinel: SUBSTITUTE_SENTINEL.to_string(),
        }
    }
}

impl StatsConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `STATS_DB_PATH` (default: data/squadstats.db)
    /// - `STATS_DEFAULT_DURATION_MINUTES` (default: 90)
    /// - `STATS_RECENT_GAMES` (default: 10)
    /// - `STATS_TREND_WINDOW` (default: 10)
    /// - `STATS_REBUILD_CONCURRENCY` (default: 8, clamped to 1..=32)
    /// - `STATS_SUBSTITUTE_SENTINEL` (default: SUB)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let rebuild_concurrency: usize =
            parse_var("STATS_REBUILD_CONCURRENCY", defaults.rebuild_concurrency);

        Self {
            db_path: env::var("STATS_DB_PATH").unwrap_or(defaults.db_path),
            default_duration_minutes: parse_var(
                "STATS_DEFAULT_DURATION_MINUTES",
                defaults.default_duration_minutes,
            ),
            recent_games: parse_var("STATS_RECENT_GAMES", defaults.recent_games),
            trend_window: parse_var("STATS_TREND_WINDOW", defaults.trend_window),
            rebuild_concurrency: rebuild_concurrency.clamp(1, MAX_REBUILD_CONCURRENCY),
            substitute_sentinel: env::var("STATS_SUBSTITUTE_SENTINEL")
                .map(|s| s.trim().to_uppercase())
                .unwrap_or(defaults.substitute_sentinel),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_games == 0 {
            return Err(ConfigError::InvalidValue(
                "STATS_RECENT_GAMES must be at least 1".to_string(),
            ));
        }
        if self.trend_window == 0 {
            return Err(ConfigError::InvalidValue(
                "STATS_TREND_WINDOW must be at least 1".to_string(),
            ));
        }
        if self.substitute_sentinel.is_empty() {
            return Err(ConfigError::InvalidValue(
                "STATS_SUBSTITUTE_SENTINEL must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn deriver_options(&self) -> DeriverOptions {
        DeriverOptions {
            default_duration_minutes: self.default_duration_minutes,
            substitute_sentinel: self.substitute_sentinel.clone(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("⚠️  {}='{}' is not a valid value, using default", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "STATS_DB_PATH",
        "STATS_DEFAULT_DURATION_MINUTES",
        "STATS_RECENT_GAMES",
        "STATS_TREND_WINDOW",
        "STATS_REBUILD_CONCURRENCY",
        "STATS_SUBSTITUTE_SENTINEL",
    ];

    // Env vars are process-wide, so every case runs inside one test.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = StatsConfig::from_env();
        assert_eq!(config.db_path, "data/squadstats.db");
        assert_eq!(config.default_duration_minutes, 90);
        assert_eq!(config.recent_games, 10);
        assert_eq!(config.trend_window, 10);
        assert_eq!(config.rebuild_concurrency, 8);
        assert_eq!(config.substitute_sentinel, "SUB");
        assert!(config.validate().is_ok());

        env::set_var("STATS_DB_PATH", "/tmp/stats.db");
        env::set_var("STATS_DEFAULT_DURATION_MINUTES", "60");
        env::set_var("STATS_RECENT_GAMES", "five");
        env::set_var("STATS_REBUILD_CONCURRENCY", "500");
        env::set_var("STATS_SUBSTITUTE_SENTINEL", " bench ");

        let config = StatsConfig::from_env();
        assert_eq!(config.db_path, "/tmp/stats.db");
        assert_eq!(config.default_duration_minutes, 60);
        assert_eq!(config.recent_games, 10);
        assert_eq!(config.rebuild_concurrency, 32);
        assert_eq!(config.substitute_sentinel, "BENCH");
        assert_eq!(config.deriver_options().default_duration_minutes, 60);

        env::set_var("STATS_REBUILD_CONCURRENCY", "0");
        env::set_var("STATS_TREND_WINDOW", "0");

        let config = StatsConfig::from_env();
        assert_eq!(config.rebuild_concurrency, 1);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_validate_rejects_empty_sentinel() {
        let config = StatsConfig {
            substitute_sentinel: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

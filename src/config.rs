use log::{info, warn};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::delta::RANKING_DEPTH;
use crate::error::{DashboardError, Result};
use crate::ranking::TOP_N;
use crate::types::{GroupSelector, Period};

/// Number of entities in the top-provinces trend view.
pub const TREND_TOP_K: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub group: GroupSelector,
    pub top_n: usize,
    pub ranking_depth: usize,
    pub trend_top_k: usize,
    pub tick_ms: u64,
    pub first_period: Period,
    pub last_period: Period,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("."),
            group: GroupSelector::BookOfBusiness,
            top_n: TOP_N,
            ranking_depth: RANKING_DEPTH,
            trend_top_k: TREND_TOP_K,
            tick_ms: 1000,
            first_period: 2018,
            last_period: 2024,
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by `CLAIMS_*` variables, after loading `.env` if
    /// one is present.
    pub fn from_env() -> Result<Self> {
        if dotenv::dotenv().is_err() {
            info!("no .env file found, using process environment");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = DashboardConfig::default();
        let cfg = DashboardConfig {
            data_dir: lookup("CLAIMS_DATA_DIR").map(PathBuf::from).unwrap_or(d.data_dir),
            output_dir: lookup("CLAIMS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.output_dir),
            group: lookup("CLAIMS_GROUP")
                .map(|g| GroupSelector::parse(&g))
                .unwrap_or(d.group),
            top_n: parse_var(&lookup, "CLAIMS_TOP_N", d.top_n)?,
            ranking_depth: parse_var(&lookup, "CLAIMS_RANKING_DEPTH", d.ranking_depth)?,
            trend_top_k: parse_var(&lookup, "CLAIMS_TREND_TOP_K", d.trend_top_k)?,
            tick_ms: parse_var(&lookup, "CLAIMS_TICK_MS", d.tick_ms)?,
            first_period: parse_var(&lookup, "CLAIMS_FIRST_PERIOD", d.first_period)?,
            last_period: parse_var(&lookup, "CLAIMS_LAST_PERIOD", d.last_period)?,
        };
        if cfg.first_period > cfg.last_period {
            warn!(
                "playback range {}..={} is empty",
                cfg.first_period, cfg.last_period
            );
        }
        Ok(cfg)
    }

    /// Periods the ranking animation steps through.
    pub fn playback_periods(&self) -> Vec<Period> {
        (self.first_period..=self.last_period).collect()
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| DashboardError::Config {
            key: key.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = DashboardConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.playback_periods().len(), 7);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = DashboardConfig::from_lookup(lookup_from(&[
            ("CLAIMS_GROUP", "3"),
            ("CLAIMS_TOP_N", "5"),
            ("CLAIMS_FIRST_PERIOD", "2020"),
            ("CLAIMS_LAST_PERIOD", "2022"),
        ]))
        .unwrap();
        assert_eq!(cfg.group, GroupSelector::Insurer("3".to_string()));
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.playback_periods(), vec![2020, 2021, 2022]);
    }

    #[test]
    fn malformed_value_is_config_error() {
        let err = DashboardConfig::from_lookup(lookup_from(&[("CLAIMS_TICK_MS", "fast")]))
            .unwrap_err();
        match err {
            DashboardError::Config { key, value } => {
                assert_eq!(key, "CLAIMS_TICK_MS");
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

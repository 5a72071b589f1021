use crate::error::AppError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.opendota.com/api";
pub const DEFAULT_COUNTERS_PATH: &str = "dota_hero_counters.json";

/// Per-request timeout for every upstream call.
pub const REQUEST_TIMEOUT_SECS: u64 = 20;
/// Counter-picks kept per enemy hero.
pub const TOP_SYNERGY_PICKS: usize = 2;
/// Pro matches sampled when reconstructing an item timeline.
pub const PRO_MATCH_SAMPLE: usize = 30;
pub const FETCH_WORKERS: usize = 4;
pub const TIMELINE_DEADLINE_SECS: u64 = 120;
pub const CACHE_TTL_MINS: u64 = 60;
/// One year; longer TTLs are rejected.
pub const MAX_CACHE_TTL_MINS: u64 = 525_600;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub counters_path: PathBuf,
    pub pro_match_sample: usize,
    pub top_synergy_picks: usize,
    pub fetch_workers: usize,
    pub timeline_deadline: Duration,
    pub cache_ttl_mins: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            counters_path: PathBuf::from(DEFAULT_COUNTERS_PATH),
            pro_match_sample: PRO_MATCH_SAMPLE,
            top_synergy_picks: TOP_SYNERGY_PICKS,
            fetch_workers: FETCH_WORKERS,
            timeline_deadline: Duration::from_secs(TIMELINE_DEADLINE_SECS),
            cache_ttl_mins: CACHE_TTL_MINS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let base_url = lookup("OPENDOTA_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let api_key = lookup("OPENDOTA_API_KEY").filter(|key| !key.trim().is_empty());

        let counters_path = lookup("COUNTERS_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.counters_path);

        let request_timeout = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)?;
        let pro_match_sample = parse_var(&lookup, "PRO_MATCH_SAMPLE", PRO_MATCH_SAMPLE)?;
        let top_synergy_picks = parse_var(&lookup, "TOP_SYNERGY_PICKS", TOP_SYNERGY_PICKS)?;
        let fetch_workers = parse_var(&lookup, "FETCH_WORKERS", FETCH_WORKERS)?;
        let timeline_deadline = parse_var(&lookup, "TIMELINE_DEADLINE_SECS", TIMELINE_DEADLINE_SECS)?;
        let cache_ttl_mins = parse_var(&lookup, "CACHE_TTL_MINS", CACHE_TTL_MINS)?;

        if fetch_workers == 0 {
            return Err(AppError::ConfigError(
                "FETCH_WORKERS must be at least 1".to_string(),
            ));
        }
        if cache_ttl_mins > MAX_CACHE_TTL_MINS {
            return Err(AppError::ConfigError(format!(
                "CACHE_TTL_MINS must be at most {}, got {}",
                MAX_CACHE_TTL_MINS, cache_ttl_mins
            )));
        }

        Ok(Config {
            base_url,
            api_key,
            request_timeout: Duration::from_secs(request_timeout),
            counters_path,
            pro_match_sample,
            top_synergy_picks,
            fetch_workers,
            timeline_deadline: Duration::from_secs(timeline_deadline),
            cache_ttl_mins,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!("{} must be a non-negative integer, got '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_key, None);
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.pro_match_sample, 30);
        assert_eq!(config.top_synergy_picks, 2);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENDOTA_BASE_URL", "http://localhost:9000/api/"),
            ("OPENDOTA_API_KEY", "secret"),
            ("PRO_MATCH_SAMPLE", "10"),
            ("TOP_SYNERGY_PICKS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.pro_match_sample, 10);
        assert_eq!(config.top_synergy_picks, 3);
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = Config::from_lookup(lookup_from(&[("OPENDOTA_API_KEY", "  ")])).unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn test_malformed_number_is_config_error() {
        let err = Config::from_lookup(lookup_from(&[("REQUEST_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = Config::from_lookup(lookup_from(&[("FETCH_WORKERS", "0")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_cache_ttl_upper_bound() {
        let config = Config::from_lookup(lookup_from(&[("CACHE_TTL_MINS", "525600")])).unwrap();
        assert_eq!(config.cache_ttl_mins, MAX_CACHE_TTL_MINS);

        let err = Config::from_lookup(lookup_from(&[("CACHE_TTL_MINS", "200000000000000000")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}

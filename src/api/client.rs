use crate::config::Config;
use crate::error::AppError;
use crate::rate_limit::RequestLog;
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;

use super::endpoints;
use super::models::*;
use super::MatchDataSource;

const USER_AGENT: &str = concat!("dota_counters/", env!("CARGO_PKG_VERSION"));
const MAX_RETRIES: u32 = 3;
// OpenDota free tier
const REQUESTS_PER_MINUTE: u32 = 60;

pub struct OpenDotaClient {
    config: Config,
    agent: ureq::Agent,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    request_log: Mutex<RequestLog>,
}

impl OpenDotaClient {
    pub fn new(config: Config, request_log: RequestLog) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build();
        let quota = Quota::per_minute(NonZeroU32::new(REQUESTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN));

        OpenDotaClient {
            config,
            agent,
            rate_limiter: RateLimiter::direct(quota),
            request_log: Mutex::new(request_log),
        }
    }

    pub fn request_log(&self) -> RequestLog {
        self.request_log.lock().clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn wait_for_quota(&self) {
        let clock = DefaultClock::default();
        while let Err(not_until) = self.rate_limiter.check() {
            thread::sleep(not_until.wait_time_from(clock.now()));
        }
    }

    fn record_request(&self) {
        let mut log = self.request_log.lock();
        log.record_request();
        if let Err(e) = log.save() {
            tracing::debug!(error = %e, "could not persist request log");
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, AppError> {
        let url = self.url(path);
        let mut retry_count = 0;

        loop {
            self.wait_for_quota();

            let mut request = self.agent.get(&url);
            for (key, value) in query {
                request = request.query(key, value);
            }
            if let Some(api_key) = &self.config.api_key {
                request = request.query("api_key", api_key);
            }

            tracing::debug!(%url, attempt = retry_count + 1, "GET");
            let response = request.call();
            self.record_request();

            match response {
                Ok(resp) => {
                    return resp
                        .into_json::<T>()
                        .map_err(|e| AppError::JsonError(format!("{}: {}", path, e)));
                }
                Err(ureq::Error::Status(429, _)) => {
                    if retry_count >= MAX_RETRIES {
                        return Err(AppError::RateLimited);
                    }
                    let wait_ms = 2000 * (retry_count + 1) as u64;
                    tracing::warn!(%url, wait_ms, "rate limited, backing off");
                    thread::sleep(Duration::from_millis(wait_ms));
                    retry_count += 1;
                }
                Err(ureq::Error::Status(code, _)) => {
                    return Err(AppError::ApiError(format!("{} returned HTTP {}", path, code)));
                }
                Err(e) => {
                    return Err(AppError::HttpError(e.to_string()));
                }
            }
        }
    }
}

impl MatchDataSource for OpenDotaClient {
    fn hero_catalog(&self) -> Result<Vec<HeroDto>, AppError> {
        self.get_json(endpoints::HEROES, &[])
    }

    fn matchups(&self, hero_id: u32) -> Result<Vec<MatchupDto>, AppError> {
        self.get_json(&endpoints::matchups(hero_id), &[])
    }

    fn personal_hero_stats(&self, account_id: &str) -> Result<Vec<PlayerHeroDto>, AppError> {
        self.get_json(&endpoints::player_heroes(account_id), &[])
    }

    fn recent_pro_matches(&self, hero_id: u32, limit: usize) -> Result<Vec<ProMatchDto>, AppError> {
        let mut matches: Vec<ProMatchDto> =
            self.get_json(endpoints::PRO_MATCHES, &[("hero_id", hero_id.to_string())])?;
        matches.truncate(limit);
        Ok(matches)
    }

    fn match_detail(&self, match_id: u64) -> Result<MatchDetailDto, AppError> {
        self.get_json(&endpoints::match_detail(match_id), &[])
    }

    fn item_popularity(&self, hero_id: u32) -> Result<ItemPopularityDto, AppError> {
        self.get_json(&endpoints::item_popularity(hero_id), &[])
    }
}

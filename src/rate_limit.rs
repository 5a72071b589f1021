use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Duration, Utc};
use crate::cache::cache_dir;
use crate::error::AppError;

/// Free-tier daily allowance without an API key.
pub const MAX_REQUESTS_PER_DAY: u32 = 2000;
/// Calls kept per minute before the ledger flags the client as bursting.
pub const MAX_REQUESTS_PER_MINUTE: u32 = 60;

/// Persisted count of upstream calls, shared across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLog {
    pub requests_today: u32,
    pub requests_this_minute: u32,
    pub last_request: DateTime<Utc>,
    pub day_reset: DateTime<Utc>,
    pub minute_reset: DateTime<Utc>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl RequestLog {
    pub fn new() -> Self {
        let now = Utc::now();
        RequestLog {
            requests_today: 0,
            requests_this_minute: 0,
            last_request: now,
            day_reset: now + Duration::days(1),
            minute_reset: now + Duration::minutes(1),
            path: None,
        }
    }

    pub fn default_path() -> PathBuf {
        cache_dir().join("requests.json")
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let mut log = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<RequestLog>(&content)
                .map_err(|e| AppError::JsonError(format!("Failed to parse request log: {}", e)))?,
            Err(_) => RequestLog::new(),
        };
        log.path = Some(path.to_path_buf());
        log.roll_windows(Utc::now());
        Ok(log)
    }

    pub fn save(&self) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::JsonError(format!("Failed to serialize request log: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    fn roll_windows(&mut self, now: DateTime<Utc>) {
        if now > self.day_reset {
            self.requests_today = 0;
            self.day_reset = now + Duration::days(1);
        }
        if now > self.minute_reset {
            self.requests_this_minute = 0;
            self.minute_reset = now + Duration::minutes(1);
        }
    }

    pub fn can_make_request(&self) -> bool {
        self.requests_today < MAX_REQUESTS_PER_DAY
    }

    pub fn record_request(&mut self) {
        let now = Utc::now();
        self.roll_windows(now);
        self.requests_today += 1;
        self.requests_this_minute += 1;
        self.last_request = now;
    }

    pub fn get_remaining(&self) -> u32 {
        MAX_REQUESTS_PER_DAY.saturating_sub(self.requests_today)
    }

    pub fn time_until_reset(&self) -> Duration {
        self.day_reset.signed_duration_since(Utc::now())
    }
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_and_remaining() {
        let mut log = RequestLog::new();
        assert_eq!(log.get_remaining(), MAX_REQUESTS_PER_DAY);
        log.record_request();
        log.record_request();
        assert_eq!(log.requests_today, 2);
        assert_eq!(log.get_remaining(), MAX_REQUESTS_PER_DAY - 2);
        assert!(log.can_make_request());
    }

    #[test]
    fn test_exhausted_budget() {
        let mut log = RequestLog::new();
        log.requests_today = MAX_REQUESTS_PER_DAY;
        assert!(!log.can_make_request());
        assert_eq!(log.get_remaining(), 0);
    }

    #[test]
    fn test_expired_day_window_resets() {
        let mut log = RequestLog::new();
        log.requests_today = 500;
        log.day_reset = Utc::now() - Duration::minutes(5);
        log.roll_windows(Utc::now());
        assert_eq!(log.requests_today, 0);
        assert!(log.day_reset > Utc::now());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("requests.json");

        let mut log = RequestLog::load_from(&path).unwrap();
        log.record_request();
        log.save().unwrap();

        let reloaded = RequestLog::load_from(&path).unwrap();
        assert_eq!(reloaded.requests_today, 1);
    }

    #[test]
    fn test_unsaved_log_without_path_is_noop() {
        let log = RequestLog::new();
        assert!(log.save().is_ok());
    }
}

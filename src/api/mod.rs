pub mod cached;
pub mod client;
pub mod endpoints;
#[cfg(test)]
pub mod fake;
pub mod models;

use crate::error::AppError;
use models::*;

/// Upstream match-data provider consumed by the engines.
///
/// Implementations report failures as errors; callers decide how to degrade.
pub trait MatchDataSource: Sync {
    fn hero_catalog(&self) -> Result<Vec<HeroDto>, AppError>;

    fn matchups(&self, hero_id: u32) -> Result<Vec<MatchupDto>, AppError>;

    fn personal_hero_stats(&self, account_id: &str) -> Result<Vec<PlayerHeroDto>, AppError>;

    /// Most recent pro matches featuring the hero, at most `limit` of them.
    fn recent_pro_matches(&self, hero_id: u32, limit: usize) -> Result<Vec<ProMatchDto>, AppError>;

    fn match_detail(&self, match_id: u64) -> Result<MatchDetailDto, AppError>;

    fn item_popularity(&self, hero_id: u32) -> Result<ItemPopularityDto, AppError>;
}

impl<S: MatchDataSource + ?Sized> MatchDataSource for &S {
    fn hero_catalog(&self) -> Result<Vec<HeroDto>, AppError> {
        (**self).hero_catalog()
    }

    fn matchups(&self, hero_id: u32) -> Result<Vec<MatchupDto>, AppError> {
        (**self).matchups(hero_id)
    }

    fn personal_hero_stats(&self, account_id: &str) -> Result<Vec<PlayerHeroDto>, AppError> {
        (**self).personal_hero_stats(account_id)
    }

    fn recent_pro_matches(&self, hero_id: u32, limit: usize) -> Result<Vec<ProMatchDto>, AppError> {
        (**self).recent_pro_matches(hero_id, limit)
    }

    fn match_detail(&self, match_id: u64) -> Result<MatchDetailDto, AppError> {
        (**self).match_detail(match_id)
    }

    fn item_popularity(&self, hero_id: u32) -> Result<ItemPopularityDto, AppError> {
        (**self).item_popularity(hero_id)
    }
}

/// Outcome of an upstream fetch: either data, or the reason there is none.
#[derive(Debug)]
pub enum Fetched<T> {
    Data(T),
    Failed(AppError),
}

impl<T> Fetched<T> {
    /// Wraps a fetch result, logging failures under `what`.
    pub fn from_result(what: &str, result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Fetched::Data(data),
            Err(e) => {
                tracing::warn!(fetch = what, error = %e, "upstream fetch failed");
                Fetched::Failed(e)
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fetched::Failed(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Data(data) => Some(data),
            Fetched::Failed(_) => None,
        }
    }
}

impl<T: Default> Fetched<T> {
    /// Degrades a failure to the empty value.
    pub fn or_empty(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_degrades_to_empty() {
        let fetched: Fetched<Vec<u32>> =
            Fetched::from_result("matchups", Err(AppError::HttpError("timeout".into())));
        assert!(fetched.is_failed());
        assert!(fetched.or_empty().is_empty());
    }

    #[test]
    fn test_data_passes_through() {
        let fetched = Fetched::from_result("matchups", Ok(vec![1, 2]));
        assert!(!fetched.is_failed());
        assert_eq!(fetched.or_empty(), vec![1, 2]);
    }
}

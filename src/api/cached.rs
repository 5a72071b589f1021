use crate::cache::{DiskCache, MemoCache};
use crate::error::AppError;

use super::models::*;
use super::MatchDataSource;

const HERO_CATALOG_KEY: &str = "heroes";

/// Read-through caching in front of another source.
///
/// Hero catalog, matchups and pro-match lists are memoized; match details,
/// personal stats and item popularity always go upstream. The hero catalog
/// is also persisted to disk when a `DiskCache` is attached.
pub struct CachedSource<S> {
    inner: S,
    ttl_mins: u64,
    disk: Option<DiskCache>,
    refresh: bool,
    heroes: MemoCache<(), Vec<HeroDto>>,
    matchups: MemoCache<u32, Vec<MatchupDto>>,
    pro_matches: MemoCache<(u32, usize), Vec<ProMatchDto>>,
}

impl<S: MatchDataSource> CachedSource<S> {
    pub fn new(inner: S, ttl_mins: u64) -> Self {
        CachedSource {
            inner,
            ttl_mins,
            disk: None,
            refresh: false,
            heroes: MemoCache::with_ttl_mins(ttl_mins),
            matchups: MemoCache::with_ttl_mins(ttl_mins),
            pro_matches: MemoCache::with_ttl_mins(ttl_mins),
        }
    }

    pub fn with_disk(mut self, disk: DiskCache) -> Self {
        self.disk = Some(disk);
        self
    }

    /// Ignore persisted entries (they are still rewritten after a fetch).
    pub fn refreshing(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn load_hero_catalog(&self) -> Result<Vec<HeroDto>, AppError> {
        if let (Some(disk), false) = (&self.disk, self.refresh) {
            if let Some(heroes) = disk.load::<Vec<HeroDto>>(HERO_CATALOG_KEY, self.ttl_mins) {
                tracing::debug!(count = heroes.len(), "hero catalog served from disk cache");
                return Ok(heroes);
            }
        }

        let heroes = self.inner.hero_catalog()?;
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.store(HERO_CATALOG_KEY, &heroes) {
                tracing::warn!(error = %e, "could not persist hero catalog");
            }
        }
        Ok(heroes)
    }
}

impl<S: MatchDataSource> MatchDataSource for CachedSource<S> {
    fn hero_catalog(&self) -> Result<Vec<HeroDto>, AppError> {
        self.heroes.get_or_try_insert_with((), || self.load_hero_catalog())
    }

    fn matchups(&self, hero_id: u32) -> Result<Vec<MatchupDto>, AppError> {
        self.matchups
            .get_or_try_insert_with(hero_id, || self.inner.matchups(hero_id))
    }

    fn personal_hero_stats(&self, account_id: &str) -> Result<Vec<PlayerHeroDto>, AppError> {
        self.inner.personal_hero_stats(account_id)
    }

    fn recent_pro_matches(&self, hero_id: u32, limit: usize) -> Result<Vec<ProMatchDto>, AppError> {
        self.pro_matches.get_or_try_insert_with((hero_id, limit), || {
            self.inner.recent_pro_matches(hero_id, limit)
        })
    }

    fn match_detail(&self, match_id: u64) -> Result<MatchDetailDto, AppError> {
        self.inner.match_detail(match_id)
    }

    fn item_popularity(&self, hero_id: u32) -> Result<ItemPopularityDto, AppError> {
        self.inner.item_popularity(hero_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeSource};
    use tempfile::tempdir;

    #[test]
    fn test_matchups_are_memoized() {
        let fake = FakeSource::new().with_matchups(8, vec![(1, 100, 60)]);
        let cached = CachedSource::new(&fake, 60);

        cached.matchups(8).unwrap();
        cached.matchups(8).unwrap();

        assert_eq!(fake.count(|c| matches!(c, Call::Matchups(8))), 1);
    }

    #[test]
    fn test_failures_are_not_memoized() {
        let fake = FakeSource::new().failing_matchups();
        let cached = CachedSource::new(&fake, 60);

        assert!(cached.matchups(8).is_err());
        assert!(cached.matchups(8).is_err());
        assert_eq!(fake.count(|c| matches!(c, Call::Matchups(_))), 2);
    }

    #[test]
    fn test_match_details_bypass_cache() {
        let fake = FakeSource::new();
        let cached = CachedSource::new(&fake, 60);

        let _ = cached.match_detail(1);
        let _ = cached.match_detail(1);
        assert_eq!(fake.count(|c| matches!(c, Call::MatchDetail(1))), 2);
    }

    #[test]
    fn test_hero_catalog_persists_across_instances() {
        let dir = tempdir().unwrap();
        let fake = FakeSource::new().with_hero(1, "antimage", "Anti-Mage");

        let first = CachedSource::new(&fake, 60).with_disk(DiskCache::new(dir.path()));
        assert_eq!(first.hero_catalog().unwrap().len(), 1);

        let second = CachedSource::new(&fake, 60).with_disk(DiskCache::new(dir.path()));
        assert_eq!(second.hero_catalog().unwrap().len(), 1);
        assert_eq!(fake.count(|c| matches!(c, Call::HeroCatalog)), 1);

        let refreshed = CachedSource::new(&fake, 60)
            .with_disk(DiskCache::new(dir.path()))
            .refreshing(true);
        refreshed.hero_catalog().unwrap();
        assert_eq!(fake.count(|c| matches!(c, Call::HeroCatalog)), 2);
    }
}

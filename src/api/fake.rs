//! Scripted in-memory source for engine tests. Records every call.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::AppError;

use super::models::*;
use super::MatchDataSource;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    HeroCatalog,
    Matchups(u32),
    PersonalStats(String),
    ProMatches(u32, usize),
    MatchDetail(u64),
    ItemPopularity(u32),
}

#[derive(Default)]
pub struct FakeSource {
    heroes: Vec<HeroDto>,
    matchups: HashMap<u32, Vec<MatchupDto>>,
    personal: Vec<PlayerHeroDto>,
    pro_matches: HashMap<u32, Vec<ProMatchDto>>,
    details: HashMap<u64, MatchDetailDto>,
    popularity: HashMap<u32, ItemPopularityDto>,
    fail_heroes: bool,
    fail_matchups: bool,
    fail_personal: bool,
    fail_pro_matches: bool,
    fail_popularity: bool,
    calls: Mutex<Vec<Call>>,
}

fn upstream_down() -> AppError {
    AppError::HttpError("connection refused".to_string())
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hero(mut self, id: u32, short_name: &str, localized_name: &str) -> Self {
        self.heroes.push(HeroDto {
            id,
            name: format!("npc_dota_hero_{}", short_name),
            localized_name: localized_name.to_string(),
        });
        self
    }

    /// Rows are `(candidate_hero_id, games_played, wins)`.
    pub fn with_matchups(mut self, enemy_id: u32, rows: Vec<(u32, u32, u32)>) -> Self {
        self.matchups.insert(
            enemy_id,
            rows.into_iter()
                .map(|(hero_id, games_played, wins)| MatchupDto {
                    hero_id,
                    games_played,
                    wins,
                })
                .collect(),
        );
        self
    }

    /// Rows are `(hero_id, games, wins)`.
    pub fn with_personal(mut self, rows: Vec<(u32, u32, u32)>) -> Self {
        self.personal = rows
            .into_iter()
            .map(|(hero_id, games, win)| PlayerHeroDto { hero_id, games, win })
            .collect();
        self
    }

    pub fn with_pro_matches(mut self, hero_id: u32, match_ids: Vec<u64>) -> Self {
        self.pro_matches.insert(
            hero_id,
            match_ids
                .into_iter()
                .map(|id| ProMatchDto { match_id: Some(id) })
                .collect(),
        );
        self
    }

    /// A match where `hero_id` bought `purchases` and one other hero bought nothing.
    pub fn with_match(self, match_id: u64, hero_id: u32, purchases: &[(&str, f64)]) -> Self {
        let detail = MatchDetailDto {
            players: vec![
                MatchPlayerDto {
                    hero_id: Some(hero_id + 1000),
                    purchase_log: Some(vec![PurchaseDto {
                        key: "should_not_count".to_string(),
                        time: 1.0,
                    }]),
                },
                MatchPlayerDto {
                    hero_id: Some(hero_id),
                    purchase_log: Some(
                        purchases
                            .iter()
                            .map(|(key, time)| PurchaseDto {
                                key: key.to_string(),
                                time: *time,
                            })
                            .collect(),
                    ),
                },
            ],
        };
        self.with_match_detail(match_id, detail)
    }

    pub fn with_match_detail(mut self, match_id: u64, detail: MatchDetailDto) -> Self {
        self.details.insert(match_id, detail);
        self
    }

    pub fn with_popularity(mut self, hero_id: u32, popularity: ItemPopularityDto) -> Self {
        self.popularity.insert(hero_id, popularity);
        self
    }

    pub fn failing_heroes(mut self) -> Self {
        self.fail_heroes = true;
        self
    }

    pub fn failing_matchups(mut self) -> Self {
        self.fail_matchups = true;
        self
    }

    pub fn failing_personal(mut self) -> Self {
        self.fail_personal = true;
        self
    }

    pub fn failing_pro_matches(mut self) -> Self {
        self.fail_pro_matches = true;
        self
    }

    pub fn failing_popularity(mut self) -> Self {
        self.fail_popularity = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count<F: Fn(&Call) -> bool>(&self, predicate: F) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl MatchDataSource for FakeSource {
    fn hero_catalog(&self) -> Result<Vec<HeroDto>, AppError> {
        self.record(Call::HeroCatalog);
        if self.fail_heroes {
            return Err(upstream_down());
        }
        Ok(self.heroes.clone())
    }

    fn matchups(&self, hero_id: u32) -> Result<Vec<MatchupDto>, AppError> {
        self.record(Call::Matchups(hero_id));
        if self.fail_matchups {
            return Err(upstream_down());
        }
        Ok(self.matchups.get(&hero_id).cloned().unwrap_or_default())
    }

    fn personal_hero_stats(&self, account_id: &str) -> Result<Vec<PlayerHeroDto>, AppError> {
        self.record(Call::PersonalStats(account_id.to_string()));
        if self.fail_personal {
            return Err(upstream_down());
        }
        Ok(self.personal.clone())
    }

    fn recent_pro_matches(&self, hero_id: u32, limit: usize) -> Result<Vec<ProMatchDto>, AppError> {
        self.record(Call::ProMatches(hero_id, limit));
        if self.fail_pro_matches {
            return Err(upstream_down());
        }
        let mut matches = self.pro_matches.get(&hero_id).cloned().unwrap_or_default();
        matches.truncate(limit);
        Ok(matches)
    }

    fn match_detail(&self, match_id: u64) -> Result<MatchDetailDto, AppError> {
        self.record(Call::MatchDetail(match_id));
        self.details
            .get(&match_id)
            .cloned()
            .ok_or_else(|| AppError::ApiError(format!("/matches/{} returned HTTP 404", match_id)))
    }

    fn item_popularity(&self, hero_id: u32) -> Result<ItemPopularityDto, AppError> {
        self.record(Call::ItemPopularity(hero_id));
        if self.fail_popularity {
            return Err(upstream_down());
        }
        Ok(self.popularity.get(&hero_id).cloned().unwrap_or_default())
    }
}

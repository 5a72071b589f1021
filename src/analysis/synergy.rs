use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;

use crate::api::models::{MatchupDto, PlayerHeroDto};
use crate::api::{Fetched, MatchDataSource};
use crate::config::TOP_SYNERGY_PICKS;
use crate::error::AppError;
use crate::metadata::HeroCatalog;

use super::descriptions::DescriptionTable;

/// Matchups with fewer games than this are too noisy to rank.
pub const MIN_GAMES: u32 = 50;
/// Accepted enemy selection sizes.
pub const ALLOWED_ENEMY_COUNTS: [usize; 2] = [2, 4];

fn round2(value: f64) -> f64 {
    // Exact halves go to the even hundredth.
    (value * 100.0).round_ties_even() / 100.0
}

/// The requesting player's record on one hero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PersonalStat {
    pub games: u32,
    pub wins: u32,
    #[serde(rename = "wr")]
    pub win_rate: f64,
}

impl PersonalStat {
    pub fn new(games: u32, wins: u32) -> Self {
        let win_rate = if games > 0 {
            round2(wins as f64 / games as f64 * 100.0)
        } else {
            0.0
        };
        PersonalStat { games, wins, win_rate }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersonalStats {
    by_hero: HashMap<u32, PersonalStat>,
}

impl PersonalStats {
    pub fn from_dtos(rows: &[PlayerHeroDto]) -> Self {
        PersonalStats {
            by_hero: rows
                .iter()
                .map(|row| (row.hero_id, PersonalStat::new(row.games, row.win)))
                .collect(),
        }
    }

    pub fn fetch<S: MatchDataSource>(source: &S, account_id: &str) -> Fetched<PersonalStats> {
        match Fetched::from_result("personal stats", source.personal_hero_stats(account_id)) {
            Fetched::Data(rows) => Fetched::Data(Self::from_dtos(&rows)),
            Fetched::Failed(e) => Fetched::Failed(e),
        }
    }

    /// Zero-valued when the player has no record on the hero.
    pub fn get(&self, hero_id: u32) -> PersonalStat {
        self.by_hero.get(&hero_id).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchupCandidate {
    pub hero_id: u32,
    pub games_played: u32,
    pub win_rate: f64,
    pub advantage: f64,
}

impl MatchupCandidate {
    pub fn from_dto(row: &MatchupDto) -> Self {
        let win_rate = row.wins as f64 / row.games_played as f64 * 100.0;
        MatchupCandidate {
            hero_id: row.hero_id,
            games_played: row.games_played,
            win_rate,
            advantage: win_rate - 50.0,
        }
    }
}

/// Filters out thin samples and keeps the `top_n` best advantages.
///
/// The sort is stable: equal advantages keep their upstream order.
pub fn rank_candidates(matchups: &[MatchupDto], min_games: u32, top_n: usize) -> Vec<MatchupCandidate> {
    let mut candidates: Vec<MatchupCandidate> = matchups
        .iter()
        .filter(|row| row.games_played >= min_games && row.games_played > 0)
        .map(MatchupCandidate::from_dto)
        .collect();

    candidates.sort_by(|a, b| b.advantage.total_cmp(&a.advantage));
    candidates.truncate(top_n);
    candidates
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynergyResult {
    #[serde(rename = "id")]
    pub hero_id: u32,
    pub name: String,
    pub image: String,
    pub win_rate: f64,
    pub advantage: f64,
    pub games_played: u32,
    pub description: String,
    pub personal_stats: PersonalStat,
    pub enemy_hero: String,
}

/// Counter-picks for a whole enemy selection.
#[derive(Debug, Clone, Default)]
pub struct Recommendations {
    pub results: Vec<SynergyResult>,
    /// Selected names that matched no known hero.
    pub unresolved: Vec<String>,
    /// Enemies whose matchup fetch failed upstream.
    pub degraded: Vec<String>,
    pub personal_stats_failed: bool,
}

pub fn validate_enemy_selection(enemies: &[String]) -> Result<(), AppError> {
    if enemies.is_empty() {
        return Err(AppError::Validation("No enemy heroes selected.".to_string()));
    }
    if !ALLOWED_ENEMY_COUNTS.contains(&enemies.len()) {
        return Err(AppError::Validation(format!(
            "Pick exactly 2 or 4 enemy heroes (got {}).",
            enemies.len()
        )));
    }
    Ok(())
}

pub struct SynergyEngine<'a, S> {
    source: &'a S,
    descriptions: &'a DescriptionTable,
    top_picks: usize,
    catalog: OnceLock<HeroCatalog>,
}

impl<'a, S: MatchDataSource> SynergyEngine<'a, S> {
    pub fn new(source: &'a S, descriptions: &'a DescriptionTable) -> Self {
        SynergyEngine {
            source,
            descriptions,
            top_picks: TOP_SYNERGY_PICKS,
            catalog: OnceLock::new(),
        }
    }

    pub fn with_top_picks(mut self, top_picks: usize) -> Self {
        self.top_picks = top_picks;
        self
    }

    pub fn catalog(&self) -> &HeroCatalog {
        self.catalog.get_or_init(|| HeroCatalog::resolve(self.source))
    }

    /// Best counter-picks against one enemy, strongest first.
    ///
    /// An unknown enemy or candidate is skipped rather than reported.
    pub fn rank_synergy(&self, enemy_id: u32, personal: &PersonalStats) -> Fetched<Vec<SynergyResult>> {
        let catalog = self.catalog();
        let Some(enemy) = catalog.get(enemy_id) else {
            tracing::debug!(enemy_id, "enemy hero not in catalog; skipping");
            return Fetched::Data(Vec::new());
        };

        let matchups = match Fetched::from_result("matchups", self.source.matchups(enemy_id)) {
            Fetched::Data(rows) => rows,
            Fetched::Failed(e) => return Fetched::Failed(e),
        };

        let results = rank_candidates(&matchups, MIN_GAMES, self.top_picks)
            .into_iter()
            .filter_map(|candidate| {
                let Some(hero) = catalog.get(candidate.hero_id) else {
                    tracing::debug!(hero_id = candidate.hero_id, "candidate not in catalog; skipping");
                    return None;
                };
                let win_rate = round2(candidate.win_rate);
                Some(SynergyResult {
                    hero_id: hero.id,
                    name: hero.display_name.clone(),
                    image: hero.portrait_url.clone(),
                    win_rate,
                    advantage: round2(win_rate - 50.0),
                    games_played: candidate.games_played,
                    description: self.descriptions.describe(&hero.display_name, &enemy.display_name),
                    personal_stats: personal.get(hero.id),
                    enemy_hero: enemy.display_name.clone(),
                })
            })
            .collect();

        Fetched::Data(results)
    }

    /// Ranks counter-picks for every selected enemy, grouped in selection order.
    ///
    /// The selection is validated before anything is fetched.
    pub fn recommend(&self, enemy_names: &[String], account_id: Option<&str>) -> Result<Recommendations, AppError> {
        validate_enemy_selection(enemy_names)?;

        let mut recommendations = Recommendations::default();

        let personal = match account_id {
            Some(account) => {
                let fetched = PersonalStats::fetch(self.source, account);
                recommendations.personal_stats_failed = fetched.is_failed();
                fetched.or_empty()
            }
            None => PersonalStats::default(),
        };

        for name in enemy_names {
            let Some(enemy_id) = self.catalog().id_for_name(name) else {
                tracing::debug!(enemy = %name, "unknown enemy hero; skipping");
                recommendations.unresolved.push(name.clone());
                continue;
            };

            let fetched = self.rank_synergy(enemy_id, &personal);
            if fetched.is_failed() {
                recommendations.degraded.push(name.clone());
            }
            for mut result in fetched.or_empty() {
                result.enemy_hero = name.clone();
                recommendations.results.push(result);
            }
        }

        Ok(recommendations)
    }
}

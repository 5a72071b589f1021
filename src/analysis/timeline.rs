use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::api::models::{ItemPopularityDto, MatchDetailDto, PurchaseDto};
use crate::api::{Fetched, MatchDataSource};
use crate::config::{FETCH_WORKERS, PRO_MATCH_SAMPLE, TIMELINE_DEADLINE_SECS};

use super::items::{are_alternatives, is_excluded, BuildEntry, Phase, PhaseBuild};
use super::purchases::{ItemTiming, PurchaseTracker};

/// Adjacent alternatives bought closer together than this are merged.
pub const ALTERNATIVE_WINDOW_SECS: f64 = 120.0;
/// Time assigned to popularity items that carry none; lands in the late phase.
pub const MISSING_TIME_SENTINEL: f64 = 999_999.0;

/// A timeline slot: one item, or two interchangeable ones at their mean time.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildItem {
    pub item_key: String,
    pub alternative: Option<String>,
    pub time_seconds: f64,
}

impl BuildItem {
    fn single(timing: &ItemTiming) -> Self {
        BuildItem {
            item_key: timing.item_key.clone(),
            alternative: None,
            time_seconds: timing.average_time_seconds,
        }
    }

    fn to_entry(&self) -> BuildEntry {
        match &self.alternative {
            Some(alternative) => BuildEntry::for_alternatives(&self.item_key, alternative, self.time_seconds),
            None => BuildEntry::for_item(&self.item_key, self.time_seconds),
        }
    }
}

/// Merges strictly adjacent alternative pairs in a time-sorted sequence.
///
/// Each timing joins at most one pair. With three clustered alternatives only
/// the first two merge.
pub fn merge_alternatives(timings: &[ItemTiming]) -> Vec<BuildItem> {
    let mut merged = Vec::with_capacity(timings.len());
    let mut i = 0;

    while i < timings.len() {
        let current = &timings[i];
        if let Some(next) = timings.get(i + 1) {
            let gap = (current.average_time_seconds - next.average_time_seconds).abs();
            if gap < ALTERNATIVE_WINDOW_SECS && are_alternatives(&current.item_key, &next.item_key) {
                merged.push(BuildItem {
                    item_key: current.item_key.clone(),
                    alternative: Some(next.item_key.clone()),
                    time_seconds: (current.average_time_seconds + next.average_time_seconds) / 2.0,
                });
                i += 2;
                continue;
            }
        }
        merged.push(BuildItem::single(current));
        i += 1;
    }

    merged.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
    merged
}

pub fn bucket_phases(items: &[BuildItem]) -> PhaseBuild {
    let mut build = PhaseBuild::default();
    for item in items {
        build.push(item.to_entry());
    }
    build.sort();
    build
}

fn popularity_block(build: &mut PhaseBuild, phase: Phase, block: &Map<String, Value>) {
    for (key, value) in block {
        if is_excluded(key) {
            continue;
        }
        let seconds = value
            .get("time")
            .and_then(Value::as_f64)
            .unwrap_or(MISSING_TIME_SENTINEL);
        build.push_into(phase, BuildEntry::for_item(key, seconds));
    }
}

/// Buckets aggregate popularity by the upstream's own phase blocks.
pub fn popularity_build(popularity: &ItemPopularityDto) -> PhaseBuild {
    let mut build = PhaseBuild::default();
    popularity_block(&mut build, Phase::Start, &popularity.start_items);
    popularity_block(&mut build, Phase::Early, &popularity.early_game_items);
    popularity_block(&mut build, Phase::Mid, &popularity.mid_game_items);
    popularity_block(&mut build, Phase::Late, &popularity.late_game_items);
    build.sort();
    build
}

/// Progress of the per-match detail fan-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchProgress {
    Started { total: usize },
    MatchDone,
}

#[derive(Debug)]
enum MatchSample {
    Purchases(Vec<PurchaseDto>),
    NoPurchaseLog,
    Failed,
    PastDeadline,
}

/// What the pro-match pass managed to collect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSummary {
    pub matches_listed: usize,
    pub matches_with_purchases: usize,
    pub matches_failed: usize,
    pub matches_skipped: usize,
    pub match_list_failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildSource {
    ProMatches(SampleSummary),
    Popularity(SampleSummary),
    /// Both pathways failed upstream; the build is empty.
    Unavailable(SampleSummary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemBuild {
    pub phases: PhaseBuild,
    pub source: BuildSource,
}

pub struct TimelineEngine<'a, S> {
    source: &'a S,
    sample_size: usize,
    workers: usize,
    deadline: Duration,
}

impl<'a, S: MatchDataSource> TimelineEngine<'a, S> {
    pub fn new(source: &'a S) -> Self {
        TimelineEngine {
            source,
            sample_size: PRO_MATCH_SAMPLE,
            workers: FETCH_WORKERS,
            deadline: Duration::from_secs(TIMELINE_DEADLINE_SECS),
        }
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Shared budget for the whole match-detail fan-out.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Phase-bucketed build for a hero, from pro purchase logs or, failing
    /// that, aggregate item popularity.
    pub fn build(&self, hero_id: u32, progress: &(dyn Fn(FetchProgress) + Sync)) -> ItemBuild {
        let (timings, summary) = self.gather_timings(hero_id, progress);

        if !timings.is_empty() {
            let merged = merge_alternatives(&timings);
            return ItemBuild {
                phases: bucket_phases(&merged),
                source: BuildSource::ProMatches(summary),
            };
        }

        tracing::info!(hero_id, "no pro purchase data; falling back to item popularity");
        match Fetched::from_result("item popularity", self.source.item_popularity(hero_id)) {
            Fetched::Data(popularity) => ItemBuild {
                phases: popularity_build(&popularity),
                source: BuildSource::Popularity(summary),
            },
            Fetched::Failed(_) => ItemBuild {
                phases: PhaseBuild::default(),
                source: BuildSource::Unavailable(summary),
            },
        }
    }

    /// Average purchase time per item over recent pro matches.
    pub fn gather_timings(
        &self,
        hero_id: u32,
        progress: &(dyn Fn(FetchProgress) + Sync),
    ) -> (Vec<ItemTiming>, SampleSummary) {
        let mut summary = SampleSummary::default();

        let pro_matches = Fetched::from_result(
            "pro matches",
            self.source.recent_pro_matches(hero_id, self.sample_size),
        );
        summary.match_list_failed = pro_matches.is_failed();

        let match_ids: Vec<u64> = pro_matches
            .or_empty()
            .into_iter()
            .take(self.sample_size)
            .filter_map(|m| m.match_id)
            .collect();
        summary.matches_listed = match_ids.len();

        progress(FetchProgress::Started { total: match_ids.len() });
        let samples = self.fetch_samples(&match_ids, hero_id, progress);

        let mut tracker = PurchaseTracker::new();
        for sample in samples {
            match sample {
                MatchSample::Purchases(log) => {
                    summary.matches_with_purchases += 1;
                    tracker.add_log(&log);
                }
                MatchSample::NoPurchaseLog => {}
                MatchSample::Failed => summary.matches_failed += 1,
                MatchSample::PastDeadline => summary.matches_skipped += 1,
            }
        }

        tracing::debug!(hero_id, ?summary, "pro match sample gathered");
        (tracker.timings(), summary)
    }

    fn fetch_samples(
        &self,
        match_ids: &[u64],
        hero_id: u32,
        progress: &(dyn Fn(FetchProgress) + Sync),
    ) -> Vec<MatchSample> {
        let deadline = Instant::now() + self.deadline;
        let fetch = |match_id: &u64| {
            let sample = self.fetch_sample(*match_id, hero_id, deadline);
            progress(FetchProgress::MatchDone);
            sample
        };

        match rayon::ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(|| match_ids.par_iter().map(fetch).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "could not start fetch pool; fetching sequentially");
                match_ids.iter().map(fetch).collect()
            }
        }
    }

    fn fetch_sample(&self, match_id: u64, hero_id: u32, deadline: Instant) -> MatchSample {
        if Instant::now() >= deadline {
            tracing::debug!(match_id, "timeline deadline passed; skipping match");
            return MatchSample::PastDeadline;
        }
        match Fetched::from_result("match detail", self.source.match_detail(match_id)) {
            Fetched::Data(detail) => match hero_purchase_log(detail, hero_id) {
                Some(log) => MatchSample::Purchases(log),
                None => MatchSample::NoPurchaseLog,
            },
            Fetched::Failed(_) => MatchSample::Failed,
        }
    }
}

fn hero_purchase_log(detail: MatchDetailDto, hero_id: u32) -> Option<Vec<PurchaseDto>> {
    detail
        .players
        .into_iter()
        .find(|player| player.hero_id == Some(hero_id))
        .and_then(|player| player.purchase_log)
}

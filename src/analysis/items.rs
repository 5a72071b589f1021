//! Item naming, phase thresholds and build entry formatting shared by the
//! pro-match and popularity pathways.

use serde::Serialize;

pub const ITEM_IMAGE_BASE: &str = "https://steamcdn-a.akamaihd.net/apps/dota2/images/items/";
pub const RECIPE_PREFIX: &str = "recipe_";
pub const TELEPORT_KEYS: [&str; 2] = ["tpscroll", "town_portal_scroll"];

/// Raw item key corrections applied before naming and image lookup.
pub const ITEM_NAME_FIXES: &[(&str, &str)] = &[];

/// Items treated as interchangeable upgrade choices.
pub const ALTERNATIVE_ITEM_GROUPS: &[&[&str]] = &[
    &["manta", "sange_and_yasha", "kaya_and_sange", "yasha_and_kaya"],
    &["skadi", "heart"],
];

/// Upper bounds (exclusive) of the start, early and mid phases, in seconds.
pub const START_PHASE_END: f64 = 180.0;
pub const EARLY_PHASE_END: f64 = 900.0;
pub const MID_PHASE_END: f64 = 1800.0;

/// Recipes and teleport scrolls never show up in a build.
pub fn is_excluded(key: &str) -> bool {
    key.starts_with(RECIPE_PREFIX) || TELEPORT_KEYS.contains(&key)
}

pub fn are_alternatives(first: &str, second: &str) -> bool {
    ALTERNATIVE_ITEM_GROUPS
        .iter()
        .any(|group| group.contains(&first) && group.contains(&second))
}

/// Returns the corrected key and its display name.
pub fn fix_item_name(raw: &str) -> (String, String) {
    fix_item_name_with(raw, ITEM_NAME_FIXES)
}

fn fix_item_name_with(raw: &str, fixes: &[(&str, &str)]) -> (String, String) {
    let corrected = fixes
        .iter()
        .find(|(from, _)| *from == raw)
        .map(|(_, to)| *to)
        .unwrap_or(raw)
        .to_string();
    let display = title_case(&corrected.replace('_', " "));
    (corrected, display)
}

// Capitalises the first letter of every alphabetic run, lowercasing the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            out.push(c);
            prev_is_alpha = false;
        }
    }
    out
}

pub fn item_image_url(corrected_key: &str) -> String {
    format!("{}{}_lg.png", ITEM_IMAGE_BASE, corrected_key)
}

/// `"<minutes>m <seconds>s"` with floored minutes and the non-negative remainder.
pub fn format_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor() as i64;
    let remainder = seconds.rem_euclid(60.0) as i64;
    format!("{}m {}s", minutes, remainder)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Early,
    Mid,
    Late,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Start, Phase::Early, Phase::Mid, Phase::Late];

    /// Boundary values belong to the later phase.
    pub fn from_seconds(seconds: f64) -> Phase {
        if seconds < START_PHASE_END {
            Phase::Start
        } else if seconds < EARLY_PHASE_END {
            Phase::Early
        } else if seconds < MID_PHASE_END {
            Phase::Mid
        } else {
            Phase::Late
        }
    }

    #[cfg(test)]
    pub fn key(&self) -> &'static str {
        match self {
            Phase::Start => "start_items",
            Phase::Early => "early_game",
            Phase::Mid => "mid_game",
            Phase::Late => "late_game",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Start => "Starting Items (0-3m)",
            Phase::Early => "Early Game (3-15m)",
            Phase::Mid => "Mid Game (15-30m)",
            Phase::Late => "Late Game (30m+)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildEntry {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "image")]
    pub image_url: String,
    #[serde(rename = "time")]
    pub formatted_time: String,
    #[serde(rename = "sort_time")]
    pub sort_time_seconds: f64,
}

impl BuildEntry {
    pub fn for_item(raw_key: &str, seconds: f64) -> Self {
        let (corrected, display) = fix_item_name(raw_key);
        BuildEntry {
            display_name: display,
            image_url: item_image_url(&corrected),
            formatted_time: format_time(seconds),
            sort_time_seconds: seconds,
        }
    }

    /// "A OR B", pictured with the first item.
    pub fn for_alternatives(first_key: &str, second_key: &str, seconds: f64) -> Self {
        let (first_corrected, first_display) = fix_item_name(first_key);
        let (_, second_display) = fix_item_name(second_key);
        BuildEntry {
            display_name: format!("{} OR {}", first_display, second_display),
            image_url: item_image_url(&first_corrected),
            formatted_time: format_time(seconds),
            sort_time_seconds: seconds,
        }
    }
}

/// The four phase lists, serialized under their response keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseBuild {
    pub start_items: Vec<BuildEntry>,
    pub early_game: Vec<BuildEntry>,
    pub mid_game: Vec<BuildEntry>,
    pub late_game: Vec<BuildEntry>,
}

impl PhaseBuild {
    pub fn phase(&self, phase: Phase) -> &[BuildEntry] {
        match phase {
            Phase::Start => &self.start_items,
            Phase::Early => &self.early_game,
            Phase::Mid => &self.mid_game,
            Phase::Late => &self.late_game,
        }
    }

    fn phase_mut(&mut self, phase: Phase) -> &mut Vec<BuildEntry> {
        match phase {
            Phase::Start => &mut self.start_items,
            Phase::Early => &mut self.early_game,
            Phase::Mid => &mut self.mid_game,
            Phase::Late => &mut self.late_game,
        }
    }

    /// Appends to the phase its time falls in.
    pub fn push(&mut self, entry: BuildEntry) {
        let phase = Phase::from_seconds(entry.sort_time_seconds);
        self.phase_mut(phase).push(entry);
    }

    /// Appends to an explicit phase regardless of the entry's time.
    pub fn push_into(&mut self, phase: Phase, entry: BuildEntry) {
        self.phase_mut(phase).push(entry);
    }

    /// Stable ascending sort of every phase by time.
    pub fn sort(&mut self) {
        for phase in Phase::ALL {
            self.phase_mut(phase)
                .sort_by(|a, b| a.sort_time_seconds.total_cmp(&b.sort_time_seconds));
        }
    }

    pub fn total_items(&self) -> usize {
        Phase::ALL.iter().map(|p| self.phase(*p).len()).sum()
    }
}

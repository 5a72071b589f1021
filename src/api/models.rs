use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// GET /heroes
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HeroDto {
    pub id: u32,
    /// Internal name, e.g. `npc_dota_hero_anti_mage`.
    pub name: String,
    pub localized_name: String,
}

// GET /heroes/{id}/matchups
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MatchupDto {
    pub hero_id: u32,
    pub games_played: u32,
    pub wins: u32,
}

// GET /players/{account_id}/heroes
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayerHeroDto {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub hero_id: u32,
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub win: u32,
}

// GET /proMatches
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProMatchDto {
    #[serde(default)]
    pub match_id: Option<u64>,
}

// GET /matches/{match_id}
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct MatchDetailDto {
    #[serde(default)]
    pub players: Vec<MatchPlayerDto>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct MatchPlayerDto {
    #[serde(default)]
    pub hero_id: Option<u32>,
    /// Only present on parsed matches.
    #[serde(default)]
    pub purchase_log: Option<Vec<PurchaseDto>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PurchaseDto {
    pub key: String,
    pub time: f64,
}

// GET /heroes/{id}/itemPopularity
//
// Block values are usually plain purchase counts; a `time` field is honoured
// when present.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct ItemPopularityDto {
    #[serde(default)]
    pub start_items: Map<String, Value>,
    #[serde(default)]
    pub early_game_items: Map<String, Value>,
    #[serde(default)]
    pub mid_game_items: Map<String, Value>,
    #[serde(default)]
    pub late_game_items: Map<String, Value>,
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_hero_accepts_string_ids() {
        let rows: Vec<PlayerHeroDto> = serde_json::from_str(
            r#"[{"hero_id": "8", "games": 12, "win": 7}, {"hero_id": 1, "games": 3, "win": 1}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].hero_id, 8);
        assert_eq!(rows[1].hero_id, 1);
        assert_eq!(rows[0].win, 7);
    }

    #[test]
    fn test_match_detail_tolerates_missing_fields() {
        let detail: MatchDetailDto = serde_json::from_str(
            r#"{"match_id": 1, "players": [{"hero_id": 1}, {"hero_id": 2, "purchase_log": [{"key": "tango", "time": -80}]}]}"#,
        )
        .unwrap();
        assert_eq!(detail.players.len(), 2);
        assert!(detail.players[0].purchase_log.is_none());
        assert_eq!(detail.players[1].purchase_log.as_ref().unwrap()[0].time, -80.0);
    }

    #[test]
    fn test_item_popularity_keeps_document_order() {
        let pop: ItemPopularityDto = serde_json::from_str(
            r#"{"start_items": {"tango": 10, "branches": 8, "quelling_blade": 4}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = pop.start_items.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["tango", "branches", "quelling_blade"]);
        assert!(pop.late_game_items.is_empty());
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::models::HeroDto;
use crate::api::{Fetched, MatchDataSource};

pub const HERO_IMAGE_BASE: &str = "https://steamcdn-a.akamaihd.net/apps/dota2/images/heroes/";
const INTERNAL_NAME_PREFIX: &str = "npc_dota_hero_";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Hero {
    pub id: u32,
    #[serde(rename = "localized_name")]
    pub display_name: String,
    #[serde(rename = "image")]
    pub portrait_url: String,
}

impl Hero {
    pub fn from_dto(dto: &HeroDto) -> Self {
        let short = dto
            .name
            .strip_prefix(INTERNAL_NAME_PREFIX)
            .unwrap_or(&dto.name);
        Hero {
            id: dto.id,
            display_name: dto.localized_name.clone(),
            portrait_url: format!("{}{}_lg.png", HERO_IMAGE_BASE, short),
        }
    }
}

/// Every known hero, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct HeroCatalog {
    heroes: BTreeMap<u32, Hero>,
}

impl HeroCatalog {
    pub fn from_dtos(dtos: &[HeroDto]) -> Self {
        HeroCatalog {
            heroes: dtos.iter().map(|dto| (dto.id, Hero::from_dto(dto))).collect(),
        }
    }

    pub fn fetch<S: MatchDataSource>(source: &S) -> Fetched<HeroCatalog> {
        match Fetched::from_result("hero catalog", source.hero_catalog()) {
            Fetched::Data(dtos) => Fetched::Data(Self::from_dtos(&dtos)),
            Fetched::Failed(e) => Fetched::Failed(e),
        }
    }

    /// Like `fetch`, but an upstream failure just means no heroes are known.
    pub fn resolve<S: MatchDataSource>(source: &S) -> HeroCatalog {
        Self::fetch(source).or_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Hero> {
        self.heroes.get(&id)
    }

    pub fn id_for_name(&self, display_name: &str) -> Option<u32> {
        self.heroes
            .values()
            .find(|hero| hero.display_name == display_name)
            .map(|hero| hero.id)
    }

    /// Accepts a numeric id or an exact display name.
    pub fn lookup(&self, query: &str) -> Option<u32> {
        let query = query.trim();
        match query.parse::<u32>() {
            Ok(id) => self.heroes.contains_key(&id).then_some(id),
            Err(_) => self.id_for_name(query),
        }
    }

    /// Heroes in ascending id order.
    pub fn heroes(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.values()
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeSource;

    fn catalog() -> HeroCatalog {
        HeroCatalog::resolve(
            &FakeSource::new()
                .with_hero(8, "juggernaut", "Juggernaut")
                .with_hero(1, "antimage", "Anti-Mage"),
        )
    }

    #[test]
    fn test_portrait_url_strips_internal_prefix() {
        let catalog = catalog();
        let am = catalog.get(1).unwrap();
        assert_eq!(am.display_name, "Anti-Mage");
        assert_eq!(
            am.portrait_url,
            "https://steamcdn-a.akamaihd.net/apps/dota2/images/heroes/antimage_lg.png"
        );
    }

    #[test]
    fn test_name_lookup() {
        let catalog = catalog();
        assert_eq!(catalog.id_for_name("Juggernaut"), Some(8));
        assert_eq!(catalog.id_for_name("juggernaut"), None);
        assert_eq!(catalog.id_for_name("Pudge"), None);
    }

    #[test]
    fn test_lookup_by_id_or_name() {
        let catalog = catalog();
        assert_eq!(catalog.lookup("8"), Some(8));
        assert_eq!(catalog.lookup(" Anti-Mage "), Some(1));
        assert_eq!(catalog.lookup("99"), None);
    }

    #[test]
    fn test_heroes_sorted_by_id() {
        let ids: Vec<u32> = catalog().heroes().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 8]);
    }

    #[test]
    fn test_failed_fetch_is_empty_catalog() {
        let source = FakeSource::new().with_hero(1, "antimage", "Anti-Mage").failing_heroes();
        assert!(HeroCatalog::fetch(&source).is_failed());
        assert!(HeroCatalog::resolve(&source).is_empty());
    }
}

// OpenDota endpoint paths, relative to the configured base URL.

pub const HEROES: &str = "/heroes";

pub fn matchups(hero_id: u32) -> String {
    format!("/heroes/{}/matchups", hero_id)
}

pub fn item_popularity(hero_id: u32) -> String {
    format!("/heroes/{}/itemPopularity", hero_id)
}

pub fn player_heroes(account_id: &str) -> String {
    format!("/players/{}/heroes", account_id)
}

pub const PRO_MATCHES: &str = "/proMatches";

pub fn match_detail(match_id: u64) -> String {
    format!("/matches/{}", match_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(matchups(8), "/heroes/8/matchups");
        assert_eq!(item_popularity(1), "/heroes/1/itemPopularity");
        assert_eq!(player_heroes("86745912"), "/players/86745912/heroes");
        assert_eq!(match_detail(7_000_000_001), "/matches/7000000001");
    }
}

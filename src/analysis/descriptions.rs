use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Hand-written counter rationale, `candidate -> enemy -> text`.
#[derive(Debug, Clone, Default)]
pub struct DescriptionTable {
    entries: HashMap<String, HashMap<String, String>>,
}

impl DescriptionTable {
    #[cfg(test)]
    pub fn new(entries: HashMap<String, HashMap<String, String>>) -> Self {
        DescriptionTable { entries }
    }

    /// Reads the table from disk. A missing or malformed file yields an empty
    /// table and a warning; descriptions then fall back to the generated text.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                tracing::warn!(path = %path.display(), "description table not found; using generated descriptions");
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, HashMap<String, String>>>(&content) {
            Ok(entries) => {
                let table = DescriptionTable { entries };
                tracing::debug!(path = %path.display(), candidates = table.entries.len(), "loaded description table");
                table
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "description table is not valid JSON; ignoring it");
                Self::default()
            }
        }
    }

    pub fn get(&self, candidate: &str, enemy: &str) -> Option<&str> {
        self.entries
            .get(candidate)
            .and_then(|by_enemy| by_enemy.get(enemy))
            .map(String::as_str)
    }

    /// Full description shown for a counter-pick, always prefixed with the pairing.
    pub fn describe(&self, candidate: &str, enemy: &str) -> String {
        let base = match self.get(candidate, enemy) {
            Some(text) => text.to_string(),
            None => format!("{} counters {} effectively.", candidate, enemy),
        };
        format!("{} vs. {}: {}", candidate, enemy, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_describe_uses_table_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counters.json");
        fs::write(
            &path,
            r#"{"Anti-Mage": {"Storm Spirit": "Mana Break drains Storm's mana pool."}}"#,
        )
        .unwrap();

        let table = DescriptionTable::load(&path);
        assert_eq!(
            table.describe("Anti-Mage", "Storm Spirit"),
            "Anti-Mage vs. Storm Spirit: Mana Break drains Storm's mana pool."
        );
    }

    #[test]
    fn test_describe_falls_back_to_template() {
        let table = DescriptionTable::default();
        assert_eq!(
            table.describe("Axe", "Phantom Assassin"),
            "Axe vs. Phantom Assassin: Axe counters Phantom Assassin effectively."
        );
    }

    #[test]
    fn test_missing_or_malformed_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(DescriptionTable::load(&dir.path().join("absent.json")).entries.is_empty());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "[1, 2").unwrap();
        assert!(DescriptionTable::load(&broken).entries.is_empty());
    }
}

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Stats coverage for one format.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub format: String,
    pub total_pokemon: usize,
    pub pokemon_with_stats: usize,
    /// How many Pokemon carry each top-level stats field (abilities, items, ...).
    pub field_coverage: BTreeMap<String, usize>,
}

impl StatsSummary {
    /// Percentage of Pokemon carrying `field`, 0.0 when the format is empty.
    pub fn coverage_percent(&self, field: &str) -> f64 {
        if self.total_pokemon == 0 {
            return 0.0;
        }
        let count = self.field_coverage.get(field).copied().unwrap_or(0);
        count as f64 * 100.0 / self.total_pokemon as f64
    }
}

/// Snapshot of what is loaded and how fresh it is.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub cache_dir: PathBuf,
    pub loaded_formats: Vec<String>,
    pub smogon_formats: Vec<String>,
    pub total_pokemon: usize,
    pub format_counts: BTreeMap<String, usize>,
    pub last_update: Option<String>,
    pub age: String,
    pub stale: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_percent() {
        let mut summary = StatsSummary {
            format: "gen9randombattle".to_string(),
            total_pokemon: 4,
            ..Default::default()
        };
        summary.field_coverage.insert("items".to_string(), 3);
        assert_eq!(summary.coverage_percent("items"), 75.0);
        assert_eq!(summary.coverage_percent("moves"), 0.0);
    }

    #[test]
    fn test_coverage_percent_empty_format() {
        let summary = StatsSummary::default();
        assert_eq!(summary.coverage_percent("items"), 0.0);
    }
}

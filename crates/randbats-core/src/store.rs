//! In-memory lookup store over the cached format files.
//!
//! `RandBatsData` loads each configured format once (cache first, then the
//! bundled fallback directory, then an empty map) and answers lookups from
//! memory. Updates run through the `Updater` and reload only the formats
//! that changed. A background task can keep the cache fresh while a
//! long-running process serves lookups.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::RemoteClient;
use crate::cache::CacheManager;
use crate::config::Config;
use crate::formats::{resolve_formats, resolve_smogon_formats, PREFERRED_FORMATS, RANDBATS_FORMATS};
use crate::models::{CacheInfo, FormatData, FormatMetadata, StatsSummary};
use crate::updater::{UpdateReport, Updater, STATS_KEY};
use crate::utils::normalize_name;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background refresh channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Subdirectory of the bundled data dir holding Smogon sets
const BUNDLED_SMOGON_DIR: &str = "smogon";

/// A successful lookup: which format answered, under which key.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PokemonMatch<'a> {
    pub format: &'a str,
    pub name: &'a str,
    pub data: &'a Value,
}

impl<'a> PokemonMatch<'a> {
    /// Stats merged into the set, if the format publishes them
    pub fn stats(&self) -> Option<&'a Value> {
        self.data.get(STATS_KEY)
    }
}

/// Hits for one name across both data sources.
#[derive(Debug, Default, Serialize)]
pub struct SearchResults<'a> {
    pub randbats: Vec<PokemonMatch<'a>>,
    pub smogon: Vec<PokemonMatch<'a>>,
}

impl SearchResults<'_> {
    pub fn is_empty(&self) -> bool {
        self.randbats.is_empty() && self.smogon.is_empty()
    }
}

/// Messages from the background refresh task.
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    /// Cache was fresh, nothing downloaded
    Fresh { age: String },
    /// An update pass ran
    Completed(UpdateReport),
}

/// Owns the background refresh task; aborts it on drop.
pub struct RefresherHandle {
    task: JoinHandle<()>,
}

impl RefresherHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RefresherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct RandBatsData {
    config: Config,
    cache: CacheManager,
    client: RemoteClient,
    /// Loaded random battle formats, in load order
    formats: Vec<String>,
    data: BTreeMap<String, FormatData>,
    smogon: BTreeMap<String, FormatData>,
    refresh_rx: Option<mpsc::Receiver<RefreshEvent>>,
}

impl RandBatsData {
    /// Load from disk only. Never touches the network.
    pub fn load(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Cache directory configured");

        let cache = CacheManager::new(cache_dir)?;
        let client = RemoteClient::from_config(&config)?;

        let mut store = Self {
            config,
            cache,
            client,
            formats: Vec::new(),
            data: BTreeMap::new(),
            smogon: BTreeMap::new(),
            refresh_rx: None,
        };

        for format in resolve_formats(&store.config.formats) {
            store.load_format(&format);
        }
        for format in resolve_smogon_formats(&store.config.smogon_formats) {
            store.load_smogon(&format);
        }
        Ok(store)
    }

    /// Load from disk, then update first if auto-update is on and the
    /// cache is stale. Update failures are logged; cached data still serves.
    pub async fn open(config: Config) -> Result<Self> {
        let mut store = Self::load(config)?;
        if store.config.auto_update {
            store.ensure_fresh().await;
        }
        Ok(store)
    }

    /// Run an update pass if the cache is older than the update interval.
    /// Returns the report when a pass ran.
    pub async fn ensure_fresh(&mut self) -> Option<UpdateReport> {
        if !self.is_stale() {
            debug!(age = %self.cache.age_display(), "Cache is fresh");
            return None;
        }
        info!("Cache is stale, updating");
        let report = self.update(None, false).await;
        if !report.any_checked() {
            warn!("Auto-update could not reach upstream, using cached data");
        }
        Some(report)
    }

    pub fn is_stale(&self) -> bool {
        self.cache.is_stale(self.config.update_interval())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    // =========================================================================
    // Loading
    // =========================================================================

    fn bundled_path(&self, relative: &Path) -> Option<PathBuf> {
        self.config
            .bundled_dir
            .as_ref()
            .map(|dir| dir.join(relative))
            .filter(|path| path.exists())
    }

    fn read_bundled(path: &Path) -> Result<FormatData> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// (Re)load one format: cache, then bundled data, then empty.
    fn load_format(&mut self, format: &str) {
        let data = match self.cache.load_format(format) {
            Ok(Some(data)) => {
                debug!(format, "Loaded from cache");
                Some(data)
            }
            Ok(None) => None,
            Err(e) => {
                error!(format, error = %e, "Failed to load cached format");
                None
            }
        };

        let data = data.or_else(|| {
            let path = self.bundled_path(Path::new(&format!("{}.json", format)))?;
            match Self::read_bundled(&path) {
                Ok(data) => {
                    debug!(format, "Loaded from bundled data");
                    Some(data)
                }
                Err(e) => {
                    error!(format, error = %e, "Failed to load bundled format");
                    None
                }
            }
        });

        let data = data.unwrap_or_else(|| {
            warn!(format, "No data available");
            FormatData::new()
        });

        self.data.insert(format.to_string(), data);
        if !self.formats.iter().any(|f| f == format) {
            self.formats.push(format.to_string());
        }
    }

    fn load_smogon(&mut self, format: &str) {
        let data = match self.cache.load_smogon(format) {
            Ok(Some(data)) => Some(data),
            Ok(None) => None,
            Err(e) => {
                error!(format, error = %e, "Failed to load cached Smogon sets");
                None
            }
        };

        let data = data.or_else(|| {
            let relative = Path::new(BUNDLED_SMOGON_DIR).join(format!("{}.json", format));
            let path = self.bundled_path(&relative)?;
            Self::read_bundled(&path)
                .map_err(|e| error!(format, error = %e, "Failed to load bundled Smogon sets"))
                .ok()
        });

        match data {
            Some(data) => {
                self.smogon.insert(format.to_string(), data);
            }
            None => debug!(format, "No Smogon sets available"),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Loaded random battle formats, in load order
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    fn lookup<'a>(data: &'a FormatData, name: &str) -> Option<(&'a str, &'a Value)> {
        let normalized = normalize_name(name);
        data.get_key_value(name)
            .or_else(|| data.get_key_value(normalized.as_str()))
            .or_else(|| data.iter().find(|(key, _)| normalize_name(key) == normalized))
            .map(|(key, value)| (key.as_str(), value))
    }

    fn match_in<'a>(
        source: &'a BTreeMap<String, FormatData>,
        format: &str,
        name: &str,
    ) -> Option<PokemonMatch<'a>> {
        let (format, data) = source.get_key_value(format)?;
        Self::lookup(data, name).map(|(key, value)| PokemonMatch {
            format: format.as_str(),
            name: key,
            data: value,
        })
    }

    /// Find a Pokemon's set.
    ///
    /// Names are compared case-insensitively with punctuation ignored. With no
    /// format, the newest main formats are tried first, then the first loaded
    /// format.
    pub fn find_pokemon(&self, name: &str, format: Option<&str>) -> Option<PokemonMatch<'_>> {
        match format {
            Some(format) => {
                if !self.data.contains_key(format) {
                    warn!(format, "Format not available");
                    return None;
                }
                Self::match_in(&self.data, format, name)
            }
            None => PREFERRED_FORMATS
                .iter()
                .find_map(|format| Self::match_in(&self.data, format, name))
                .or_else(|| {
                    let first = self.formats.first()?;
                    Self::match_in(&self.data, first, name)
                }),
        }
    }

    pub fn get_pokemon(&self, name: &str, format: Option<&str>) -> Option<&Value> {
        self.find_pokemon(name, format).map(|m| m.data)
    }

    /// Pokemon names in a format; empty when the format isn't loaded
    pub fn list_pokemon(&self, format: &str) -> Vec<&str> {
        match self.data.get(format) {
            Some(data) => data.keys().map(String::as_str).collect(),
            None => {
                warn!(format, "Format not available");
                Vec::new()
            }
        }
    }

    pub fn pokemon_count(&self, format: &str) -> usize {
        self.data.get(format).map(|d| d.len()).unwrap_or(0)
    }

    /// Version info for a format: cache first, then bundled data
    pub fn metadata(&self, format: &str) -> Option<FormatMetadata> {
        match self.cache.load_metadata(format) {
            Ok(Some(meta)) => return Some(meta),
            Ok(None) => {}
            Err(e) => error!(format, error = %e, "Failed to load metadata"),
        }

        let path = self.bundled_path(Path::new(&format!("{}_metadata.json", format)))?;
        let contents = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&contents)
            .map_err(|e| error!(format, error = %e, "Failed to parse bundled metadata"))
            .ok()
    }

    pub fn cache_info(&self) -> CacheInfo {
        let format_counts: BTreeMap<String, usize> = self
            .data
            .iter()
            .map(|(format, data)| (format.clone(), data.len()))
            .collect();

        CacheInfo {
            cache_dir: self.cache.cache_dir().to_path_buf(),
            loaded_formats: self.formats.clone(),
            smogon_formats: self.smogon.keys().cloned().collect(),
            total_pokemon: format_counts.values().sum(),
            format_counts,
            last_update: self.cache.last_update().map(|ts| ts.to_rfc3339()),
            age: self.cache.age_display(),
            stale: self.is_stale(),
        }
    }

    // =========================================================================
    // Stats
    // =========================================================================

    /// Probability stats for one Pokemon
    pub fn get_stats(&self, name: &str, format: &str) -> Option<&Value> {
        self.find_pokemon(name, Some(format))?.stats()
    }

    /// Every Pokemon in the format that has stats
    pub fn format_stats(&self, format: &str) -> BTreeMap<&str, &Value> {
        self.data
            .get(format)
            .map(|data| {
                data.iter()
                    .filter_map(|(name, set)| set.get(STATS_KEY).map(|s| (name.as_str(), s)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// How much of a format carries stats, field by field
    pub fn stats_summary(&self, format: &str) -> Option<StatsSummary> {
        let data = self.data.get(format)?;
        let mut summary = StatsSummary {
            format: format.to_string(),
            total_pokemon: data.len(),
            ..Default::default()
        };

        for stats in data.values().filter_map(|set| set.get(STATS_KEY)) {
            summary.pokemon_with_stats += 1;
            if let Some(fields) = stats.as_object() {
                for field in fields.keys() {
                    *summary.field_coverage.entry(field.clone()).or_insert(0) += 1;
                }
            }
        }
        Some(summary)
    }

    // =========================================================================
    // Smogon
    // =========================================================================

    pub fn smogon_formats(&self) -> Vec<&str> {
        self.smogon.keys().map(String::as_str).collect()
    }

    /// Named competitive sets for a Pokemon in a Smogon tier
    pub fn get_smogon_sets(&self, name: &str, format: &str) -> Option<&Value> {
        Self::match_in(&self.smogon, format, name).map(|m| m.data)
    }

    /// Load a Smogon tier from disk if it isn't loaded yet. Returns
    /// whether the tier is available afterwards.
    pub fn load_smogon_tier(&mut self, format: &str) -> bool {
        if !self.smogon.contains_key(format) {
            self.load_smogon(format);
        }
        self.smogon.contains_key(format)
    }

    pub fn list_smogon_pokemon(&self, format: &str) -> Vec<&str> {
        self.smogon
            .get(format)
            .map(|data| data.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every loaded format, from both sources, that knows this Pokemon
    pub fn search_all(&self, name: &str) -> SearchResults<'_> {
        SearchResults {
            randbats: self
                .formats
                .iter()
                .filter_map(|format| Self::match_in(&self.data, format, name))
                .collect(),
            smogon: self
                .smogon
                .keys()
                .filter_map(|format| Self::match_in(&self.smogon, format, name))
                .collect(),
        }
    }

    // =========================================================================
    // Updating
    // =========================================================================

    fn updater(&self) -> Updater {
        Updater::new(
            self.client.clone(),
            self.cache.clone(),
            self.config.max_concurrent_downloads,
        )
    }

    /// Update formats (default: every loaded format) and reload the ones
    /// that changed.
    pub async fn update(&mut self, formats: Option<&[String]>, force: bool) -> UpdateReport {
        let formats = match formats {
            Some(formats) => resolve_formats(formats),
            None => self.formats.clone(),
        };
        let report = self.updater().update_formats(&formats, force).await;
        self.reload(&report.updated);
        report
    }

    /// Update every known random battle format
    pub async fn update_all(&mut self, force: bool) -> UpdateReport {
        let all: Vec<String> = RANDBATS_FORMATS.iter().map(|f| f.to_string()).collect();
        self.update(Some(&all), force).await
    }

    /// Download Smogon sets (default: configured tiers, or every tier) and load them
    pub async fn update_smogon(&mut self, formats: Option<&[String]>) -> UpdateReport {
        let formats = match formats {
            Some(formats) => resolve_smogon_formats(formats),
            None => self.config.smogon_formats_or_all(),
        };
        let report = self.updater().update_smogon(&formats).await;
        for format in &report.updated {
            self.load_smogon(format);
        }
        report
    }

    /// Reload updated formats that are already loaded; newly downloaded
    /// formats outside the configured set are left on disk.
    fn reload(&mut self, updated: &[String]) {
        for format in updated {
            if self.data.contains_key(format) {
                self.load_format(format);
            }
        }
    }

    // =========================================================================
    // Background Refresh
    // =========================================================================

    /// Spawn a task that checks freshness every `check_every` and runs an
    /// update pass once the cache is older than the update interval.
    ///
    /// Results arrive through `apply_refresh_events` / `next_refresh_event`.
    /// Dropping the handle stops the task.
    pub fn spawn_refresher(&mut self, check_every: Duration) -> RefresherHandle {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        self.refresh_rx = Some(rx);

        let updater = self.updater();
        let cache = self.cache.clone();
        let formats = self.formats.clone();
        let ttl = self.config.update_interval();

        info!(check_every_secs = check_every.as_secs(), ttl_secs = ttl.as_secs(), "Starting background refresh");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(check_every);
            loop {
                ticker.tick().await;
                let event = if cache.is_stale(ttl) {
                    RefreshEvent::Completed(updater.update_formats(&formats, false).await)
                } else {
                    RefreshEvent::Fresh {
                        age: cache.age_display(),
                    }
                };
                if let Err(e) = tx.send(event).await {
                    debug!(error = %e, "Refresh channel closed, stopping");
                    return;
                }
            }
        });

        RefresherHandle { task }
    }

    fn process_refresh_event(&mut self, event: &RefreshEvent) {
        match event {
            RefreshEvent::Completed(report) => self.reload(&report.updated),
            RefreshEvent::Fresh { age } => debug!(%age, "Background check: cache fresh"),
        }
    }

    /// Drain pending background results without waiting, applying each one
    pub fn apply_refresh_events(&mut self) -> Vec<RefreshEvent> {
        let events: Vec<RefreshEvent> = match self.refresh_rx {
            Some(ref mut rx) => {
                let mut events = Vec::new();
                while let Ok(event) = rx.try_recv() {
                    events.push(event);
                }
                events
            }
            None => Vec::new(),
        };

        for event in &events {
            self.process_refresh_event(event);
        }
        events
    }

    /// Wait for the next background result and apply it.
    /// `None` once no refresher is running.
    pub async fn next_refresh_event(&mut self) -> Option<RefreshEvent> {
        let event = self.refresh_rx.as_mut()?.recv().await?;
        self.process_refresh_event(&event);
        Some(event)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_json(path: &Path, value: &Value) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
    }

    fn config_for(dir: &TempDir) -> Config {
        Config {
            cache_dir: Some(dir.path().join("cache")),
            auto_update: false,
            ..Config::default()
        }
    }

    fn seeded() -> (TempDir, RandBatsData) {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache");
        write_json(
            &cache.join("gen9randombattle.json"),
            &json!({
                "pikachu": {"level": 50, "moves": ["thunderbolt", "quick attack"],
                            "stats": {"items": {"Light Ball": 1.0}, "abilities": {"Static": 0.5}}},
                "charizard": {"level": 55, "moves": ["flamethrower", "dragon claw"]},
                "Mr. Mime": {"level": 88}
            }),
        );
        write_json(
            &cache.join("gen8randombattle.json"),
            &json!({"snorlax": {"level": 84}}),
        );
        write_json(
            &cache.join("smogon").join("gen9ou.json"),
            &json!({"Pikachu": {"Bulky Pivot": {"item": "Light Ball", "moves": ["Volt Switch"]}}}),
        );

        let mut config = config_for(&dir);
        config.smogon_formats = vec!["gen9ou".to_string()];
        let store = RandBatsData::load(config).unwrap();
        (dir, store)
    }

    #[test]
    fn test_loads_every_configured_format() {
        let (_dir, store) = seeded();
        assert_eq!(store.formats().len(), RANDBATS_FORMATS.len());
        assert_eq!(store.pokemon_count("gen9randombattle"), 3);
        // Not cached and no bundled data: present but empty
        assert_eq!(store.pokemon_count("gen1randombattle"), 0);
    }

    #[test]
    fn test_get_pokemon_exact_match() {
        let (_dir, store) = seeded();
        let pokemon = store.get_pokemon("pikachu", Some("gen9randombattle")).unwrap();
        assert_eq!(pokemon["level"], json!(50));
        assert_eq!(pokemon["moves"][0], json!("thunderbolt"));
    }

    #[test]
    fn test_get_pokemon_case_insensitive() {
        let (_dir, store) = seeded();
        assert!(store.get_pokemon("Pikachu", Some("gen9randombattle")).is_some());
        let found = store.find_pokemon("mr-mime", Some("gen9randombattle")).unwrap();
        assert_eq!(found.name, "Mr. Mime");
    }

    #[test]
    fn test_get_pokemon_not_found() {
        let (_dir, store) = seeded();
        assert!(store.get_pokemon("nonexistent", Some("gen9randombattle")).is_none());
        assert!(store.get_pokemon("pikachu", Some("nonexistent_format")).is_none());
    }

    #[test]
    fn test_get_pokemon_detects_format() {
        let (_dir, store) = seeded();
        assert_eq!(store.find_pokemon("pikachu", None).unwrap().format, "gen9randombattle");
        assert_eq!(store.find_pokemon("Snorlax", None).unwrap().format, "gen8randombattle");
        assert!(store.find_pokemon("mew", None).is_none());
    }

    #[test]
    fn test_list_pokemon() {
        let (_dir, store) = seeded();
        let list = store.list_pokemon("gen9randombattle");
        assert_eq!(list.len(), 3);
        assert!(list.contains(&"pikachu"));
        assert!(list.contains(&"charizard"));
        assert!(store.list_pokemon("nonexistent_format").is_empty());
    }

    #[test]
    fn test_corrupt_cache_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache");
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(cache.join("gen9randombattle.json"), "invalid json").unwrap();

        let store = RandBatsData::load(config_for(&dir)).unwrap();
        assert!(store.formats().contains(&"gen9randombattle".to_string()));
        assert_eq!(store.pokemon_count("gen9randombattle"), 0);
    }

    #[test]
    fn test_bundled_fallback() {
        let dir = TempDir::new().unwrap();
        let bundled = dir.path().join("bundled");
        write_json(&bundled.join("gen1randombattle.json"), &json!({"mew": {"level": 70}}));
        write_json(
            &bundled.join("gen1randombattle_metadata.json"),
            &json!({"name": "gen1randombattle.json", "sha": "bundled-sha"}),
        );

        let mut config = config_for(&dir);
        config.bundled_dir = Some(bundled);
        config.formats = vec!["gen1".to_string()];
        let store = RandBatsData::load(config).unwrap();

        assert_eq!(store.formats(), ["gen1randombattle".to_string()]);
        assert!(store.get_pokemon("Mew", None).is_some());
        assert_eq!(store.metadata("gen1randombattle").unwrap().sha, "bundled-sha");
    }

    #[test]
    fn test_cache_info() {
        let (_dir, store) = seeded();
        let info = store.cache_info();
        assert_eq!(info.total_pokemon, 4);
        assert_eq!(info.format_counts["gen9randombattle"], 3);
        assert_eq!(info.smogon_formats, vec!["gen9ou"]);
        assert!(info.last_update.is_none());
        assert_eq!(info.age, "never");
        assert!(info.stale);
    }

    #[test]
    fn test_stats_lookup_and_summary() {
        let (_dir, store) = seeded();
        let stats = store.get_stats("Pikachu", "gen9randombattle").unwrap();
        assert_eq!(stats["items"]["Light Ball"], json!(1.0));
        assert!(store.get_stats("charizard", "gen9randombattle").is_none());

        assert_eq!(store.format_stats("gen9randombattle").len(), 1);

        let summary = store.stats_summary("gen9randombattle").unwrap();
        assert_eq!(summary.total_pokemon, 3);
        assert_eq!(summary.pokemon_with_stats, 1);
        assert_eq!(summary.field_coverage["items"], 1);
        assert_eq!(summary.field_coverage["abilities"], 1);
        assert!(store.stats_summary("gen9ou").is_none());
    }

    #[test]
    fn test_smogon_sets_and_search() {
        let (_dir, store) = seeded();
        let sets = store.get_smogon_sets("pikachu", "gen9ou").unwrap();
        assert_eq!(sets["Bulky Pivot"]["item"], json!("Light Ball"));
        assert_eq!(store.list_smogon_pokemon("gen9ou"), vec!["Pikachu"]);

        let results = store.search_all("PIKACHU");
        assert_eq!(results.randbats.len(), 1);
        assert_eq!(results.randbats[0].format, "gen9randombattle");
        assert_eq!(results.smogon.len(), 1);
        assert!(store.search_all("missingno").is_empty());
    }

    #[test]
    fn test_load_smogon_tier_on_demand() {
        let dir = TempDir::new().unwrap();
        write_json(
            &dir.path().join("cache").join("smogon").join("gen8ou.json"),
            &json!({"Dragapult": {"Choice Specs": {"item": "Choice Specs"}}}),
        );

        let mut store = RandBatsData::load(config_for(&dir)).unwrap();
        assert!(store.smogon_formats().is_empty());
        assert!(store.load_smogon_tier("gen8ou"));
        assert!(store.get_smogon_sets("dragapult", "gen8ou").is_some());
        assert!(!store.load_smogon_tier("gen9ou"));
    }

    #[test]
    fn test_apply_refresh_events_without_refresher() {
        let (_dir, mut store) = seeded();
        assert!(store.apply_refresh_events().is_empty());
    }

    #[tokio::test]
    async fn test_refresher_reports_fresh_cache() {
        let (_dir, mut store) = seeded();
        store.cache().mark_updated().unwrap();

        let handle = store.spawn_refresher(Duration::from_secs(3600));
        let event = tokio::time::timeout(Duration::from_secs(5), store.next_refresh_event())
            .await
            .expect("refresh timed out");

        match event {
            Some(RefreshEvent::Fresh { age }) => assert_eq!(age, "just now"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(!handle.is_finished());
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_refresher() {
        let (_dir, mut store) = seeded();
        store.cache().mark_updated().unwrap();

        let handle = store.spawn_refresher(Duration::from_secs(3600));
        // The first check runs immediately
        assert!(store.next_refresh_event().await.is_some());

        drop(handle);
        let next = tokio::time::timeout(Duration::from_secs(5), store.next_refresh_event())
            .await
            .expect("refresher kept running after its handle was dropped");
        assert!(next.is_none());
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::{FormatData, FormatMetadata};
use crate::utils::format_age;

/// Timestamp of the last completed update pass
const LAST_UPDATE_FILE: &str = "last_update";

/// Subdirectory holding Smogon set files
const SMOGON_DIR: &str = "smogon";

const METADATA_SUFFIX: &str = "_metadata";

/// Flat-file cache for format data.
///
/// Layout:
/// - `{format}.json`: set data with stats merged in
/// - `{format}_metadata.json`: upstream version info
/// - `smogon/{format}.json`: Smogon sets
/// - `last_update`: RFC 3339 timestamp
#[derive(Debug, Clone)]
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn smogon_path(&self, format: &str) -> PathBuf {
        self.cache_dir.join(SMOGON_DIR).join(format!("{}.json", format))
    }

    fn load_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;

        let parsed = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", path.display()))?;

        Ok(Some(parsed))
    }

    /// Write via a temporary sibling and rename, so readers never see a
    /// half-written file and a failed write leaves the old one intact.
    fn save_file<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache file: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move cache file into place: {}", path.display()))?;
        Ok(())
    }

    // ===== Format Data =====

    pub fn load_format(&self, format: &str) -> Result<Option<FormatData>> {
        Self::load_file(&self.cache_path(format))
    }

    pub fn save_format(&self, format: &str, data: &FormatData) -> Result<()> {
        Self::save_file(&self.cache_path(format), data)
    }

    pub fn has_format(&self, format: &str) -> bool {
        self.cache_path(format).exists()
    }

    // ===== Metadata =====

    pub fn load_metadata(&self, format: &str) -> Result<Option<FormatMetadata>> {
        Self::load_file(&self.cache_path(&format!("{}{}", format, METADATA_SUFFIX)))
    }

    pub fn save_metadata(&self, format: &str, metadata: &FormatMetadata) -> Result<()> {
        Self::save_file(&self.cache_path(&format!("{}{}", format, METADATA_SUFFIX)), metadata)
    }

    // ===== Smogon Sets =====

    pub fn load_smogon(&self, format: &str) -> Result<Option<FormatData>> {
        Self::load_file(&self.smogon_path(format))
    }

    pub fn save_smogon(&self, format: &str, data: &FormatData) -> Result<()> {
        Self::save_file(&self.smogon_path(format), data)
    }

    // ===== Freshness =====

    /// When the last update pass finished. Unreadable timestamps count as never.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        let path = self.cache_dir.join(LAST_UPDATE_FILE);
        let contents = std::fs::read_to_string(&path).ok()?;
        match DateTime::parse_from_rfc3339(contents.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable last_update timestamp");
                None
            }
        }
    }

    pub fn mark_updated(&self) -> Result<()> {
        self.mark_updated_at(Utc::now())
    }

    pub fn mark_updated_at(&self, at: DateTime<Utc>) -> Result<()> {
        let path = self.cache_dir.join(LAST_UPDATE_FILE);
        std::fs::write(&path, at.to_rfc3339())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.last_update().map(|ts| (Utc::now() - ts).num_minutes())
    }

    pub fn age_display(&self) -> String {
        self.age_minutes()
            .map(format_age)
            .unwrap_or_else(|| "never".to_string())
    }

    /// Stale when never updated or older than `ttl`. A timestamp in the
    /// future (clock skew) is treated as fresh.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        let Some(last) = self.last_update() else {
            return true;
        };
        let age = Utc::now() - last;
        match age.to_std() {
            Ok(age) => age > ttl,
            Err(_) => false,
        }
    }

    /// Formats that have a data file in the cache, sorted.
    pub fn cached_formats(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        let mut formats: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let stem = name.strip_suffix(".json")?;
                (!stem.ends_with(METADATA_SUFFIX)).then(|| stem.to_string())
            })
            .collect();
        formats.sort();
        formats
    }

    /// True for entries this cache writes: data and metadata files, their
    /// temp siblings, the timestamp and the Smogon subdirectory.
    fn is_owned(name: &str, is_dir: bool) -> bool {
        if is_dir {
            return name == SMOGON_DIR;
        }
        name == LAST_UPDATE_FILE || name.ends_with(".json") || name.ends_with(".json.tmp")
    }

    /// Remove every cached file. The directory itself is kept, as is anything
    /// the cache didn't write.
    pub fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let is_dir = entry.file_type()?.is_dir();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !Self::is_owned(&name, is_dir) {
                debug!(name = %name, "Leaving non-cache entry in place");
                continue;
            }

            let path = entry.path();
            let removed = if is_dir {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            removed.with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn manager() -> (TempDir, CacheManager) {
        let dir = TempDir::new().unwrap();
        let cache = CacheManager::new(dir.path().join("cache")).unwrap();
        (dir, cache)
    }

    fn sample() -> FormatData {
        json!({"pikachu": {"level": 50, "moves": ["thunderbolt"]}})
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_format_roundtrip() {
        let (_dir, cache) = manager();
        assert!(cache.load_format("gen9randombattle").unwrap().is_none());
        cache.save_format("gen9randombattle", &sample()).unwrap();
        assert_eq!(cache.load_format("gen9randombattle").unwrap(), Some(sample()));
        assert!(cache.has_format("gen9randombattle"));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let (_dir, cache) = manager();
        std::fs::write(cache.cache_dir().join("gen9randombattle.json"), "invalid json").unwrap();
        assert!(cache.load_format("gen9randombattle").is_err());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (_dir, cache) = manager();
        cache.save_format("gen1randombattle", &sample()).unwrap();
        assert!(!cache.cache_dir().join("gen1randombattle.json.tmp").exists());
    }

    #[test]
    fn test_stale_without_timestamp() {
        let (_dir, cache) = manager();
        assert!(cache.is_stale(DAY));
        assert_eq!(cache.age_display(), "never");
    }

    #[test]
    fn test_fresh_after_mark_updated() {
        let (_dir, cache) = manager();
        cache.mark_updated().unwrap();
        assert!(!cache.is_stale(DAY));
        assert_eq!(cache.age_display(), "just now");
    }

    #[test]
    fn test_stale_after_ttl() {
        let (_dir, cache) = manager();
        cache.mark_updated_at(Utc::now() - ChronoDuration::hours(25)).unwrap();
        assert!(cache.is_stale(DAY));
        assert!(!cache.is_stale(Duration::from_secs(48 * 3600)));
    }

    #[test]
    fn test_future_timestamp_is_fresh() {
        let (_dir, cache) = manager();
        cache.mark_updated_at(Utc::now() + ChronoDuration::hours(2)).unwrap();
        assert!(!cache.is_stale(DAY));
    }

    #[test]
    fn test_garbage_timestamp_is_stale() {
        let (_dir, cache) = manager();
        std::fs::write(cache.cache_dir().join("last_update"), "yesterday").unwrap();
        assert!(cache.last_update().is_none());
        assert!(cache.is_stale(DAY));
    }

    #[test]
    fn test_cached_formats_skips_metadata() {
        let (_dir, cache) = manager();
        cache.save_format("gen9randombattle", &sample()).unwrap();
        cache.save_format("gen1randombattle", &sample()).unwrap();
        cache
            .save_metadata(
                "gen9randombattle",
                &FormatMetadata {
                    name: "gen9randombattle.json".to_string(),
                    path: String::new(),
                    sha: "abc".to_string(),
                    size: 1,
                    download_url: None,
                    downloaded_at: None,
                },
            )
            .unwrap();
        cache.save_smogon("gen9ou", &sample()).unwrap();
        assert_eq!(cache.cached_formats(), vec!["gen1randombattle", "gen9randombattle"]);
        assert_eq!(cache.load_metadata("gen9randombattle").unwrap().unwrap().sha, "abc");
    }

    #[test]
    fn test_clear() {
        let (_dir, cache) = manager();
        cache.save_format("gen9randombattle", &sample()).unwrap();
        cache.save_smogon("gen9ou", &sample()).unwrap();
        cache.mark_updated().unwrap();
        cache.clear().unwrap();
        assert!(cache.cached_formats().is_empty());
        assert!(cache.load_smogon("gen9ou").unwrap().is_none());
        assert!(cache.last_update().is_none());
    }

    #[test]
    fn test_clear_keeps_foreign_entries() {
        let (_dir, cache) = manager();
        let root = cache.cache_dir().to_path_buf();
        std::fs::write(root.join("notes.txt"), "keep me").unwrap();
        std::fs::create_dir_all(root.join("projects/src")).unwrap();
        std::fs::write(root.join("projects/src/main.rs"), "fn main() {}").unwrap();
        std::fs::write(root.join("gen9randombattle.json.tmp"), "{").unwrap();
        cache.save_format("gen9randombattle", &sample()).unwrap();
        cache.save_smogon("gen9ou", &sample()).unwrap();
        cache.mark_updated().unwrap();

        cache.clear().unwrap();

        assert!(root.join("notes.txt").exists());
        assert!(root.join("projects/src/main.rs").exists());
        assert!(!root.join("gen9randombattle.json").exists());
        assert!(!root.join("gen9randombattle.json.tmp").exists());
        assert!(!root.join("smogon").exists());
        assert!(!root.join("last_update").exists());
    }
}

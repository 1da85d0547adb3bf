//! Download pass that brings cached formats up to date.
//!
//! For each format the upstream git blob sha is compared with the one stored
//! beside the cached file; only changed formats are downloaded. A format that
//! fails to download keeps whatever was cached before.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::RemoteClient;
use crate::cache::CacheManager;
use crate::models::FormatData;

/// Key under which per-Pokemon stats are merged into set data
pub const STATS_KEY: &str = "stats";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Unchanged,
}

/// Result of one update pass, in the order formats were requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateReport {
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    /// (format, error message)
    pub failed: Vec<(String, String)>,
}

impl UpdateReport {
    /// At least one format was checked against upstream without error
    pub fn any_checked(&self) -> bool {
        !self.updated.is_empty() || !self.unchanged.is_empty()
    }

    pub fn total(&self) -> usize {
        self.updated.len() + self.unchanged.len() + self.failed.len()
    }
}

pub struct Updater {
    client: RemoteClient,
    cache: CacheManager,
    max_concurrent: usize,
}

impl Updater {
    pub fn new(client: RemoteClient, cache: CacheManager, max_concurrent: usize) -> Self {
        Self {
            client,
            cache,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Update the given random battle formats.
    ///
    /// With `force`, formats are downloaded even when the sha is unchanged.
    /// The last-update timestamp is written when at least one format was
    /// checked successfully, so a fully offline pass is retried next time.
    pub async fn update_formats(&self, formats: &[String], force: bool) -> UpdateReport {
        info!(count = formats.len(), force, "Checking formats for updates");

        let results: HashMap<String, Result<UpdateOutcome>> = stream::iter(formats.iter().cloned())
            .map(|format| async move {
                let outcome = self.update_format(&format, force).await;
                (format, outcome)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let report = build_report(formats, results);

        if report.any_checked() {
            if let Err(e) = self.cache.mark_updated() {
                warn!(error = %e, "Failed to record update timestamp");
            }
        }

        info!(
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "Update pass complete"
        );
        report
    }

    async fn update_format(&self, format: &str, force: bool) -> Result<UpdateOutcome> {
        let remote_meta = match self.client.fetch_metadata(format).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                // The contents API has a tight anonymous quota; the raw file doesn't
                warn!(format, error = %e, "Metadata unavailable, downloading without version check");
                None
            }
        };

        if !force && self.cache.has_format(format) {
            if let Some(ref remote) = remote_meta {
                match self.cache.load_metadata(format) {
                    Ok(Some(local)) if local.same_version(remote) => {
                        debug!(format, sha = %remote.sha, "Format unchanged");
                        return Ok(UpdateOutcome::Unchanged);
                    }
                    Ok(_) => {}
                    Err(e) => debug!(format, error = %e, "Cached metadata unreadable"),
                }
            }
        }

        let mut data = self
            .client
            .fetch_format_data(format)
            .await
            .with_context(|| format!("Failed to download {}", format))?;

        match self.client.fetch_format_stats(format).await {
            Ok(Some(stats)) => {
                let merged = merge_stats(&mut data, &stats);
                debug!(format, merged, "Merged stats");
            }
            Ok(None) => {}
            Err(e) => warn!(format, error = %e, "Stats download failed, keeping sets only"),
        }

        self.cache.save_format(format, &data)?;
        if let Some(mut meta) = remote_meta {
            meta.downloaded_at = Some(Utc::now());
            self.cache.save_metadata(format, &meta)?;
        }

        info!(format, pokemon = data.len(), "Format updated");
        Ok(UpdateOutcome::Updated)
    }

    /// Download Smogon set files. There is no version endpoint for these,
    /// so every requested tier is fetched.
    pub async fn update_smogon(&self, formats: &[String]) -> UpdateReport {
        info!(count = formats.len(), "Downloading Smogon sets");

        let results: HashMap<String, Result<UpdateOutcome>> = stream::iter(formats.iter().cloned())
            .map(|format| async move {
                let outcome = async {
                    let data = self
                        .client
                        .fetch_smogon_sets(&format)
                        .await
                        .with_context(|| format!("Failed to download Smogon sets for {}", format))?;
                    self.cache.save_smogon(&format, &data)?;
                    debug!(format = %format, pokemon = data.len(), "Smogon sets saved");
                    Ok::<_, anyhow::Error>(UpdateOutcome::Updated)
                }
                .await;
                (format, outcome)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        build_report(formats, results)
    }
}

fn build_report(formats: &[String], mut results: HashMap<String, Result<UpdateOutcome>>) -> UpdateReport {
    let mut report = UpdateReport::default();
    for format in formats {
        match results.remove(format) {
            Some(Ok(UpdateOutcome::Updated)) => report.updated.push(format.clone()),
            Some(Ok(UpdateOutcome::Unchanged)) => report.unchanged.push(format.clone()),
            Some(Err(e)) => {
                warn!(format = %format, error = %e, "Format update failed");
                report.failed.push((format.clone(), format!("{:#}", e)));
            }
            // Duplicate entry, already reported
            None => {}
        }
    }
    report
}

/// Attach each Pokemon's stats to its set entry. Returns how many were merged.
///
/// Stats for Pokemon missing from the set data are dropped.
pub fn merge_stats(data: &mut FormatData, stats: &FormatData) -> usize {
    let mut merged = 0;
    for (name, pokemon_stats) in stats {
        if let Some(Value::Object(entry)) = data.get_mut(name) {
            entry.insert(STATS_KEY.to_string(), pokemon_stats.clone());
            merged += 1;
        }
    }
    merged
}

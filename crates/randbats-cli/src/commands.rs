use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::cli::Command;
use crate::display;
use randbats_core::formats::{is_smogon_format, resolve_formats};
use randbats_core::{CacheManager, Config, RandBatsData, RefreshEvent};

/// `offline` is the `--offline` flag; it also switches auto-update off in `config`.
pub async fn run(command: Command, config: Config, offline: bool) -> Result<()> {
    match command {
        Command::Update { format, all, force } => update(config, format, all, force).await,
        Command::Get { name, format, json } => {
            let store = RandBatsData::open(config).await?;
            get(&store, &name, format.as_deref(), json)
        }
        Command::List { format, count } => {
            let store = RandBatsData::open(config).await?;
            list(&store, format.as_deref(), count);
            Ok(())
        }
        Command::Info { json } => {
            let store = RandBatsData::load(config)?;
            let info = store.cache_info();
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print!("{}", display::cache_info(&info));
            }
            Ok(())
        }
        Command::Formats => {
            print!("{}", display::formats_table());
            Ok(())
        }
        Command::Stats {
            name,
            format,
            summary,
            json,
        } => {
            let store = RandBatsData::open(config).await?;
            stats(&store, name.as_deref(), &format, summary, json)
        }
        Command::Sets { name, format, json } => sets(config, offline, &name, &format, json).await,
        Command::UpdateSmogon { format } => {
            let mut store = RandBatsData::load(config)?;
            let report = match format {
                Some(format) => store.update_smogon(Some(std::slice::from_ref(&format))).await,
                None => store.update_smogon(None).await,
            };
            print!("{}", display::update_report(&report));
            Ok(())
        }
        Command::Search { name } => {
            let store = RandBatsData::open(config).await?;
            print!("{}", display::search_results(&name, &store.search_all(&name)));
            Ok(())
        }
        Command::Watch {
            interval_hours,
            check_minutes,
        } => watch(config, interval_hours, check_minutes).await,
        Command::Config { init } => {
            if init {
                config.save()?;
                info!("Configuration written");
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::ClearCache => {
            let cache = CacheManager::new(config.cache_dir()?)?;
            cache.clear()?;
            println!("Cleared {}", cache.cache_dir().display());
            Ok(())
        }
    }
}

async fn update(config: Config, format: Option<String>, all: bool, force: bool) -> Result<()> {
    // The explicit update replaces the automatic one
    let mut store = RandBatsData::load(Config {
        auto_update: false,
        ..config
    })?;

    let report = if all {
        store.update_all(force).await
    } else if let Some(format) = format {
        let formats = resolve_formats(&[&format]);
        if formats.is_empty() {
            bail!("Unknown format or alias: {}", format);
        }
        store.update(Some(formats.as_slice()), force).await
    } else {
        store.update(None, force).await
    };

    print!("{}", display::update_report(&report));
    if !report.any_checked() && report.total() > 0 {
        bail!("No format could be updated");
    }
    Ok(())
}

fn get(store: &RandBatsData, name: &str, format: Option<&str>, json: bool) -> Result<()> {
    let Some(found) = store.find_pokemon(name, format) else {
        match format {
            Some(format) => bail!("Pokemon '{}' not found in {}", name, format),
            None => bail!("Pokemon '{}' not found", name),
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(found.data)?);
    } else {
        print!("{}", display::pokemon(&found));
    }
    Ok(())
}

fn list(store: &RandBatsData, format: Option<&str>, count_only: bool) {
    let formats = match format {
        Some(format) => resolve_formats(&[format]),
        None => store.formats().to_vec(),
    };
    if formats.is_empty() {
        println!("No formats loaded");
        return;
    }

    for format in &formats {
        if count_only {
            println!("{}: {} Pokemon", format, store.pokemon_count(format));
        } else {
            print!("{}", display::pokemon_list(format, &store.list_pokemon(format)));
        }
    }
}

fn stats(store: &RandBatsData, name: Option<&str>, format: &str, summary: bool, json: bool) -> Result<()> {
    if summary {
        let Some(summary) = store.stats_summary(format) else {
            bail!("Format {} is not loaded", format);
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print!("{}", display::stats_summary(&summary));
        }
        return Ok(());
    }

    let Some(name) = name else {
        bail!("A Pokemon name is required unless --summary is given");
    };
    let Some(found) = store.find_pokemon(name, Some(format)) else {
        bail!("Pokemon '{}' not found in {}", name, format);
    };
    let Some(stats) = found.stats() else {
        bail!("No stats available for {} in {}", found.name, format);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        print!("{}", display::stats(found.name, format, stats));
    }
    Ok(())
}

async fn sets(config: Config, offline: bool, name: &str, format: &str, json: bool) -> Result<()> {
    let format = format.trim().to_lowercase();
    if !is_smogon_format(&format) {
        bail!("Unknown Smogon tier: {}", format);
    }

    let mut store = RandBatsData::load(config)?;
    if !store.load_smogon_tier(&format) {
        if offline {
            bail!("Smogon tier {} is not cached; run update-smogon first", format);
        }
        info!(format = %format, "Smogon tier not loaded, downloading");
        let report = store.update_smogon(Some(std::slice::from_ref(&format))).await;
        if let Some((_, error)) = report.failed.first() {
            bail!("Failed to download {}: {}", format, error);
        }
    }

    let Some(sets) = store.get_smogon_sets(name, &format) else {
        bail!("No Smogon sets for '{}' in {}", name, format);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(sets)?);
    } else {
        print!("{}", display::smogon_sets(name, &format, sets));
    }
    Ok(())
}

/// How often `watch` checks freshness; at least one minute
fn check_interval(minutes: u64) -> Duration {
    Duration::from_secs(minutes.max(1).saturating_mul(60))
}

async fn watch(config: Config, interval_hours: Option<u64>, check_minutes: u64) -> Result<()> {
    let mut config = config;
    if let Some(hours) = interval_hours {
        config.update_interval_hours = hours;
    }

    let mut store = RandBatsData::load(config)?;
    let check_every = check_interval(check_minutes);
    let _refresher = store.spawn_refresher(check_every);
    println!(
        "Watching {} formats, checking every {} min (Ctrl-C to stop)",
        store.formats().len(),
        check_every.as_secs() / 60
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                return Ok(());
            }
            event = store.next_refresh_event() => match event {
                Some(RefreshEvent::Completed(report)) => print!("{}", display::update_report(&report)),
                Some(RefreshEvent::Fresh { age }) => info!(%age, "Cache fresh"),
                None => {
                    warn!("Background refresh stopped");
                    return Ok(());
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_json(path: &std::path::Path, value: serde_json::Value) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, value.to_string()).unwrap();
    }

    /// Cache with one format and one Smogon tier; nothing reachable upstream.
    fn seeded_config() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache");
        write_json(
            &cache.join("gen9randombattle.json"),
            json!({
                "pikachu": {"level": 93, "stats": {"items": {"Light Ball": 1.0}}},
                "charizard": {"level": 84}
            }),
        );
        write_json(
            &cache.join("smogon").join("gen9ou.json"),
            json!({"Great Tusk": {"Rapid Spin": {"item": "Booster Energy"}}}),
        );

        let config = Config {
            cache_dir: Some(cache),
            formats: vec!["gen9randombattle".to_string()],
            auto_update: false,
            randbats_base_url: "http://127.0.0.1:9/data".to_string(),
            stats_base_url: "http://127.0.0.1:9/data/stats".to_string(),
            metadata_base_url: "http://127.0.0.1:9/contents/data".to_string(),
            smogon_base_url: "http://127.0.0.1:9/smogon".to_string(),
            ..Config::default()
        };
        (dir, config)
    }

    #[test]
    fn test_get_found_and_missing() {
        let (_dir, config) = seeded_config();
        let store = RandBatsData::load(config).unwrap();

        assert!(get(&store, "Pikachu", None, false).is_ok());
        assert!(get(&store, "pikachu", Some("gen9randombattle"), true).is_ok());

        let err = get(&store, "missingno", None, false).unwrap_err();
        assert!(err.to_string().contains("missingno"));
        assert!(get(&store, "pikachu", Some("gen1randombattle"), false).is_err());
    }

    #[test]
    fn test_stats_errors() {
        let (_dir, config) = seeded_config();
        let store = RandBatsData::load(config).unwrap();

        assert!(stats(&store, Some("pikachu"), "gen9randombattle", false, false).is_ok());
        assert!(stats(&store, None, "gen9randombattle", true, true).is_ok());

        assert!(stats(&store, Some("missingno"), "gen9randombattle", false, false).is_err());
        let err = stats(&store, Some("charizard"), "gen9randombattle", false, false).unwrap_err();
        assert!(err.to_string().contains("No stats"));
        assert!(stats(&store, None, "gen1randombattle", true, false).is_err());
    }

    #[tokio::test]
    async fn test_sets_from_cache() {
        let (_dir, config) = seeded_config();
        assert!(sets(config.clone(), true, "great-tusk", "gen9ou", false).await.is_ok());
        assert!(sets(config.clone(), true, "missingno", "gen9ou", false).await.is_err());

        let err = sets(config, true, "pikachu", "gen9randombattle", false).await.unwrap_err();
        assert!(err.to_string().contains("Unknown Smogon tier"));
    }

    #[tokio::test]
    async fn test_sets_offline_flag_controls_download() {
        let (_dir, config) = seeded_config();

        let err = sets(config.clone(), true, "dragapult", "gen8ou", false).await.unwrap_err();
        assert!(err.to_string().contains("not cached"));

        // auto_update off in the config is not the same as --offline
        let err = sets(config, false, "dragapult", "gen8ou", false).await.unwrap_err();
        assert!(err.to_string().contains("Failed to download"));
    }

    #[tokio::test]
    async fn test_update_unknown_alias() {
        let (_dir, config) = seeded_config();
        let err = update(config, Some("gen10".to_string()), false, false).await.unwrap_err();
        assert!(err.to_string().contains("Unknown format or alias"));
    }

    #[test]
    fn test_check_interval() {
        assert_eq!(check_interval(0), Duration::from_secs(60));
        assert_eq!(check_interval(10), Duration::from_secs(600));
        assert_eq!(check_interval(u64::MAX), Duration::from_secs(u64::MAX));
    }
}

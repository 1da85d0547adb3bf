//! Plain-text rendering for command output.
//!
//! Every function returns a `String` so the layout can be unit tested;
//! `main` decides where it goes.

use std::fmt::Write;

use randbats_core::formats::{format_info, FORMAT_ALIASES, RANDBATS_FORMATS};
use randbats_core::utils::{format_percent, title_case, truncate_string};
use randbats_core::{CacheInfo, PokemonMatch, RandomSet, SearchResults, StatsSummary, UpdateReport};
use serde_json::Value;

/// Pokemon names per row in `list` output
const LIST_CHUNK_SIZE: usize = 5;

/// Widest alias format list shown before truncating
const MAX_ALIAS_WIDTH: usize = 70;

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(", "),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn push_fields(out: &mut String, object: &serde_json::Map<String, Value>, indent: usize) {
    let pad = " ".repeat(indent);
    for (key, value) in object {
        match value {
            Value::Object(nested) => {
                let _ = writeln!(out, "{}{}:", pad, key);
                push_fields(out, nested, indent + 2);
            }
            _ => {
                let _ = writeln!(out, "{}{}: {}", pad, key, render_value(value));
            }
        }
    }
}

/// A random battle set, stats excluded
pub fn pokemon(found: &PokemonMatch<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", title_case(found.name), found.format);

    let set = RandomSet::from_value(found.data);
    if let Some(level) = set.level {
        let _ = writeln!(out, "  Level: {}", level);
    }

    match found.data.as_object() {
        Some(object) => {
            let mut rest = object.clone();
            rest.remove("level");
            rest.remove(randbats_core::updater::STATS_KEY);
            push_fields(&mut out, &rest, 2);
        }
        None => {
            let _ = writeln!(out, "  {}", render_value(found.data));
        }
    }
    out
}

/// Sort a probability map descending
fn ranked(probabilities: &serde_json::Map<String, Value>) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = probabilities
        .iter()
        .filter_map(|(name, p)| p.as_f64().map(|p| (name.as_str(), p)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

fn push_stats(out: &mut String, stats: &serde_json::Map<String, Value>, indent: usize) {
    let pad = " ".repeat(indent);
    for (field, value) in stats {
        let Some(entries) = value.as_object() else {
            let _ = writeln!(out, "{}{}: {}", pad, field, render_value(value));
            continue;
        };
        let probabilities = ranked(entries);
        if probabilities.len() == entries.len() {
            let _ = writeln!(out, "{}{}:", pad, title_case(field));
            for (name, p) in probabilities {
                let _ = writeln!(out, "{}  {:<24} {:>6}", pad, name, format_percent(p));
            }
        } else {
            // Nested groups, e.g. roles -> moves
            let _ = writeln!(out, "{}{}:", pad, title_case(field));
            for (group, inner) in entries {
                let _ = writeln!(out, "{}  {}:", pad, group);
                if let Some(inner) = inner.as_object() {
                    push_stats(out, inner, indent + 4);
                }
            }
        }
    }
}

pub fn stats(name: &str, format: &str, stats: &Value) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} stats ({})", title_case(name), format);
    match stats.as_object() {
        Some(object) => push_stats(&mut out, object, 2),
        None => {
            let _ = writeln!(out, "  {}", render_value(stats));
        }
    }
    out
}

pub fn stats_summary(summary: &StatsSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Format:             {}", summary.format);
    let _ = writeln!(out, "Total Pokemon:      {}", summary.total_pokemon);
    let _ = writeln!(out, "Pokemon with stats: {}", summary.pokemon_with_stats);
    if !summary.field_coverage.is_empty() {
        let _ = writeln!(out, "Field coverage:");
        for (field, count) in &summary.field_coverage {
            let _ = writeln!(
                out,
                "  {:<16} {}/{} ({:.1}%)",
                field,
                count,
                summary.total_pokemon,
                summary.coverage_percent(field)
            );
        }
    }
    out
}

pub fn smogon_sets(name: &str, format: &str, sets: &Value) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} sets ({})", title_case(name), format);
    match sets.as_object() {
        Some(sets) => {
            for (set_name, set) in sets {
                let _ = writeln!(out, "\n  {}:", set_name);
                if let Some(fields) = set.as_object() {
                    push_fields(&mut out, fields, 4);
                }
            }
        }
        None => {
            let _ = writeln!(out, "  {}", render_value(sets));
        }
    }
    out
}

pub fn pokemon_list(format: &str, names: &[&str]) -> String {
    if names.is_empty() {
        return format!("No Pokemon found in {}\n", format);
    }
    let mut out = String::new();
    let _ = writeln!(out, "Pokemon in {}", format);
    for chunk in names.chunks(LIST_CHUNK_SIZE) {
        let _ = writeln!(out, "  {}", chunk.join(", "));
    }
    let _ = writeln!(out, "Total: {} Pokemon", names.len());
    out
}

pub fn cache_info(info: &CacheInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cache Directory: {}", info.cache_dir.display());
    let _ = writeln!(out, "Loaded Formats:  {}", info.loaded_formats.len());
    let _ = writeln!(out, "Smogon Formats:  {}", info.smogon_formats.len());
    let _ = writeln!(out, "Total Pokemon:   {}", info.total_pokemon);
    let _ = writeln!(
        out,
        "Last Update:     {} ({})",
        info.last_update.as_deref().unwrap_or("never"),
        info.age
    );
    let _ = writeln!(out, "Status:          {}", if info.stale { "stale" } else { "fresh" });

    if !info.format_counts.is_empty() {
        let _ = writeln!(out, "\n{:<28} {:>8}", "Format", "Pokemon");
        for (format, count) in &info.format_counts {
            let _ = writeln!(out, "{:<28} {:>8}", format, count);
        }
    }
    out
}

pub fn formats_table() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<26} {:<4} {:<8} Description", "Format", "Gen", "Type");
    for format in RANDBATS_FORMATS {
        if let Some(info) = format_info(format) {
            let generation = info
                .generation
                .map(|g| g.to_string())
                .unwrap_or_else(|| "?".to_string());
            let _ = writeln!(
                out,
                "{:<26} {:<4} {:<8} {}",
                info.name,
                generation,
                info.battle_type.as_str(),
                info.description
            );
        }
    }

    let _ = writeln!(out, "\n{:<10} Formats", "Alias");
    for (alias, formats) in FORMAT_ALIASES {
        // Too long to be useful
        if *alias == "all" {
            continue;
        }
        let _ = writeln!(out, "{:<10} {}", alias, truncate_string(&formats.join(", "), MAX_ALIAS_WIDTH));
    }
    out
}

pub fn update_report(report: &UpdateReport) -> String {
    let mut out = String::new();
    if report.updated.is_empty() && report.failed.is_empty() {
        let _ = writeln!(out, "No updates needed");
    }
    if !report.updated.is_empty() {
        let _ = writeln!(
            out,
            "Updated {} formats: {}",
            report.updated.len(),
            report.updated.join(", ")
        );
    }
    if !report.unchanged.is_empty() {
        let _ = writeln!(out, "Unchanged: {}", report.unchanged.len());
    }
    for (format, error) in &report.failed {
        let _ = writeln!(out, "Failed {}: {}", format, error);
    }
    out
}

pub fn search_results(name: &str, results: &SearchResults<'_>) -> String {
    if results.is_empty() {
        return format!("'{}' not found in any loaded format\n", name);
    }
    let mut out = String::new();
    if !results.randbats.is_empty() {
        let _ = writeln!(out, "Random battle:");
        for found in &results.randbats {
            let set = RandomSet::from_value(found.data);
            match set.level {
                Some(level) => {
                    let _ = writeln!(out, "  {:<26} level {}", found.format, level);
                }
                None => {
                    let _ = writeln!(out, "  {}", found.format);
                }
            }
        }
    }
    if !results.smogon.is_empty() {
        let _ = writeln!(out, "Smogon:");
        for found in &results.smogon {
            let count = found.data.as_object().map(|sets| sets.len()).unwrap_or(0);
            let _ = writeln!(out, "  {:<26} {} sets", found.format, count);
        }
    }
    out
}

//! Battle format catalog.
//!
//! Random battle formats are the primary data set. Smogon competitive tiers
//! are a secondary source of hand-written sets. Alias groups let callers ask
//! for "modern" or "doubles" instead of spelling out every format.

use serde::Serialize;

/// Random battle formats published by the randbats data repository.
pub const RANDBATS_FORMATS: &[&str] = &[
    "gen1randombattle",
    "gen2randombattle",
    "gen3randombattle",
    "gen4randombattle",
    "gen5randombattle",
    "gen6randombattle",
    "gen7letsgorandombattle",
    "gen7randombattle",
    "gen8bdsprandombattle",
    "gen8randombattle",
    "gen8randomdoublesbattle",
    "gen9babyrandombattle",
    "gen9randombattle",
    "gen9randomdoublesbattle",
];

/// Competitive tiers that have Smogon set files.
pub const SMOGON_FORMATS: &[&str] = &[
    "gen9ou", "gen9uu", "gen9ru", "gen9nu", "gen9pu", "gen9ubers", "gen9doublesou", "gen9vgc2024",
    "gen8ou", "gen8uu", "gen8ru", "gen8nu", "gen8pu", "gen8ubers", "gen8doublesou", "gen8vgc2022",
    "gen8vgc2023",
    "gen7ou", "gen7uu", "gen7ru", "gen7nu", "gen7pu", "gen7ubers", "gen7doublesou", "gen7vgc2017",
    "gen7vgc2018", "gen7vgc2019",
    "gen6ou", "gen6uu", "gen6ru", "gen6nu", "gen6pu", "gen6ubers", "gen6doublesou", "gen6vgc2014",
    "gen6vgc2015", "gen6vgc2016",
    "gen5ou", "gen5uu", "gen5ru", "gen5nu", "gen5pu", "gen5ubers", "gen5doublesou", "gen5vgc2011",
    "gen5vgc2012", "gen5vgc2013",
    "gen4ou", "gen4uu", "gen4nu", "gen4pu", "gen4ubers", "gen4doublesou", "gen4vgc2009",
    "gen4vgc2010",
    "gen3ou", "gen3uu", "gen3nu", "gen3pu", "gen3ubers", "gen3doublesou",
    "gen2ou", "gen2uu", "gen2nu", "gen2pu", "gen2ubers", "gen2doublesou",
    "gen1ou", "gen1uu", "gen1nu", "gen1pu", "gen1ubers", "gen1doublesou",
];

/// Formats tried, in order, when a lookup does not name a format.
pub const PREFERRED_FORMATS: &[&str] = &["gen9randombattle", "gen8randombattle", "gen7randombattle"];

/// Named groups of random battle formats.
pub const FORMAT_ALIASES: &[(&str, &[&str])] = &[
    ("gen1", &["gen1randombattle"]),
    ("gen2", &["gen2randombattle"]),
    ("gen3", &["gen3randombattle"]),
    ("gen4", &["gen4randombattle"]),
    ("gen5", &["gen5randombattle"]),
    ("gen6", &["gen6randombattle"]),
    ("gen7", &["gen7randombattle"]),
    ("gen8", &["gen8randombattle"]),
    ("gen9", &["gen9randombattle"]),
    (
        "classic",
        &["gen1randombattle", "gen2randombattle", "gen3randombattle", "gen4randombattle"],
    ),
    ("modern", &["gen8randombattle", "gen9randombattle"]),
    ("doubles", &["gen8randomdoublesbattle", "gen9randomdoublesbattle"]),
    ("letsgo", &["gen7letsgorandombattle"]),
    ("bdsp", &["gen8bdsprandombattle"]),
    ("baby", &["gen9babyrandombattle"]),
    ("all", RANDBATS_FORMATS),
];

pub fn is_randbats_format(name: &str) -> bool {
    RANDBATS_FORMATS.contains(&name)
}

pub fn is_smogon_format(name: &str) -> bool {
    SMOGON_FORMATS.contains(&name)
}

/// Look up an alias group by name.
pub fn alias(name: &str) -> Option<&'static [&'static str]> {
    FORMAT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, formats)| *formats)
}

/// Expand aliases into concrete random battle format names.
///
/// Unknown names are dropped. Duplicates are removed, keeping the first
/// occurrence so the caller's ordering is preserved.
pub fn resolve_formats<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::new();
    let mut push = |format: &str| {
        if !resolved.iter().any(|f| f == format) {
            resolved.push(format.to_string());
        }
    };

    for name in names {
        let name = name.as_ref().trim().to_lowercase();
        if let Some(group) = alias(&name) {
            group.iter().for_each(|f| push(f));
        } else if is_randbats_format(&name) {
            push(&name);
        }
    }
    resolved
}

/// Keep only known Smogon tiers, deduplicated.
pub fn resolve_smogon_formats<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim().to_lowercase();
        if is_smogon_format(&name) && !resolved.contains(&name) {
            resolved.push(name);
        }
    }
    resolved
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleType {
    Singles,
    Doubles,
    LetsGo,
    Bdsp,
    Baby,
}

impl BattleType {
    pub fn from_format(name: &str) -> Self {
        if name.contains("doubles") {
            BattleType::Doubles
        } else if name.contains("letsgo") {
            BattleType::LetsGo
        } else if name.contains("bdsp") {
            BattleType::Bdsp
        } else if name.contains("baby") {
            BattleType::Baby
        } else {
            BattleType::Singles
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BattleType::Singles => "singles",
            BattleType::Doubles => "doubles",
            BattleType::LetsGo => "letsgo",
            BattleType::Bdsp => "bdsp",
            BattleType::Baby => "baby",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatInfo {
    pub name: String,
    pub generation: Option<u8>,
    pub battle_type: BattleType,
    pub description: String,
}

/// Extract the generation digit from a name like `gen7randombattle`.
pub fn generation(name: &str) -> Option<u8> {
    let rest = name.strip_prefix("gen")?;
    rest.chars().next()?.to_digit(10).map(|d| d as u8)
}

/// Describe a random battle format. Returns `None` for unknown names.
pub fn format_info(name: &str) -> Option<FormatInfo> {
    if !is_randbats_format(name) {
        return None;
    }

    let generation = generation(name);
    let battle_type = BattleType::from_format(name);
    let description = match battle_type {
        BattleType::Doubles => "Double battle format".to_string(),
        BattleType::LetsGo => "Let's Go format".to_string(),
        BattleType::Bdsp => "Brilliant Diamond/Shining Pearl format".to_string(),
        BattleType::Baby => "Baby Pokemon format".to_string(),
        BattleType::Singles => match generation {
            Some(number) => format!("Generation {} random battle", number),
            None => "Random battle".to_string(),
        },
    };

    Some(FormatInfo {
        name: name.to_string(),
        generation,
        battle_type,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_formats_expands_aliases() {
        let resolved = resolve_formats(&["modern"]);
        assert_eq!(resolved, vec!["gen8randombattle", "gen9randombattle"]);
    }

    #[test]
    fn test_resolve_formats_dedupes_in_order() {
        let resolved = resolve_formats(&["gen9randombattle", "modern", "GEN1"]);
        assert_eq!(
            resolved,
            vec!["gen9randombattle", "gen8randombattle", "gen1randombattle"]
        );
    }

    #[test]
    fn test_resolve_formats_drops_unknown() {
        let resolved = resolve_formats(&["gen10randombattle", "gen9ou", "baby"]);
        assert_eq!(resolved, vec!["gen9babyrandombattle"]);
    }

    #[test]
    fn test_resolve_all() {
        assert_eq!(resolve_formats(&["all"]).len(), RANDBATS_FORMATS.len());
    }

    #[test]
    fn test_resolve_smogon_formats() {
        let resolved = resolve_smogon_formats(&["gen9ou", "gen9ou", "gen9randombattle"]);
        assert_eq!(resolved, vec!["gen9ou"]);
    }

    #[test]
    fn test_format_info() {
        let info = format_info("gen8randomdoublesbattle").unwrap();
        assert_eq!(info.generation, Some(8));
        assert_eq!(info.battle_type, BattleType::Doubles);
        assert_eq!(info.description, "Double battle format");

        let info = format_info("gen3randombattle").unwrap();
        assert_eq!(info.battle_type, BattleType::Singles);
        assert_eq!(info.description, "Generation 3 random battle");

        assert!(format_info("gen9ou").is_none());
    }

    #[test]
    fn test_generation() {
        assert_eq!(generation("gen7letsgorandombattle"), Some(7));
        assert_eq!(generation("randombattle"), None);
    }
}

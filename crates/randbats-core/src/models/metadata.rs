use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version information for a cached format file.
///
/// Mirrors the GitHub contents API entry for the upstream file. The `sha` is
/// the git blob hash, so an unchanged sha means the file didn't change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatMetadata {
    pub name: String,
    #[serde(default)]
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_url: Option<String>,
    /// Set locally when the file was written to the cache.
    #[serde(default)]
    pub downloaded_at: Option<DateTime<Utc>>,
}

impl FormatMetadata {
    pub fn same_version(&self, other: &FormatMetadata) -> bool {
        !self.sha.is_empty() && self.sha == other.sha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(sha: &str) -> FormatMetadata {
        FormatMetadata {
            name: "gen9randombattle.json".to_string(),
            path: "data/gen9randombattle.json".to_string(),
            sha: sha.to_string(),
            size: 10,
            download_url: None,
            downloaded_at: None,
        }
    }

    #[test]
    fn test_same_version() {
        assert!(meta("abc").same_version(&meta("abc")));
        assert!(!meta("abc").same_version(&meta("def")));
        assert!(!meta("").same_version(&meta("")));
    }

    #[test]
    fn test_parses_github_contents_entry() {
        let raw = r#"{
            "name": "gen9randombattle.json",
            "path": "data/gen9randombattle.json",
            "sha": "3f2a",
            "size": 123456,
            "url": "https://api.github.com/repos/pkmn/randbats/contents/data/gen9randombattle.json",
            "download_url": "https://raw.githubusercontent.com/pkmn/randbats/main/data/gen9randombattle.json",
            "type": "file"
        }"#;
        let parsed: FormatMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.sha, "3f2a");
        assert_eq!(parsed.size, 123456);
        assert!(parsed.downloaded_at.is_none());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One format's data file: Pokemon name -> set JSON.
pub type FormatData = Map<String, Value>;

/// Typed view over a random battle set entry.
///
/// The upstream files change shape between generations (gen9 uses `roles`,
/// older gens list `moves` directly), so every field is optional and anything
/// we don't model is kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RandomSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub abilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moves: Vec<String>,
    #[serde(default, rename = "teraTypes", skip_serializing_if = "Vec::is_empty")]
    pub tera_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub roles: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RandomSet {
    /// Interpret a raw set entry. Entries that aren't objects yield an empty view.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Every move across all roles, deduplicated, in first-seen order.
    pub fn all_moves(&self) -> Vec<String> {
        let mut moves: Vec<String> = self.moves.clone();
        for role in self.roles.values() {
            if let Some(role_moves) = role.get("moves").and_then(Value::as_array) {
                for m in role_moves.iter().filter_map(Value::as_str) {
                    if !moves.iter().any(|existing| existing == m) {
                        moves.push(m.to_string());
                    }
                }
            }
        }
        moves
    }

    pub fn role_names(&self) -> Vec<&str> {
        self.roles.keys().map(String::as_str).collect()
    }
}

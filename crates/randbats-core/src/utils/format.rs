/// Normalize a Pokemon name for comparison.
/// Lowercases and drops everything that isn't alphanumeric: "Mr. Mime" -> "mrmime"
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Format an age in minutes for display ("just now", "5m ago", "2h ago", "3d ago").
/// Hours and days round to the nearest unit.
pub fn format_age(minutes: i64) -> String {
    match minutes {
        // Negative ages come from clock skew
        m if m < 1 => "just now".to_string(),
        m if m < 60 => format!("{}m ago", m),
        m if m < 24 * 60 => format!("{}h ago", div_round(m, 60)),
        m => format!("{}d ago", div_round(m, 24 * 60)),
    }
}

fn div_round(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

/// Format a probability in [0, 1] as a percentage with one decimal
pub fn format_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Uppercase the first letter of each dash/space separated word
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c == ' ' || c == '-';
    }
    out
}

/// Cut `s` to at most `max_len` characters, ending in "..." when there is room
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    match max_len.checked_sub(3) {
        Some(keep) if keep > 0 => s.chars().take(keep).chain("...".chars()).collect(),
        _ => s.chars().take(max_len).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Pikachu"), "pikachu");
        assert_eq!(normalize_name("Pikachu-EX"), "pikachuex");
        assert_eq!(normalize_name("Mr. Mime"), "mrmime");
        assert_eq!(normalize_name("Ho-Oh"), "hooh");
        assert_eq!(normalize_name("Farfetch’d"), "farfetchd");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(-5), "just now");
        assert_eq!(format_age(0), "just now");
        assert_eq!(format_age(5), "5m ago");
        assert_eq!(format_age(89), "1h ago");
        assert_eq!(format_age(90), "2h ago");
        assert_eq!(format_age(1440 * 3), "3d ago");
        assert_eq!(format_age(1440 + 12 * 60), "2d ago");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.25), "25.0%");
        assert_eq!(format_percent(1.0), "100.0%");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("pikachu"), "Pikachu");
        assert_eq!(title_case("ho-oh"), "Ho-Oh");
        assert_eq!(title_case("mr. mime"), "Mr. Mime");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("gen9ou", 10), "gen9ou");
        assert_eq!(truncate_string("gen8randombattle", 8), "gen8r...");
        assert_eq!(truncate_string("gen1", 3), "gen");
    }
}

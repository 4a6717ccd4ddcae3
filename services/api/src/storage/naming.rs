//! services/api/src/storage/naming.rs
//!
//! Derives filesystem-safe, timestamped folder names from project names.

use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::LazyLock;

/// Longest allowed cleaned name, in characters, before the timestamp suffix.
pub const MAX_NAME_CHARS: usize = 50;

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex is valid"));

/// Strips characters that are illegal in paths, turns whitespace runs into a
/// single `_` and truncates to `MAX_NAME_CHARS`.
pub fn clean_project_name(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();
    let collapsed = WHITESPACE_RUN.replace_all(stripped.trim(), "_");
    let truncated: String = collapsed.chars().take(MAX_NAME_CHARS).collect();

    if truncated.is_empty() {
        "project".to_string()
    } else {
        truncated
    }
}

/// `<cleaned-name>_<YYYY-MM-DD_HH-MM-SS>` for the current local time.
///
/// Two calls within the same second for the same name produce the same result.
pub fn folder_name_for(project_name: &str) -> String {
    folder_name_at(project_name, Local::now())
}

pub fn folder_name_at(project_name: &str, at: DateTime<Local>) -> String {
    format!(
        "{}_{}",
        clean_project_name(project_name),
        at.format("%Y-%m-%d_%H-%M-%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_forbidden_characters_are_removed() {
        let cleaned = clean_project_name(r#"My <Cool> "App": v1/2\3|4?5*"#);
        assert!(!cleaned.chars().any(|c| FORBIDDEN.contains(&c)));
        assert_eq!(cleaned, "My_Cool_App_v12345");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(clean_project_name("  Test \t\n  App  "), "Test_App");
    }

    #[test]
    fn test_long_names_are_truncated() {
        let long = "a".repeat(120);
        assert_eq!(clean_project_name(&long).chars().count(), MAX_NAME_CHARS);

        let unicode = "é".repeat(80);
        assert_eq!(clean_project_name(&unicode).chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_empty_name_falls_back() {
        assert_eq!(clean_project_name("???"), "project");
        assert_eq!(clean_project_name(""), "project");
    }

    #[test]
    fn test_folder_name_has_path_safe_timestamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(folder_name_at("Test App", at), "Test_App_2024-03-09_14-05-07");
    }

    #[test]
    fn test_folder_name_prefix_never_exceeds_limit() {
        let at = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let name = folder_name_at(&"x y ".repeat(40), at);
        let (prefix, _) = name.rsplit_once("_2024-01-01").unwrap();
        assert!(prefix.chars().count() <= MAX_NAME_CHARS);
    }
}

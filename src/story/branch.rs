use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PvError, PvResult};

pub const BRANCH_MARKER: &str = "-pv-";

fn story_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // The digits must end the name; the greedy prefix makes the last marker win.
    PATTERN.get_or_init(|| Regex::new(r"^.*-pv-([0-9]+)$").expect("branch pattern is valid"))
}

/// Extract the story id from a branch named `<anything>-pv-<digits>`.
pub fn parse_story_id(branch: &str) -> Option<u64> {
    let captures = story_id_pattern().captures(branch)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Collapse whitespace runs into `-`; a blank name is rejected.
pub fn normalize_branch_name(requested: &str) -> PvResult<String> {
    let name = requested.split_whitespace().collect::<Vec<_>>().join("-");
    if name.is_empty() {
        return Err(PvError::InvalidInput("branch name is required".to_string()));
    }
    Ok(name)
}

pub fn branch_name_for(requested: &str, story_id: u64) -> PvResult<String> {
    let name = normalize_branch_name(requested)?;
    Ok(format!("{name}{BRANCH_MARKER}{story_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_story_id() {
        assert_eq!(parse_story_id("feature-login-pv-4821"), Some(4821));
        assert_eq!(parse_story_id("add-login-pv-99"), Some(99));
        assert_eq!(parse_story_id("-pv-1"), Some(1));
    }

    #[test]
    fn last_marker_wins() {
        assert_eq!(parse_story_id("x-pv-12-pv-7"), Some(7));
        assert_eq!(parse_story_id("a-pv-1-b-pv-22"), Some(22));
    }

    #[test]
    fn marker_must_be_the_suffix() {
        assert_eq!(parse_story_id("a-pv-1-b-pv-22-c"), None);
        assert_eq!(parse_story_id("feature-pv-12abc"), None);
        assert_eq!(parse_story_id("login-pv-12-fix"), None);
        assert_eq!(parse_story_id("login-pv-12\n"), None);
    }

    #[test]
    fn branches_without_marker_have_no_id() {
        assert_eq!(parse_story_id("main"), None);
        assert_eq!(parse_story_id(""), None);
        assert_eq!(parse_story_id("feature-pv-"), None);
        assert_eq!(parse_story_id("feature-pv-abc"), None);
        assert_eq!(parse_story_id("pv-12"), None);
    }

    #[test]
    fn marker_is_case_sensitive() {
        assert_eq!(parse_story_id("login-PV-12"), None);
        assert_eq!(parse_story_id("login-Pv-12"), None);
    }

    #[test]
    fn digits_only_no_sign() {
        assert_eq!(parse_story_id("login-pv--12"), None);
        assert_eq!(parse_story_id("login-pv-+12"), None);
        assert_eq!(parse_story_id("login-pv-0042"), Some(42));
    }

    #[test]
    fn overflowing_id_is_not_a_match() {
        assert_eq!(parse_story_id("login-pv-99999999999999999999999"), None);
    }

    #[test]
    fn branch_name_for_appends_marker() {
        assert_eq!(branch_name_for("add-login", 99).unwrap(), "add-login-pv-99");
        assert_eq!(branch_name_for(" fix  the bug ", 5).unwrap(), "fix-the-bug-pv-5");
        assert!(branch_name_for("   ", 5).is_err());
    }

    #[test]
    fn generated_names_parse_back() {
        let name = branch_name_for("release-pv-3 prep", 812).unwrap();
        assert_eq!(parse_story_id(&name), Some(812));
    }
}

//! Problem reference extraction
//!
//! Finds the first contest problem URL embedded anywhere in a source
//! document (usually in a comment) and derives the contest id and problem
//! letter from its path.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::common::LocatorError;

/// Identifies a single problem on the contest site
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProblemLocator {
    pub contest_id: String,
    pub problem_letter: String,
    pub canonical_url: String,
}

impl ProblemLocator {
    /// Key used by the sample cache and the in-flight map
    ///
    /// Both URL shapes carry the numeric contest number, so `contest/4/problem/A`
    /// and `problemset/problem/4/A` share a key while `problemset/problem/5/A`
    /// does not.
    pub fn cache_key(&self) -> (String, String) {
        let number = self
            .canonical_url
            .split('/')
            .rev()
            .skip(1)
            .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(self.contest_id.as_str());
        (number.to_string(), self.problem_letter.to_ascii_uppercase())
    }

    /// `problemset` URLs yield a non-numeric contest id, which is shown as unknown
    pub fn has_numeric_contest(&self) -> bool {
        !self.contest_id.is_empty() && self.contest_id.chars().all(|c| c.is_ascii_digit())
    }
}

fn problem_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)https?://([a-z0-9.-]+)/(?:contest/\d+/problem|problemset/problem/\d+)/[a-z]\d*\b",
        )
        .expect("problem URL pattern is valid")
    })
}

/// Extract the first problem locator from `text`, accepting only URLs on `site`
pub fn extract_locator(text: &str, site: &str) -> Result<ProblemLocator, LocatorError> {
    let captures = problem_url_regex()
        .captures(text)
        .ok_or(LocatorError::NotFound)?;

    let url = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
    let host = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

    if !host_matches(host, site) {
        return Err(LocatorError::InvalidDomain(host.to_string()));
    }

    // Positional: third-from-last and last path segments
    let segments: Vec<&str> = url.split('/').collect();
    let contest_id = segments[segments.len() - 3].to_string();
    let problem_letter = segments[segments.len() - 1].to_string();

    Ok(ProblemLocator {
        contest_id,
        problem_letter,
        canonical_url: url.to_string(),
    })
}

fn host_matches(host: &str, site: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let site = site.to_ascii_lowercase();
    host == site || host.strip_prefix("www.") == Some(site.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "codeforces.com";

    #[test]
    fn test_contest_url() {
        let text = "#include <bits/stdc++.h>\n// https://codeforces.com/contest/1/problem/A\nint main() {}\n";
        let locator = extract_locator(text, SITE).unwrap();

        assert_eq!(locator.contest_id, "1");
        assert_eq!(locator.problem_letter, "A");
        assert_eq!(
            locator.canonical_url,
            "https://codeforces.com/contest/1/problem/A"
        );
        assert!(locator.has_numeric_contest());
    }

    #[test]
    fn test_problem_letter_with_digits() {
        let text = "// problem: https://codeforces.com/contest/1850/problem/F2";
        let locator = extract_locator(text, SITE).unwrap();

        assert_eq!(locator.contest_id, "1850");
        assert_eq!(locator.problem_letter, "F2");
    }

    #[test]
    fn test_problemset_url_yields_unknown_contest() {
        let text = "# https://codeforces.com/problemset/problem/4/A";
        let locator = extract_locator(text, SITE).unwrap();

        assert_eq!(locator.contest_id, "problem");
        assert_eq!(locator.problem_letter, "A");
        assert!(!locator.has_numeric_contest());
    }

    #[test]
    fn test_cache_key_uses_contest_number() {
        let key = |text: &str| extract_locator(text, SITE).unwrap().cache_key();

        let four = key("# https://codeforces.com/problemset/problem/4/A");
        let five = key("# https://codeforces.com/problemset/problem/5/A");
        assert_eq!(four, ("4".to_string(), "A".to_string()));
        assert_ne!(four, five);
        assert_eq!(four, key("// https://codeforces.com/contest/4/problem/a"));
    }

    #[test]
    fn test_first_match_wins() {
        let text = "// https://codeforces.com/contest/7/problem/B\n// https://codeforces.com/contest/9/problem/C\n";
        let locator = extract_locator(text, SITE).unwrap();

        assert_eq!(locator.contest_id, "7");
        assert_eq!(locator.problem_letter, "B");
    }

    #[test]
    fn test_trailing_query_is_not_part_of_url() {
        let text = "// https://codeforces.com/contest/12/problem/D?locale=en";
        let locator = extract_locator(text, SITE).unwrap();

        assert_eq!(locator.problem_letter, "D");
        assert_eq!(
            locator.canonical_url,
            "https://codeforces.com/contest/12/problem/D"
        );
    }

    #[test]
    fn test_www_host_accepted() {
        let text = "// https://www.codeforces.com/contest/3/problem/A";
        assert!(extract_locator(text, SITE).is_ok());
    }

    #[test]
    fn test_not_found() {
        assert_eq!(
            extract_locator("int main() { return 0; }", SITE),
            Err(LocatorError::NotFound)
        );
        assert_eq!(
            extract_locator("// https://codeforces.com/blog/entry/1", SITE),
            Err(LocatorError::NotFound)
        );
    }

    #[test]
    fn test_invalid_domain() {
        let text = "// https://example.com/contest/1/problem/A";
        assert_eq!(
            extract_locator(text, SITE),
            Err(LocatorError::InvalidDomain("example.com".to_string()))
        );
    }
}

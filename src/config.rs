//! Runtime configuration
//!
//! Loaded from environment variables (a `.env` file is honoured by `main`),
//! then overridden by command line flags.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_SITE: &str = "codeforces.com";
pub const DEFAULT_BROWSER: &str = "chromium";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host the problem URLs must belong to
    pub site: String,
    /// Headless browser executable used for scraping
    pub browser: String,
    /// Client identity presented to the contest site
    pub user_agent: String,
    /// Sample cache time-to-live (default: 2 hours)
    pub cache_ttl: Duration,
    /// Wall-clock limit for running the solution (default: 10s)
    pub run_timeout: Duration,
    /// Wall-clock limit for the compile step (default: 30s)
    pub compile_timeout: Duration,
    /// Deadline for page navigation and extraction (default: 30s)
    pub navigation_timeout: Duration,
    /// Scope temp file names with a run-unique token
    pub isolate_runs: bool,
    /// Optional user language table merged over the built-in one
    pub languages_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            browser: DEFAULT_BROWSER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_ttl: Duration::from_secs(2 * 60 * 60),
            run_timeout: Duration::from_millis(10_000),
            compile_timeout: Duration::from_millis(30_000),
            navigation_timeout: Duration::from_millis(30_000),
            isolate_runs: false,
            languages_path: None,
        }
    }
}

impl AppConfig {
    /// Build configuration from `CP_BUDDY_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let millis = |key: &str, default: Duration| -> Duration {
            match lookup(key) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(ms) => Duration::from_millis(ms),
                    Err(_) => {
                        warn!("Ignoring invalid {}={}", key, raw);
                        default
                    }
                },
                None => default,
            }
        };

        let cache_ttl = match lookup("CP_BUDDY_CACHE_TTL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!("Ignoring invalid CP_BUDDY_CACHE_TTL_SECS={}", raw);
                    defaults.cache_ttl
                }
            },
            None => defaults.cache_ttl,
        };

        Self {
            site: lookup("CP_BUDDY_SITE").unwrap_or(defaults.site),
            browser: lookup("CP_BUDDY_BROWSER").unwrap_or(defaults.browser),
            user_agent: lookup("CP_BUDDY_USER_AGENT").unwrap_or(defaults.user_agent),
            cache_ttl,
            run_timeout: millis("CP_BUDDY_RUN_TIMEOUT_MS", defaults.run_timeout),
            compile_timeout: millis("CP_BUDDY_COMPILE_TIMEOUT_MS", defaults.compile_timeout),
            navigation_timeout: millis(
                "CP_BUDDY_NAVIGATION_TIMEOUT_MS",
                defaults.navigation_timeout,
            ),
            isolate_runs: lookup("CP_BUDDY_ISOLATE_RUNS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.isolate_runs),
            languages_path: lookup("CP_BUDDY_LANGUAGES").map(PathBuf::from),
        }
    }
}

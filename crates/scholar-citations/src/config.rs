//! Run configuration: pacing, timeouts, and browser launch settings.
//!
//! Defaults mirror the timings the profile site tolerates. Browser settings
//! can be overridden through `SCHOLAR_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Everything a pipeline run needs besides the request itself.
#[derive(Debug, Clone, Default)]
pub struct ScrapeConfig {
    pub pagination: PaginationConfig,
    pub fetch: FetchConfig,
    pub browser: BrowserConfig,
}

impl ScrapeConfig {
    /// Defaults with browser settings read from the environment.
    pub fn from_env() -> Self {
        Self {
            browser: BrowserConfig::from_env(),
            ..Self::default()
        }
    }
}

/// Profile loading and "show more" pagination.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// How long to wait for the profile header before giving up.
    pub profile_timeout: Duration,
    /// Scroll steps performed before paginating, to trigger lazy rows.
    pub scroll_steps: u32,
    pub scroll_amount: i64,
    pub scroll_pause: Duration,
    /// Per-attempt wait for the show-more control.
    pub control_wait: Duration,
    pub pre_click_pause: Duration,
    /// Time given to new rows to render after a click.
    pub post_click_settle: Duration,
    /// Upper bound on show-more activations.
    pub max_clicks: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            profile_timeout: Duration::from_secs(30),
            scroll_steps: 10,
            scroll_amount: 300,
            scroll_pause: Duration::from_millis(500),
            control_wait: Duration::from_secs(5),
            pre_click_pause: Duration::from_millis(500),
            post_click_settle: Duration::from_secs(2),
            max_clicks: 100,
        }
    }
}

/// Per-article detail page fetching.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Wait for the citation marker on each article page.
    pub article_timeout: Duration,
    /// Pause after each successfully fetched article.
    pub inter_article_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            article_timeout: Duration::from_secs(10),
            inter_article_delay: Duration::from_secs(1),
        }
    }
}

/// Chromium launch settings.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Explicit browser binary; `None` lets the driver pick its default.
    pub chromium_path: Option<PathBuf>,
    pub headful: bool,
    pub no_sandbox: bool,
    /// Upper bound on a single protocol request, navigation included.
    pub request_timeout: Duration,
    /// Polling interval used while waiting for selectors.
    pub poll_interval: Duration,
    /// How long teardown waits for the browser process to exit.
    pub close_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chromium_path: None,
            headful: false,
            no_sandbox: true,
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(250),
            close_timeout: Duration::from_secs(10),
        }
    }
}

impl BrowserConfig {
    /// Read `SCHOLAR_CHROMIUM_PATH`, `SCHOLAR_HEADFUL` and
    /// `SCHOLAR_CHROMIUM_SANDBOX`.
    pub fn from_env() -> Self {
        Self {
            chromium_path: find_chromium(),
            headful: env_flag("SCHOLAR_HEADFUL"),
            no_sandbox: !env_flag("SCHOLAR_CHROMIUM_SANDBOX"),
            ..Self::default()
        }
    }
}

/// Locate a Chromium binary: `SCHOLAR_CHROMIUM_PATH` first, then `PATH`.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("SCHOLAR_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    ["google-chrome", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| !matches!(v.trim(), "" | "0" | "false"))
        .unwrap_or(false)
}

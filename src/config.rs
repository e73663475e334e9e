//! Robot configuration: site selectors, timeouts, retry window and output layout.
//!
//! Every field has a default matching the live site, so the robot runs with
//! no config file at all. A YAML file passed with `--config` overrides only
//! the keys it names:
//!
//! ```yaml
//! slow_mo_ms: 250
//! retry:
//!   max_attempts: 5
//! output:
//!   dir: /tmp/news
//! ```

use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// CSS selectors describing the site's DOM shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub search_button: String,
    pub search_input: String,
    pub search_submit: String,
    pub sort_select: String,
    /// One result card.
    pub result_item: String,
    /// The following are relative to a result card.
    pub title: String,
    pub description: String,
    pub timestamp: String,
    pub image: String,
    /// Pagination links; the one whose text contains `next_text` is followed.
    pub next_page: String,
    pub next_text: String,
    /// The image element on a standalone image page.
    pub image_element: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            search_button: "[data-element='search-button']".to_string(),
            search_input: "[data-element='search-form-input']".to_string(),
            search_submit: "[type='submit']".to_string(),
            sort_select: "select[name='s']".to_string(),
            result_item: "li ps-promo".to_string(),
            title: ".promo-title a".to_string(),
            description: ".promo-description".to_string(),
            timestamp: ".promo-timestamp".to_string(),
            image: ".image".to_string(),
            next_page: "a[rel='nofollow']".to_string(),
            next_text: "Next".to_string(),
            image_element: "img".to_string(),
        }
    }
}

/// Retry window for transient operations, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub multiplier_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier_ms: 1_000,
            min_delay_ms: 4_000,
            max_delay_ms: 10_000,
            jitter_ms: 0,
        }
    }
}

/// Where a run writes its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    /// Relative to `dir`.
    pub images_dir: String,
    pub workbook: String,
    pub sheet: String,
    pub summary: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            images_dir: "images".to_string(),
            workbook: "news_data.xlsx".to_string(),
            sheet: "Sheet1".to_string(),
            summary: "run_summary.json".to_string(),
        }
    }
}

impl OutputSettings {
    pub fn images_path(&self) -> PathBuf {
        self.dir.join(&self.images_dir)
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.dir.join(&self.workbook)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(&self.summary)
    }
}

/// Top-level robot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub base_url: String,
    pub selectors: Selectors,
    /// Label of the sort option chosen for the `newest` category.
    pub sort_label: String,
    /// Pause before and after choosing the sort option.
    pub sort_settle_ms: u64,
    /// Bound for waiting on the search and sort controls.
    pub control_timeout_ms: u64,
    /// Bound for waiting on result cards.
    pub results_timeout_ms: u64,
    /// Delay after every browser interaction.
    pub slow_mo_ms: u64,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    /// Kill stray spreadsheet processes before and after the run.
    pub kill_spreadsheet_app: bool,
    pub retry: RetrySettings,
    pub output: OutputSettings,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.latimes.com/".to_string(),
            selectors: Selectors::default(),
            sort_label: "Newest".to_string(),
            sort_settle_ms: 5_000,
            control_timeout_ms: 20_000,
            results_timeout_ms: 10_000,
            slow_mo_ms: 500,
            headless: true,
            chrome_executable: None,
            kill_spreadsheet_app: true,
            retry: RetrySettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl RobotConfig {
    /// Parse a YAML document, filling unspecified keys with defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ScrapeError> {
        let config: RobotConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or the defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ScrapeError> {
        let Some(path) = path else {
            info!("No config file given; using built-in defaults");
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&yaml)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reject settings that cannot produce a working run.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        self.site_url()?;
        if self.retry.max_attempts == 0 {
            return Err(ScrapeError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(ScrapeError::Config(format!(
                "retry.min_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.min_delay_ms, self.retry.max_delay_ms
            )));
        }
        if self.output.workbook.trim().is_empty() || self.output.sheet.trim().is_empty() {
            return Err(ScrapeError::Config(
                "output.workbook and output.sheet must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn site_url(&self) -> Result<Url, ScrapeError> {
        Ok(Url::parse(&self.base_url)?)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_millis(self.results_timeout_ms)
    }

    pub fn sort_settle(&self) -> Duration {
        Duration::from_millis(self.sort_settle_ms)
    }

    pub fn slow_mo(&self) -> Duration {
        Duration::from_millis(self.slow_mo_ms)
    }
}

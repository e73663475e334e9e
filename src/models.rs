//! Data models for one search run and the records it extracts.
//!
//! - [`SearchContext`]: immutable per-run inputs and the derived threshold date
//! - [`NewsRecord`]: one extracted result card, ready for the workbook
//! - [`RunSummary`]: machine-readable account of how a run ended

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result ordering requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsCategory {
    /// Sort results newest-first before paginating.
    Newest,
    /// Keep the site's default relevance ordering.
    All,
}

impl NewsCategory {
    /// Interpret a category argument. Only `newest` (any case) changes
    /// behavior; every other value keeps the default ordering.
    pub fn from_arg(arg: &str) -> Self {
        if arg.trim().eq_ignore_ascii_case("newest") {
            NewsCategory::Newest
        } else {
            NewsCategory::All
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsCategory::Newest => f.write_str("newest"),
            NewsCategory::All => f.write_str("all"),
        }
    }
}

/// Per-run search configuration. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchContext {
    /// Phrase typed into the site search box.
    pub search_text: String,
    /// Requested ordering.
    pub category: NewsCategory,
    /// Lookback window in months.
    pub months: u32,
    /// Records dated before this day end collection.
    pub threshold_date: NaiveDate,
}

impl SearchContext {
    /// Build the context using today's local date.
    pub fn new(search_text: impl Into<String>, category: NewsCategory, months: u32) -> Self {
        Self::new_at(search_text, category, months, Local::now().date_naive())
    }

    /// Build the context relative to an explicit `today`.
    pub fn new_at(
        search_text: impl Into<String>,
        category: NewsCategory,
        months: u32,
        today: NaiveDate,
    ) -> Self {
        Self {
            search_text: search_text.into(),
            category,
            months,
            threshold_date: threshold_date(months, today),
        }
    }

    /// Whether a record dated `date` lies before the lookback window.
    ///
    /// Compares calendar dates, so a record dated on the threshold day itself
    /// is kept rather than compared against the current time of day.
    pub fn is_before_threshold(&self, date: NaiveDate) -> bool {
        date < self.threshold_date
    }
}

/// First day of the month containing `today - (months + 1) * 30` days.
/// The result is a date with no time of day attached.
///
/// ```ignore
/// // months = 1, today = 2024-07-18 -> 2024-05-19 -> 2024-05-01
/// assert_eq!(threshold_date(1, ymd(2024, 7, 18)), ymd(2024, 5, 1));
/// ```
pub fn threshold_date(months: u32, today: NaiveDate) -> NaiveDate {
    let back = today - Duration::days((i64::from(months) + 1) * 30);
    back.with_day(1).unwrap_or(back)
}

/// One extracted search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    /// Headline text; never empty.
    pub title: String,
    /// Teaser text; may be empty.
    pub description: String,
    /// Date as displayed by the site.
    pub raw_date: String,
    /// `raw_date` parsed into a calendar date.
    pub date: NaiveDate,
    /// File name of the thumbnail saved under the images directory.
    pub image_filename: String,
    /// Occurrences of the search text in title plus description.
    pub search_count: usize,
    /// Whether title or description mention an amount of money.
    pub contains_money: bool,
}

/// Overall outcome of a run, used for the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Collection ended at the date threshold or on the last page.
    Completed,
    /// A failure ended the run after at least one record was collected.
    Partial,
    /// A failure ended the run with nothing collected.
    Failed,
}

impl RunStatus {
    /// Process exit code for this status.
    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::Failed => 1,
            RunStatus::Partial => 2,
        }
    }
}

/// Machine-readable account of a run, written next to the workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub search_text: String,
    pub category: NewsCategory,
    pub months: u32,
    pub threshold_date: NaiveDate,
    pub status: RunStatus,
    pub records: usize,
    pub pages_visited: usize,
    /// Human-readable description of why collection stopped.
    pub stop_reason: String,
    /// Error text when the run ended on a failure.
    pub error: Option<String>,
    /// Workbook path, when it was written.
    pub workbook: Option<String>,
    /// RFC 3339 local timestamps.
    pub started_at: String,
    pub finished_at: String,
}

//! Command-line interface definitions for the news robot.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Underscore spellings (`--search_text`) are the primary flag names; the
//! kebab-case forms are accepted as aliases.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for one robot run.
///
/// # Examples
///
/// ```sh
/// # Defaults: search "Bitcoin", keep relevance ordering, one month back
/// latimes_news_robot
///
/// # Newest-first, three months back, custom output directory
/// latimes_news_robot --search_text "interest rates" --news_category newest \
///     --months 3 --output-dir ./runs/rates
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Phrase to search for
    #[arg(
        long = "search_text",
        alias = "search-text",
        default_value = "Bitcoin",
        value_parser = non_empty
    )]
    pub search_text: String,

    /// Result category; `newest` sorts results newest-first
    #[arg(long = "news_category", alias = "news-category", default_value = "all")]
    pub news_category: String,

    /// How many months back to collect
    #[arg(long, default_value_t = 1)]
    pub months: u32,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "ROBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides the configured output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Append-only log file
    #[arg(long, default_value = "automation.log")]
    pub log_file: PathBuf,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

/// Rejects blank input; anything else is kept exactly as given.
fn non_empty(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("search text must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

//! # LA Times News Robot
//!
//! A browser-automation robot that searches the Los Angeles Times for a
//! phrase, walks the result pages newest-first (optionally), and exports
//! every result inside a lookback window to a spreadsheet together with a
//! screenshot of its thumbnail.
//!
//! ## Features
//!
//! - Drives Chromium over the devtools protocol
//! - Parses result cards from page snapshots
//! - Stops at the first result older than the lookback threshold
//! - Counts phrase occurrences and flags mentions of money per result
//! - Writes an xlsx workbook plus a JSON run summary
//!
//! ## Usage
//!
//! ```sh
//! latimes_news_robot --search_text Bitcoin --news_category newest --months 2
//! ```
//!
//! ## Architecture
//!
//! The run is a single sequential pipeline:
//! 1. **Search**: open the site, submit the phrase, optionally sort
//! 2. **Collect**: extract each card page by page until the threshold
//! 3. **Output**: write the workbook and the run summary
//!
//! The exit code is 0 for a complete run, 2 when a failure cut the run
//! short after some records were saved, and 1 when nothing was saved.

use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod config;
mod dates;
mod error;
mod extractor;
mod models;
mod outputs;
mod pagination;
mod retry;
mod scrapers;
mod text;
mod utils;
mod workflow;

use cli::Cli;
use config::RobotConfig;
use models::{NewsCategory, RunStatus, SearchContext};

/// Console plus append-only file logging. Returns the file open error, if
/// any, so it can be reported once logging is up.
fn init_tracing(log_file: &Path) -> Option<std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tfmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339());

    let (file_layer, file_error) = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => (
            Some(
                tfmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(UtcTime::rfc_3339()),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    file_error
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    if let Some(e) = init_tracing(&args.log_file) {
        warn!(path = %args.log_file.display(), error = %e, "Log file unavailable; logging to stderr only");
    }

    let start_time = Instant::now();
    info!("latimes_news_robot starting up");
    debug!(?args, "Parsed CLI arguments");

    let mut config = match RobotConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::from(RunStatus::Failed.exit_code());
        }
    };
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    if args.headed {
        config.headless = false;
    }

    let context = SearchContext::new(
        args.search_text,
        NewsCategory::from_arg(&args.news_category),
        args.months,
    );
    let span = info_span!(
        "run",
        search_text = %context.search_text,
        category = %context.category,
        months = context.months,
    );
    let summary = async {
        info!(threshold = %context.threshold_date, "Search context ready");
        workflow::run(&context, &config).await
    }
    .instrument(span)
    .await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        status = ?summary.status,
        records = summary.records,
        "Execution complete"
    );

    ExitCode::from(summary.status.exit_code())
}

//! End-to-end sequencing of one robot run.
//!
//! 1. **Cleanup**: kill stray spreadsheet processes holding the workbook
//! 2. **Session**: launch the browser
//! 3. **Search**: open the site (retried), submit the phrase, optionally sort newest-first
//! 4. **Collect**: run the pagination loop to completion
//! 5. **Persist**: write the workbook and the run summary
//! 6. **Teardown**: close the browser, kill spreadsheet processes again
//!
//! No step after the session is launched can skip teardown. Errors before
//! pagination become a failed [`PaginationOutcome`] with no records, so the
//! persist step always runs on whatever was collected.

use crate::browser::BrowserSession;
use crate::browser::chrome::ChromeSession;
use crate::config::RobotConfig;
use crate::error::ScrapeError;
use crate::extractor::RecordExtractor;
use crate::models::{NewsCategory, NewsRecord, RunStatus, RunSummary, SearchContext};
use crate::outputs::summary::write_summary;
use crate::outputs::workbook::WorkbookWriter;
use crate::pagination::{PaginationController, PaginationOutcome, StopReason};
use crate::retry::RetryPolicy;
use crate::scrapers::latimes::{search_phrase, sort_newest};
use crate::utils::{ensure_writable_dir, kill_spreadsheet_processes, truncate_for_log};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};

/// Run the robot with a real browser.
#[instrument(level = "info", skip_all)]
pub async fn run(context: &SearchContext, config: &RobotConfig) -> RunSummary {
    let started_at = Local::now();
    if config.kill_spreadsheet_app {
        kill_spreadsheet_processes().await;
    }

    let summary = match ChromeSession::launch(config).await {
        Ok(session) => run_with_session(session, context, config).await,
        Err(e) => {
            error!(error = %e, "Could not start the browser");
            finish(context, config, PaginationOutcome::aborted(e), started_at).await
        }
    };

    if config.kill_spreadsheet_app {
        kill_spreadsheet_processes().await;
    }
    summary
}

/// Run the robot on an already open session. The session is closed
/// before outputs are written, whatever happened during collection.
pub async fn run_with_session<S: BrowserSession>(
    session: S,
    context: &SearchContext,
    config: &RobotConfig,
) -> RunSummary {
    let started_at = Local::now();
    let retry = RetryPolicy::from_settings(&config.retry).with_retry_if(ScrapeError::is_retryable);
    debug!(attempts = retry.max_attempts(), "Retry policy ready");

    let outcome = match collect(&session, context, config, &retry).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Run failed before results were read");
            PaginationOutcome::aborted(e)
        }
    };

    match session.close().await {
        Ok(()) => info!("Browser session closed"),
        Err(e) => warn!(error = %e, "Browser session did not close cleanly"),
    }

    finish(context, config, outcome, started_at).await
}

/// Open the site, search, sort if asked, then paginate.
async fn collect<S: BrowserSession>(
    session: &S,
    context: &SearchContext,
    config: &RobotConfig,
    retry: &RetryPolicy,
) -> Result<PaginationOutcome, ScrapeError> {
    let controller = PaginationController::new(session, config, retry)?;
    let site = config.site_url()?;
    let images_dir = config.output.images_path();
    ensure_writable_dir(&images_dir).await?;

    let url = site.as_str();
    retry
        .run("open site", || async move { session.goto(url).await })
        .await?;
    info!(url, "Site opened");

    search_phrase(session, config, retry, &context.search_text).await?;
    match context.category {
        NewsCategory::Newest => sort_newest(session, config, retry).await?,
        NewsCategory::All => info!("Keeping default result ordering"),
    }

    let mut extractor = RecordExtractor::new(session, context, site, images_dir);
    Ok(controller.run(&mut extractor).await)
}

/// Write the workbook and the run summary.
#[instrument(level = "info", skip_all, fields(records = outcome.records.len()))]
async fn finish(
    context: &SearchContext,
    config: &RobotConfig,
    outcome: PaginationOutcome,
    started_at: DateTime<Local>,
) -> RunSummary {
    let (mut status, mut failure) = match &outcome.stop {
        StopReason::Failed(e) if outcome.records.is_empty() => (RunStatus::Failed, Some(e.to_string())),
        StopReason::Failed(e) => (RunStatus::Partial, Some(e.to_string())),
        _ => (RunStatus::Completed, None),
    };

    let workbook = match write_workbook(config, &outcome.records).await {
        Ok(path) => Some(path.display().to_string()),
        Err(e) => {
            error!(error = %e, "Failed to write workbook; records are lost");
            status = RunStatus::Failed;
            failure.get_or_insert_with(|| e.to_string());
            None
        }
    };

    let summary = RunSummary {
        search_text: context.search_text.clone(),
        category: context.category,
        months: context.months,
        threshold_date: context.threshold_date,
        status,
        records: outcome.records.len(),
        pages_visited: outcome.pages_visited,
        stop_reason: outcome.stop.to_string(),
        error: failure,
        workbook,
        started_at: started_at.to_rfc3339(),
        finished_at: Local::now().to_rfc3339(),
    };

    if let Err(e) = write_summary(&summary, &config.output.summary_path()).await {
        error!(error = %e, "Failed to write run summary");
    }

    match &summary.error {
        Some(e) => warn!(
            status = ?summary.status,
            records = summary.records,
            error = %truncate_for_log(e, 300),
            "Run ended early"
        ),
        None => info!(
            records = summary.records,
            pages = summary.pages_visited,
            reason = %summary.stop_reason,
            "Run completed"
        ),
    }
    summary
}

async fn write_workbook(config: &RobotConfig, records: &[NewsRecord]) -> Result<PathBuf, ScrapeError> {
    ensure_writable_dir(&config.output.dir).await?;
    let mut writer = WorkbookWriter::create(config.output.workbook_path(), &config.output.sheet)?;
    writer.append_rows(records)?;
    writer.save()
}

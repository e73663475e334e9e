//! The pagination-driven extraction loop.
//!
//! [`PaginationController::run`] is a two-state machine:
//!
//! ```text
//!            ┌──────────── next page clicked ───────────┐
//!            ▼                                          │
//!      Collecting ── wait for cards ── extract each card ┤
//!            │                                          │
//!            └─ Stop / no next page / failure ──► Stopped (terminal)
//! ```
//!
//! Records are buffered in encounter order. The buffer is handed back in
//! every case, including failures, so the caller can always write what was
//! collected.

use crate::browser::BrowserSession;
use crate::config::RobotConfig;
use crate::error::ScrapeError;
use crate::extractor::{Extraction, RecordExtractor};
use crate::models::NewsRecord;
use crate::retry::RetryPolicy;
use crate::scrapers::latimes::CardSelectors;
use chrono::NaiveDate;
use std::fmt;
use tracing::{error, info, instrument, warn};

/// Why collection ended.
#[derive(Debug)]
pub enum StopReason {
    /// A card older than the threshold was reached.
    ThresholdReached { date: NaiveDate, threshold: NaiveDate },
    /// The last page had no usable "next" control.
    LastPage,
    /// An unrecoverable error ended the loop.
    Failed(ScrapeError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::ThresholdReached { date, threshold } => {
                write!(f, "reached a result dated {date}, before the threshold {threshold}")
            }
            StopReason::LastPage => f.write_str("no further result pages"),
            StopReason::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

#[derive(Debug)]
enum PaginationState {
    Collecting,
    Stopped(StopReason),
}

/// Everything the loop produced.
#[derive(Debug)]
pub struct PaginationOutcome {
    /// Extracted records in encounter order.
    pub records: Vec<NewsRecord>,
    /// Result pages whose cards were read.
    pub pages_visited: usize,
    pub stop: StopReason,
}

impl PaginationOutcome {
    /// Outcome of a run that failed before any result page was read.
    pub fn aborted(error: ScrapeError) -> Self {
        Self {
            records: Vec::new(),
            pages_visited: 0,
            stop: StopReason::Failed(error),
        }
    }
}

/// Drives extraction across result pages.
pub struct PaginationController<'a, S> {
    session: &'a S,
    config: &'a RobotConfig,
    retry: &'a RetryPolicy,
    cards: CardSelectors,
}

impl<'a, S: BrowserSession> PaginationController<'a, S> {
    pub fn new(
        session: &'a S,
        config: &'a RobotConfig,
        retry: &'a RetryPolicy,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            session,
            config,
            retry,
            cards: CardSelectors::new(&config.selectors)?,
        })
    }

    /// Collect records until the threshold, the last page, or a failure.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self, extractor: &mut RecordExtractor<'_, S>) -> PaginationOutcome {
        let mut records = Vec::new();
        let mut pages_visited = 0usize;
        let stop = loop {
            let state = match self.collect_page(extractor, &mut records, &mut pages_visited).await {
                Ok(Some(stop)) => PaginationState::Stopped(stop),
                Ok(None) => match self.next_page().await {
                    Ok(true) => PaginationState::Collecting,
                    Ok(false) => PaginationState::Stopped(StopReason::LastPage),
                    Err(e) => PaginationState::Stopped(StopReason::Failed(e)),
                },
                Err(e) => PaginationState::Stopped(StopReason::Failed(e)),
            };
            info!(pages = pages_visited, collected = records.len(), "Result page done");

            match state {
                PaginationState::Collecting => continue,
                PaginationState::Stopped(stop) => break stop,
            }
        };

        match &stop {
            StopReason::Failed(e) => {
                error!(error = %e, collected = records.len(), "Extraction aborted; keeping collected records")
            }
            other => info!(reason = %other, collected = records.len(), "Extraction finished"),
        }

        PaginationOutcome {
            records,
            pages_visited,
            stop,
        }
    }

    /// Read the current page. Records are pushed as they are extracted, so a
    /// failure mid-page keeps the ones before it. The page counts as visited
    /// once its snapshot is taken. Returns the stop reason when a card
    /// crossed the threshold.
    async fn collect_page(
        &self,
        extractor: &mut RecordExtractor<'_, S>,
        records: &mut Vec<NewsRecord>,
        pages_visited: &mut usize,
    ) -> Result<Option<StopReason>, ScrapeError> {
        let session = self.session;
        let selector = self.config.selectors.result_item.as_str();
        let timeout = self.config.results_timeout();
        self.retry
            .run("wait for results", || async move {
                session.wait_for_visible(selector, timeout).await
            })
            .await?;

        let html = session.content().await?;
        *pages_visited += 1;
        let items = self.cards.parse_results(&html);
        if items.is_empty() {
            warn!(selector, "Results were visible but no cards parsed");
        }

        for item in &items {
            match extractor.extract(item).await? {
                Extraction::Record(record) => records.push(record),
                Extraction::Stop { date, threshold } => {
                    return Ok(Some(StopReason::ThresholdReached { date, threshold }));
                }
            }
        }
        Ok(None)
    }

    async fn next_page(&self) -> Result<bool, ScrapeError> {
        let selectors = &self.config.selectors;
        let moved = self
            .session
            .click_link_with_text(&selectors.next_page, &selectors.next_text)
            .await?;
        if !moved {
            info!("No next page control; last page reached");
        }
        Ok(moved)
    }
}

//! JSON run summary.
//!
//! Written next to the workbook at the end of every run, whatever the
//! outcome, so a scheduler can tell a finished run from a crashed one
//! without reading the log:
//!
//! ```json
//! {
//!   "search_text": "Bitcoin",
//!   "status": "partial",
//!   "records": 7,
//!   "stop_reason": "failed: timed out after 10s waiting for `li ps-promo`",
//!   ...
//! }
//! ```

use crate::error::ScrapeError;
use crate::models::RunSummary;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `summary` as pretty JSON to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(summary)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create summary dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(status = ?summary.status, records = summary.records, "Wrote run summary");
    Ok(())
}

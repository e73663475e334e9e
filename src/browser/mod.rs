//! Browsing capability used by the workflow.
//!
//! [`BrowserSession`] is the seam between the robot's control flow and a
//! real browser. The production implementation is [`chrome::ChromeSession`],
//! which drives Chromium over the devtools protocol. Tests use an in-memory
//! fake serving static HTML pages.
//!
//! Result cards are not read element by element over the wire: the robot
//! takes an HTML snapshot with [`BrowserSession::content`] and parses the
//! cards locally (see [`crate::scrapers::latimes`]).

use crate::error::ScrapeError;
use std::path::Path;
use std::time::Duration;

pub mod chrome;
#[cfg(test)]
pub mod fake;

/// One browsing session with a single main page.
///
/// All methods act on the main page except [`BrowserSession::save_image`],
/// which uses a short-lived secondary page and closes it before returning.
pub trait BrowserSession {
    /// Navigate the main page to `url`.
    async fn goto(&self, url: &str) -> Result<(), ScrapeError>;

    /// Wait until at least one element matching `selector` is visible.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::ElementTimeout`] when `timeout` expires first.
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), ScrapeError>;

    /// Focus the first element matching `selector` and type `text` into it.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), ScrapeError>;

    /// Choose the option labelled `label` in the `<select>` matching `selector`.
    async fn select_option(&self, selector: &str, label: &str) -> Result<(), ScrapeError>;

    /// Current HTML of the main page.
    async fn content(&self) -> Result<String, ScrapeError>;

    /// Click the first visible element matching `selector` whose text
    /// contains `text`. Returns `false` when there is none.
    async fn click_link_with_text(&self, selector: &str, text: &str) -> Result<bool, ScrapeError>;

    /// Open `url` on a secondary page and save a screenshot of its image to `path`.
    async fn save_image(&self, url: &str, path: &Path) -> Result<(), ScrapeError>;

    /// Release the browser.
    async fn close(self) -> Result<(), ScrapeError>
    where
        Self: Sized;
}

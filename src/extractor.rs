//! Turning one result card into a [`NewsRecord`].
//!
//! [`RecordExtractor::extract`] reads the card, parses its date and checks it
//! against the run's threshold. Cards older than the threshold yield
//! [`Extraction::Stop`] without touching the network or the disk. Any other
//! card gets its thumbnail saved and its derived fields computed.
//!
//! Failures are returned as `Err`. They are not retried here: a card that
//! cannot be read ends the current page.

use crate::browser::BrowserSession;
use crate::dates::parse_news_date;
use crate::error::ScrapeError;
use crate::models::{NewsRecord, SearchContext};
use crate::text::{contains_money_amount, count_occurrences};
use crate::utils::ImageNamer;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, info, instrument};
use url::Url;

/// Read access to one result entry on the current page.
pub trait ItemHandle {
    fn title(&self) -> Result<String, ScrapeError>;
    fn description(&self) -> Result<String, ScrapeError>;
    fn date_text(&self) -> Result<String, ScrapeError>;
    fn image_src(&self) -> Result<String, ScrapeError>;
}

/// Successful outcome of reading one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A complete record; its thumbnail has been written.
    Record(NewsRecord),
    /// The card is older than the threshold; collection must halt.
    Stop { date: NaiveDate, threshold: NaiveDate },
}

/// Extracts records for one run.
pub struct RecordExtractor<'a, S> {
    session: &'a S,
    context: &'a SearchContext,
    base_url: Url,
    images_dir: PathBuf,
    namer: ImageNamer,
}

impl<'a, S: BrowserSession> RecordExtractor<'a, S> {
    pub fn new(
        session: &'a S,
        context: &'a SearchContext,
        base_url: Url,
        images_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            session,
            context,
            base_url,
            images_dir: images_dir.into(),
            namer: ImageNamer::new(),
        }
    }

    /// Extract one card.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::DateFormat`] when the card's date is unrecognized
    /// - [`ScrapeError::MissingElement`] when a field is absent
    /// - any error from saving the thumbnail
    #[instrument(level = "debug", skip_all)]
    pub async fn extract<I: ItemHandle>(&mut self, item: &I) -> Result<Extraction, ScrapeError> {
        let title = item.title()?;
        let description = item.description()?;
        let raw_date = item.date_text()?;
        let date = parse_news_date(&raw_date)?;

        if self.context.is_before_threshold(date) {
            info!(
                %date,
                threshold = %self.context.threshold_date,
                "Card is older than the threshold; stopping collection"
            );
            return Ok(Extraction::Stop {
                date,
                threshold: self.context.threshold_date,
            });
        }

        let src = item.image_src()?;
        let image_url = self.base_url.join(&src)?;
        let image_filename = self.namer.next_name();
        let image_path = self.images_dir.join(&image_filename);
        self.session
            .save_image(image_url.as_str(), &image_path)
            .await?;

        let search_count = count_occurrences(&self.context.search_text, &title, &description);
        let contains_money = contains_money_amount(&title, &description);
        debug!(%title, %date, search_count, contains_money, "Extracted record");

        Ok(Extraction::Record(NewsRecord {
            title,
            description,
            raw_date: raw_date.trim().to_string(),
            date,
            image_filename,
            search_count,
            contains_money,
        }))
    }
}

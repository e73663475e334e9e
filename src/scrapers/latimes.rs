//! Los Angeles Times search pages.
//!
//! Search results are `<ps-promo>` cards inside list items. Each card holds
//! a headline link, a teaser, a timestamp and a thumbnail:
//!
//! ```html
//! <li><ps-promo>
//!   <img class="image" src="https://ca-times.brightspotcdn.com/...">
//!   <h3 class="promo-title"><a href="...">Headline</a></h3>
//!   <p class="promo-description">Teaser</p>
//!   <p class="promo-timestamp">Aug. 14, 2024</p>
//! </ps-promo></li>
//! ```
//!
//! Cards are parsed from an HTML snapshot of the results page into
//! [`PromoItem`]s, which the extractor reads through [`ItemHandle`].

use crate::browser::BrowserSession;
use crate::config::{RobotConfig, Selectors};
use crate::error::ScrapeError;
use crate::extractor::ItemHandle;
use crate::retry::RetryPolicy;
use scraper::{ElementRef, Html, Selector};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

/// One card field: the selector it came from and its text, if found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    selector: String,
    value: Option<String>,
}

impl CardField {
    fn get(&self) -> Result<String, ScrapeError> {
        self.value
            .clone()
            .ok_or_else(|| ScrapeError::missing(&self.selector))
    }
}

/// A result card parsed from the results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoItem {
    title: CardField,
    description: CardField,
    date: CardField,
    image_src: CardField,
}

impl ItemHandle for PromoItem {
    fn title(&self) -> Result<String, ScrapeError> {
        self.title.get()
    }

    fn description(&self) -> Result<String, ScrapeError> {
        self.description.get()
    }

    fn date_text(&self) -> Result<String, ScrapeError> {
        self.date.get()
    }

    fn image_src(&self) -> Result<String, ScrapeError> {
        self.image_src.get()
    }
}

/// Compiled card selectors.
#[derive(Debug)]
pub struct CardSelectors {
    item: Selector,
    title: Selector,
    description: Selector,
    timestamp: Selector,
    image: Selector,
    raw: Selectors,
}

fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Config(format!("bad selector `{selector}`: {e}")))
}

impl CardSelectors {
    pub fn new(selectors: &Selectors) -> Result<Self, ScrapeError> {
        Ok(Self {
            item: compile(&selectors.result_item)?,
            title: compile(&selectors.title)?,
            description: compile(&selectors.description)?,
            timestamp: compile(&selectors.timestamp)?,
            image: compile(&selectors.image)?,
            raw: selectors.clone(),
        })
    }

    fn text_of(&self, card: ElementRef<'_>, selector: &Selector, raw: &str) -> CardField {
        let value = card.select(selector).next().map(|el| {
            el.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        });
        CardField {
            selector: raw.to_string(),
            value,
        }
    }

    fn parse_card(&self, card: ElementRef<'_>) -> PromoItem {
        let mut title = self.text_of(card, &self.title, &self.raw.title);
        // An empty headline is as good as none.
        if title.value.as_deref().is_some_and(str::is_empty) {
            title.value = None;
        }
        let image_src = CardField {
            selector: format!("{}[src]", self.raw.image),
            value: card
                .select(&self.image)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(|src| src.trim().to_string())
                .filter(|src| !src.is_empty()),
        };
        PromoItem {
            title,
            description: self.text_of(card, &self.description, &self.raw.description),
            date: self.text_of(card, &self.timestamp, &self.raw.timestamp),
            image_src,
        }
    }

    /// Parse every result card in page order.
    pub fn parse_results(&self, html: &str) -> Vec<PromoItem> {
        let document = Html::parse_document(html);
        let items: Vec<PromoItem> = document
            .select(&self.item)
            .map(|card| self.parse_card(card))
            .collect();
        debug!(count = items.len(), "Parsed result cards");
        items
    }
}

/// Open the search box, type `search_text` and submit.
#[instrument(level = "info", skip(session, config, retry))]
pub async fn search_phrase<S: BrowserSession>(
    session: &S,
    config: &RobotConfig,
    retry: &RetryPolicy,
    search_text: &str,
) -> Result<(), ScrapeError> {
    let selectors = &config.selectors;
    let button = selectors.search_button.as_str();
    let timeout = config.control_timeout();
    retry
        .run("wait for search control", || async move {
            session.wait_for_visible(button, timeout).await
        })
        .await?;
    session.click(button).await?;
    session.fill(&selectors.search_input, search_text).await?;
    session.click(&selectors.search_submit).await?;
    info!("Search submitted");
    Ok(())
}

/// Switch the result ordering to the configured "newest" option.
///
/// Pauses before and after the selection so the result list can visibly
/// reorder before cards are read.
#[instrument(level = "info", skip_all)]
pub async fn sort_newest<S: BrowserSession>(
    session: &S,
    config: &RobotConfig,
    retry: &RetryPolicy,
) -> Result<(), ScrapeError> {
    let select = config.selectors.sort_select.as_str();
    let label = config.sort_label.as_str();
    let timeout = config.control_timeout();
    retry
        .run("wait for sort control", || async move {
            session.wait_for_visible(select, timeout).await
        })
        .await?;
    sleep(config.sort_settle()).await;
    retry
        .run("select sort option", || async move {
            session.select_option(select, label).await
        })
        .await?;
    sleep(config.sort_settle()).await;
    info!(label, "Results sorted");
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! HTML builders for result pages.

    /// One result card.
    pub fn card(title: &str, description: &str, date: &str, image: &str) -> String {
        format!(
            r#"<li><ps-promo class="promo">
                <div class="promo-media"><img class="image" src="{image}" alt=""></div>
                <div class="promo-content">
                  <h3 class="promo-title"><a class="link" href="/story">{title}</a></h3>
                  <p class="promo-description">{description}</p>
                  <p class="promo-timestamp">{date}</p>
                </div>
              </ps-promo></li>"#
        )
    }

    /// A results page holding `cards`, with a "Next" pagination link.
    pub fn page(cards: &[String]) -> String {
        format!(
            r#"<html><body><ul class="search-results-module-results-menu">{}</ul>
               <div class="search-results-module-pagination">
                 <a rel="nofollow" href="?p=2">Next</a>
               </div></body></html>"#,
            cards.concat()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{card, page};
    use super::*;
    use crate::browser::fake::FakeSession;
    use std::time::Duration;

    fn selectors() -> CardSelectors {
        CardSelectors::new(&Selectors::default()).unwrap()
    }

    fn quick_config() -> RobotConfig {
        RobotConfig {
            sort_settle_ms: 0,
            ..RobotConfig::default()
        }
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn test_parse_results_in_page_order() {
        let html = page(&[
            card("First  story", "About <b>Bitcoin</b>", "July 18, 2024", "https://img/1.jpg"),
            card("Second story", "", "Aug. 14, 2024", "/img/2.jpg"),
        ]);
        let items = selectors().parse_results(&html);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title().unwrap(), "First story");
        assert_eq!(items[0].description().unwrap(), "About Bitcoin");
        assert_eq!(items[0].date_text().unwrap(), "July 18, 2024");
        assert_eq!(items[0].image_src().unwrap(), "https://img/1.jpg");
        assert_eq!(items[1].description().unwrap(), "");
        assert_eq!(items[1].image_src().unwrap(), "/img/2.jpg");
    }

    #[test]
    fn test_missing_fields_surface_as_errors() {
        let html = r#"<ul><li><ps-promo>
            <p class="promo-timestamp">July 18, 2024</p>
        </ps-promo></li></ul>"#;
        let items = selectors().parse_results(html);

        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0].title(),
            Err(ScrapeError::MissingElement { selector }) if selector == ".promo-title a"
        ));
        assert!(items[0].description().is_err());
        assert!(items[0].image_src().is_err());
        assert_eq!(items[0].date_text().unwrap(), "July 18, 2024");
    }

    #[test]
    fn test_no_cards() {
        assert!(selectors().parse_results("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_bad_selector_is_config_error() {
        let bad = Selectors {
            result_item: "li[".to_string(),
            ..Selectors::default()
        };
        assert!(matches!(CardSelectors::new(&bad), Err(ScrapeError::Config(_))));
    }

    #[tokio::test]
    async fn test_search_phrase_sequence() {
        let session = FakeSession::new(vec![]);
        let config = quick_config();
        search_phrase(&session, &config, &quick_retry(), "Bitcoin")
            .await
            .unwrap();

        assert_eq!(
            session.calls(),
            vec![
                "wait [data-element='search-button']",
                "click [data-element='search-button']",
                "fill [data-element='search-form-input'] Bitcoin",
                "click [type='submit']",
            ]
        );
    }

    #[tokio::test]
    async fn test_sort_newest_sequence() {
        let session = FakeSession::new(vec![]);
        sort_newest(&session, &quick_config(), &quick_retry())
            .await
            .unwrap();

        assert_eq!(
            session.calls(),
            vec!["wait select[name='s']", "select select[name='s'] Newest"]
        );
    }
}

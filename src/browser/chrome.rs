//! Chromium-backed [`BrowserSession`] built on `chromiumoxide`.
//!
//! The devtools event handler runs on its own tokio task for the lifetime of
//! the session. Every interaction is followed by the configured slow-motion
//! delay so the site's scripts can catch up.

use super::BrowserSession;
use crate::config::RobotConfig;
use crate::error::ScrapeError;
use crate::retry::RetryPolicy;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use futures::StreamExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Polling interval for visibility waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound for the page load that follows a pagination click.
const NAVIGATION_SETTLE: Duration = Duration::from_secs(15);

const IS_VISIBLE_JS: &str = "function() { \
    const style = window.getComputedStyle(this); \
    const rect = this.getBoundingClientRect(); \
    return style.visibility !== 'hidden' && style.display !== 'none' \
        && (rect.width > 0 || rect.height > 0); \
}";

/// A Chromium process, its event loop and the main page.
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    slow_mo: Duration,
    image_selector: String,
    retry: RetryPolicy,
}

impl ChromeSession {
    /// Launch Chromium and open a blank main page.
    #[instrument(level = "info", skip_all, fields(headless = config.headless))]
    pub async fn launch(config: &RobotConfig) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder().window_size(1366, 900);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(ScrapeError::Browser)?;

        let (browser, mut events) = Browser::launch(browser_config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser event loop ended");
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        info!(slow_mo_ms = config.slow_mo_ms, "Browser session started");

        Ok(Self {
            browser,
            handler,
            page,
            slow_mo: config.slow_mo(),
            image_selector: config.selectors.image_element.clone(),
            retry: RetryPolicy::from_settings(&config.retry).with_retry_if(ScrapeError::is_retryable),
        })
    }

    async fn pause(&self) {
        if !self.slow_mo.is_zero() {
            sleep(self.slow_mo).await;
        }
    }

    async fn is_visible(element: &Element) -> Result<bool, ScrapeError> {
        let returns = element.call_js_fn(IS_VISIBLE_JS, false).await?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn any_visible(&self, selector: &str) -> bool {
        let Ok(elements) = self.page.find_elements(selector).await else {
            return false;
        };
        for element in &elements {
            if matches!(Self::is_visible(element).await, Ok(true)) {
                return true;
            }
        }
        false
    }

    async fn screenshot_image(&self, page: &Page, url: &str, path: &Path) -> Result<(), ScrapeError> {
        self.retry
            .run("image navigation", || async move {
                page.goto(url)
                    .await
                    .map(|_| ())
                    .map_err(|e| ScrapeError::Navigation {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
            })
            .await?;

        let image = page
            .find_element(self.image_selector.as_str())
            .await
            .map_err(|_| ScrapeError::missing(&self.image_selector))?;
        image
            .save_screenshot(CaptureScreenshotFormat::Jpeg, path)
            .await?;
        Ok(())
    }
}

impl BrowserSession for ChromeSession {
    #[instrument(level = "info", skip(self))]
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.pause().await;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.any_visible(selector).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<(), ScrapeError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| ScrapeError::missing(selector))?
            .click()
            .await?;
        self.pause().await;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), ScrapeError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| ScrapeError::missing(selector))?
            .click()
            .await?
            .type_str(text)
            .await?;
        self.pause().await;
        Ok(())
    }

    async fn select_option(&self, selector: &str, label: &str) -> Result<(), ScrapeError> {
        let script = format!(
            "(() => {{ \
                const select = document.querySelector({sel}); \
                if (!select) return false; \
                const option = Array.from(select.options).find(o => o.label.trim() === {label}); \
                if (!option) return false; \
                select.value = option.value; \
                select.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                select.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                return true; \
            }})()",
            sel = serde_json::to_string(selector)?,
            label = serde_json::to_string(label)?,
        );
        let selected: bool = self.page.evaluate(script).await?.into_value()?;
        if !selected {
            return Err(ScrapeError::missing(format!("{selector} option '{label}'")));
        }
        self.pause().await;
        Ok(())
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        Ok(self.page.content().await?)
    }

    async fn click_link_with_text(&self, selector: &str, text: &str) -> Result<bool, ScrapeError> {
        let links = self.page.find_elements(selector).await.unwrap_or_default();
        for link in &links {
            let label = link.inner_text().await?.unwrap_or_default();
            if !label.contains(text) || !Self::is_visible(link).await? {
                continue;
            }
            link.click().await?;
            if tokio::time::timeout(NAVIGATION_SETTLE, self.page.wait_for_navigation())
                .await
                .is_err()
            {
                warn!(selector, "Page did not settle after clicking link");
            }
            self.pause().await;
            return Ok(true);
        }
        Ok(false)
    }

    #[instrument(level = "info", skip(self, path), fields(path = %path.display()))]
    async fn save_image(&self, url: &str, path: &Path) -> Result<(), ScrapeError> {
        let page = self.browser.new_page("about:blank").await?;
        let outcome = self.screenshot_image(&page, url, path).await;
        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close image page");
        }
        if outcome.is_ok() {
            info!("Image saved");
        }
        outcome
    }

    async fn close(mut self) -> Result<(), ScrapeError> {
        if let Err(e) = self.page.clone().close().await {
            warn!(error = %e, "Failed to close main page");
        }
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        if let Err(e) = self.handler.await {
            warn!(error = %e, "Browser event task panicked");
        }
        debug!("Chromium process exited");
        Ok(())
    }
}

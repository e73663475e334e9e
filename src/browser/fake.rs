//! In-memory [`BrowserSession`] for tests.
//!
//! Serves a fixed list of HTML pages. "Clicking next" advances to the next
//! page, image downloads write a small placeholder file, and every call is
//! recorded in a shared [`FakeLog`] that outlives the session, so tests can
//! assert on the interaction sequence after `close`.

use super::BrowserSession;
use crate::error::ScrapeError;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// Interactions recorded by a [`FakeSession`].
#[derive(Debug, Default)]
pub struct FakeLog {
    pub calls: RefCell<Vec<String>>,
    pub images: RefCell<Vec<(String, PathBuf)>>,
    pub closed: Cell<bool>,
}

#[derive(Debug, Default)]
pub struct FakeSession {
    pages: Vec<String>,
    current: Cell<usize>,
    /// Pages whose results never become visible.
    timeout_pages: Vec<usize>,
    /// Number of initial `goto` calls that fail.
    failing_gotos: Cell<usize>,
    log: Rc<FakeLog>,
}

impl FakeSession {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Make the result wait time out while `page` (0-based) is showing.
    pub fn with_timeout_on(mut self, page: usize) -> Self {
        self.timeout_pages.push(page);
        self
    }

    pub fn with_failing_gotos(self, count: usize) -> Self {
        self.failing_gotos.set(count);
        self
    }

    pub fn current_page(&self) -> usize {
        self.current.get()
    }

    pub fn log(&self) -> Rc<FakeLog> {
        Rc::clone(&self.log)
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.calls.borrow().clone()
    }

    pub fn images(&self) -> Vec<(String, PathBuf)> {
        self.log.images.borrow().clone()
    }

    fn record(&self, call: String) {
        self.log.calls.borrow_mut().push(call);
    }
}

impl BrowserSession for FakeSession {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        self.record(format!("goto {url}"));
        let remaining = self.failing_gotos.get();
        if remaining > 0 {
            self.failing_gotos.set(remaining - 1);
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        Ok(())
    }

    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<(), ScrapeError> {
        self.record(format!("wait {selector}"));
        if self.timeout_pages.contains(&self.current.get()) {
            return Err(ScrapeError::ElementTimeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), ScrapeError> {
        self.record(format!("click {selector}"));
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), ScrapeError> {
        self.record(format!("fill {selector} {text}"));
        Ok(())
    }

    async fn select_option(&self, selector: &str, label: &str) -> Result<(), ScrapeError> {
        self.record(format!("select {selector} {label}"));
        Ok(())
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        self.pages
            .get(self.current.get())
            .cloned()
            .ok_or_else(|| ScrapeError::Browser("no page loaded".to_string()))
    }

    async fn click_link_with_text(&self, selector: &str, text: &str) -> Result<bool, ScrapeError> {
        self.record(format!("next {selector} {text}"));
        let next = self.current.get() + 1;
        if next < self.pages.len() {
            self.current.set(next);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn save_image(&self, url: &str, path: &Path) -> Result<(), ScrapeError> {
        std::fs::write(path, b"\xFF\xD8\xFF")?;
        self.log
            .images
            .borrow_mut()
            .push((url.to_string(), path.to_path_buf()));
        Ok(())
    }

    async fn close(self) -> Result<(), ScrapeError> {
        self.record("close".to_string());
        self.log.closed.set(true);
        Ok(())
    }
}

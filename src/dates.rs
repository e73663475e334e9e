//! Parsing of the publication dates shown on result cards.
//!
//! The site renders dates in exactly two shapes and switches between them
//! depending on the month:
//!
//! | Shape | Example | Format |
//! |-------|---------|--------|
//! | Full month name | `July 18, 2024` | `%B %d, %Y` |
//! | Abbreviated month with a period | `Aug. 14, 2024` | `%b. %d, %Y` |
//!
//! Formats are tried in that order and the first match wins. The month word
//! must be spelled the way its format says, in any case, so `Aug 14, 2024`
//! and `July. 18, 2024` are rejected.

use chrono::NaiveDate;
use thiserror::Error;

/// Known date formats in priority order.
pub const NEWS_DATE_FORMATS: [&str; 2] = ["%B %d, %Y", "%b. %d, %Y"];

/// How the month word must be spelled for each entry of [`NEWS_DATE_FORMATS`].
const MONTH_SPELLINGS: [&str; 2] = ["%B", "%b."];

/// Raised when a date string matches none of [`NEWS_DATE_FORMATS`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("date format for '{text}' not recognized")]
pub struct DateFormatError {
    /// The offending text, as displayed by the site.
    pub text: String,
}

impl DateFormatError {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Parse a site date string into a calendar date.
///
/// Surrounding whitespace left over from text extraction is ignored.
///
/// # Errors
///
/// Returns [`DateFormatError`] when no known format matches.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_news_date("July 18, 2024")?, NaiveDate::from_ymd_opt(2024, 7, 18).unwrap());
/// assert!(parse_news_date("2024/07/18").is_err());
/// ```
pub fn parse_news_date(text: &str) -> Result<NaiveDate, DateFormatError> {
    let trimmed = text.trim();
    let month_word = trimmed.split_whitespace().next().unwrap_or_default();
    NEWS_DATE_FORMATS
        .iter()
        .zip(MONTH_SPELLINGS)
        .find_map(|(fmt, spelling)| {
            let date = NaiveDate::parse_from_str(trimmed, fmt).ok()?;
            // chrono reads either month spelling for both %B and %b.
            let expected = date.format(spelling).to_string();
            month_word.eq_ignore_ascii_case(&expected).then_some(date)
        })
        .ok_or_else(|| DateFormatError::new(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_month_name() {
        assert_eq!(parse_news_date("July 18, 2024").unwrap(), ymd(2024, 7, 18));
        assert_eq!(parse_news_date("December 1, 2023").unwrap(), ymd(2023, 12, 1));
    }

    #[test]
    fn test_abbreviated_month_with_period() {
        assert_eq!(parse_news_date("Aug. 14, 2024").unwrap(), ymd(2024, 8, 14));
        assert_eq!(parse_news_date("Feb. 3, 2024").unwrap(), ymd(2024, 2, 3));
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_news_date("  Aug. 14, 2024\n").unwrap(), ymd(2024, 8, 14));
    }

    #[test]
    fn test_unknown_formats_fail() {
        for text in [
            "2024/07/18",
            "18 July 2024",
            "",
            "yesterday",
            "Aug 14 2024",
            "Aug 14, 2024",
            "jul 18, 2024",
            "July. 18, 2024",
        ] {
            let err = parse_news_date(text).unwrap_err();
            assert_eq!(err.text, text);
        }
    }

    #[test]
    fn test_month_word_is_case_insensitive() {
        assert_eq!(parse_news_date("JULY 18, 2024").unwrap(), ymd(2024, 7, 18));
        assert_eq!(parse_news_date("aug. 14, 2024").unwrap(), ymd(2024, 8, 14));
        assert_eq!(parse_news_date("May. 5, 2024").unwrap(), ymd(2024, 5, 5));
    }

    #[test]
    fn test_invalid_calendar_day_fails() {
        assert!(parse_news_date("Feb. 30, 2024").is_err());
    }
}

//! Derived statistics over a record's title and description.

use once_cell::sync::Lazy;
use regex::Regex;

/// Money patterns, checked in order.
///
/// - `$11.1`, `$111,111.11`
/// - `11 dollars`
/// - `11 USD`
static MONEY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\$\d+(?:,\d{3})*(?:\.\d{1,2})?",
        r"(?i)\d+\s*dollars",
        r"(?i)\d+\s*USD",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Count case-insensitive, non-overlapping occurrences of `search_text`.
///
/// Title and description are counted separately and summed, so a match
/// spanning the boundary between the two fields is never counted. An empty
/// search text counts as zero.
pub fn count_occurrences(search_text: &str, title: &str, description: &str) -> usize {
    if search_text.is_empty() {
        return 0;
    }
    let needle = search_text.to_lowercase();
    title.to_lowercase().matches(needle.as_str()).count()
        + description.to_lowercase().matches(needle.as_str()).count()
}

/// Whether the title or description mention an amount of money.
pub fn contains_money_amount(title: &str, description: &str) -> bool {
    let combined = format!("{title} {description}");
    MONEY_PATTERNS.iter().any(|re| re.is_match(&combined))
}

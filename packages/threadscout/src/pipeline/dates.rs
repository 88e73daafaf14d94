//! Date-hint resolution.
//!
//! Deterministic mapping from informal date phrases to concrete
//! windows. Resolution is pure: "now" is a parameter, so every
//! pattern is testable independent of wall-clock time. Year spans use
//! fixed 365-day arithmetic and months 30 days, matching the windows
//! the mail backend's search grammar expects rather than calendar
//! math.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use std::sync::OnceLock;

/// A half-open date window for query construction.
///
/// Either bound may be absent; an all-`None` window applies no
/// filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    /// Messages on or after this date
    pub after: Option<NaiveDate>,

    /// Messages before this date
    pub before: Option<NaiveDate>,
}

impl DateWindow {
    /// Whether neither bound is set.
    pub fn is_empty(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }

    /// Union with another window: earliest `after`, latest `before`.
    ///
    /// Multiple hints each resolve independently and their windows
    /// union into one query range.
    pub fn union(self, other: DateWindow) -> DateWindow {
        DateWindow {
            after: match (self.after, other.after) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
            before: match (self.before, other.before) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
        }
    }
}

fn years_ago_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})\s+years?\s+ago$").unwrap())
}

fn months_ago_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})\s+months?\s+ago$").unwrap())
}

/// Resolve one informal date phrase against `now`.
///
/// Unrecognized phrases resolve to the empty window, never an error.
pub fn resolve_date_hint(phrase: &str, now: DateTime<Utc>) -> DateWindow {
    let phrase = phrase.trim().to_lowercase();
    let today = now.date_naive();

    match phrase.as_str() {
        "today" => {
            return DateWindow {
                after: Some(today),
                before: None,
            }
        }
        "yesterday" => {
            return DateWindow {
                after: Some(today - Duration::days(1)),
                before: Some(today),
            }
        }
        "last week" | "this week" => {
            return DateWindow {
                after: Some(today - Duration::days(7)),
                before: None,
            }
        }
        "last month" | "this month" => {
            return DateWindow {
                after: Some(today - Duration::days(30)),
                before: None,
            }
        }
        "last year" | "this year" => {
            return DateWindow {
                after: Some(today - Duration::days(365)),
                before: None,
            }
        }
        _ => {}
    }

    if let Some(caps) = years_ago_regex().captures(&phrase) {
        if let Ok(n) = caps[1].parse::<i64>() {
            let after = today - Duration::days(365 * n);
            return DateWindow {
                after: Some(after),
                before: Some(after + Duration::days(365)),
            };
        }
    }

    if let Some(caps) = months_ago_regex().captures(&phrase) {
        if let Ok(n) = caps[1].parse::<i64>() {
            return DateWindow {
                after: Some(today - Duration::days(30 * n)),
                before: None,
            };
        }
    }

    // Bare calendar year, 2000-2099
    if let Ok(year) = phrase.parse::<i32>() {
        if (2000..=2099).contains(&year) {
            return DateWindow {
                after: NaiveDate::from_ymd_opt(year, 1, 1),
                before: NaiveDate::from_ymd_opt(year + 1, 1, 1),
            };
        }
    }

    DateWindow::default()
}

/// Resolve every hint and union the resulting windows.
pub fn resolve_all(hints: &[String], now: DateTime<Utc>) -> DateWindow {
    hints
        .iter()
        .map(|h| resolve_date_hint(h, now))
        .fold(DateWindow::default(), DateWindow::union)
}

/// Render a date in the mail backend's slash-separated syntax.
pub fn format_mail_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

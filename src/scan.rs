//! Internal module for scanning listed messages for a code.

use crate::matcher::Matcher;
use crate::models::Message;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Result of scanning one inbox listing.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ScanOutcome {
    /// A code was found in the message at `position` (newest-first order).
    Found { code: String, position: usize },
    /// No message matched; `skipped` were older than the cut-off.
    NotFound { skipped: usize },
}

/// Parses an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`2026-01-27T11:49:10Z`, `...+08:00`, space separator
/// allowed) and, as fallbacks, offset-less timestamps with `T` or space as
/// separator and bare dates. Offset-less values are read as UTC; a bare date
/// is midnight.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Sorts by `received_time` descending, comparing the raw strings.
///
/// Missing timestamps compare as `""` and therefore end up last. The sort is
/// stable, so equal timestamps keep their listing order.
pub(crate) fn sort_newest_first(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        let a = a.received_time.as_deref().unwrap_or_default();
        let b = b.received_time.as_deref().unwrap_or_default();
        b.cmp(a)
    });
}

/// Returns `true` only when the message has a parseable timestamp earlier than `since`.
fn is_older_than(message: &Message, since: DateTime<Utc>) -> bool {
    let Some(raw) = message.received_time.as_deref().filter(|s| !s.is_empty()) else {
        return false;
    };

    match parse_timestamp(raw) {
        Some(received) => received < since,
        None => {
            debug!(received_time = %raw, "Unparseable received_time, keeping message");
            false
        }
    }
}

/// Sorts `messages` newest-first and returns the first code found.
pub(crate) fn scan_messages(
    mut messages: Vec<Message>,
    since: Option<DateTime<Utc>>,
    matcher: &dyn Matcher,
) -> ScanOutcome {
    sort_newest_first(&mut messages);

    let mut skipped = 0;
    for (position, message) in messages.iter().enumerate() {
        if since.is_some_and(|since| is_older_than(message, since)) {
            skipped += 1;
            continue;
        }

        let subject: String = message.subject().chars().take(50).collect();
        debug!(position, subject = %subject, "Checking message");

        if let Some(code) = matcher.find_match(&message.scan_text()) {
            debug!(
                position,
                matcher = %matcher.description(),
                "Found match in message"
            );
            return ScanOutcome::Found {
                code: code.into_owned(),
                position,
            };
        }
    }

    ScanOutcome::NotFound { skipped }
}

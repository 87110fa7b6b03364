#![forbid(unsafe_code)]

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::model::parse_timestamp;

const SHORT_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [hour repr:12]:[minute] [period]");
const FULL_STAMP: &[BorrowedFormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
);
const DATE_ONLY: &[BorrowedFormatItem<'static>] =
    format_description!("[month padding:none]/[day padding:none]/[year]");

/// "45s ago", "5m ago", "3h ago", "2d ago". Negative deltas read "just now".
#[must_use]
pub fn format_ago_compact(delta: Duration) -> String {
    let secs = delta.whole_seconds();
    if secs < 0 {
        return "just now".to_owned();
    }
    if secs < 60 {
        return format!("{secs}s ago");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// "30 seconds ago", "1 minutes ago", "2 hours ago", "3 days ago".
#[must_use]
pub fn format_ago_long(delta: Duration) -> String {
    let secs = delta.whole_seconds();
    if secs < 0 {
        return "just now".to_owned();
    }
    if secs < 60 {
        return format!("{secs} seconds ago");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins} minutes ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours} hours ago");
    }
    format!("{} days ago", hours / 24)
}

/// Header "Last updated" text.
#[must_use]
pub fn time_since_update(last_updated: Option<OffsetDateTime>, now: OffsetDateTime) -> String {
    match last_updated {
        Some(t) => format_ago_long(now - t),
        None => "Never".to_owned(),
    }
}

/// "May 1, 09:05 AM" in the viewer's offset; unparseable input is shown verbatim.
#[must_use]
pub fn format_stamp_short(raw: &str, offset: UtcOffset) -> String {
    format_with(raw, offset, SHORT_STAMP)
}

/// "5/1/2024, 9:05:00 AM" in the viewer's offset.
#[must_use]
pub fn format_stamp_full(raw: &str, offset: UtcOffset) -> String {
    format_with(raw, offset, FULL_STAMP)
}

/// "5/1/2024" in the viewer's offset.
#[must_use]
pub fn format_date(raw: &str, offset: UtcOffset) -> String {
    format_with(raw, offset, DATE_ONLY)
}

fn format_with(raw: &str, offset: UtcOffset, fmt: &[BorrowedFormatItem<'_>]) -> String {
    let Some(t) = parse_timestamp(raw) else {
        return raw.to_owned();
    };
    t.to_offset(offset)
        .format(fmt)
        .unwrap_or_else(|_| raw.to_owned())
}

/// A due date is overdue once it lies strictly in the past.
#[must_use]
pub fn is_overdue(due: &str, now: OffsetDateTime) -> bool {
    parse_timestamp(due).is_some_and(|t| t < now)
}

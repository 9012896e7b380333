//! Week calculator.
//!
//! All new signups are bucketed into the week *after* the current one.

use chrono::{DateTime, TimeZone};

use crate::models::WeekRange;

/// The canonical next-week range for `now`, evaluated in `now`'s time zone.
///
/// Monday of the current local week plus seven days, through the following
/// Sunday. Identical for every instant of the same calendar week.
pub fn next_week_range<Tz: TimeZone>(now: &DateTime<Tz>) -> WeekRange {
    WeekRange::containing(now.date_naive()).next()
}

/// Whether two ranges denote the same week bucket.
///
/// Compared at day granularity so clock skew within a day cannot split a week.
pub fn same_week(a: &WeekRange, b: &WeekRange) -> bool {
    a.start == b.start && a.end == b.end
}

/// Display label, e.g. `26/10/2026 - 01/11/2026`.
pub fn format_range(range: &WeekRange) -> String {
    format!(
        "{} - {}",
        range.start.format("%d/%m/%Y"),
        range.end.format("%d/%m/%Y")
    )
}

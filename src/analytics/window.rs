//! Analysis window derivation
//!
//! A `D`-day analysis covers the `D` calendar days ending today (in the
//! viewer's zone). The comparison baseline is the `D` days before that. Both
//! periods are fetched as one `2D`-day span and then split in memory with
//! [`filter_to_subrange`].

use chrono::{DateTime, Days, NaiveDate, Utc};

use super::zone::ViewerZone;
use crate::store::{SearchEvent, TimeWindow};

/// The three windows of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub primary: TimeWindow,
    pub comparison: TimeWindow,
    /// Covers both periods; fetched once for the comparison
    pub fetch_span: TimeWindow,
}

/// Plan the windows for a `days`-long analysis ending at `now`
///
/// Returns `None` when `days` is 0 or the calendar arithmetic leaves
/// chrono's date range.
pub fn plan_windows(days: u32, now: DateTime<Utc>, zone: &ViewerZone) -> Option<WindowPlan> {
    if days == 0 {
        return None;
    }

    let today = zone.today(now);
    let primary_first = days_before(today, days - 1)?;
    let comparison_first = days_before(primary_first, days)?;

    let end = zone.end_of_day(today);
    let primary_start = zone.start_of_day(primary_first);
    let comparison_start = zone.start_of_day(comparison_first);

    Some(WindowPlan {
        primary: TimeWindow::try_new(primary_start, end)?,
        comparison: TimeWindow::try_new(comparison_start, primary_start - 1)?,
        fetch_span: TimeWindow::try_new(comparison_start, end)?,
    })
}

fn days_before(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days)))
}

/// Keep only the events inside `window`, preserving order
pub fn filter_to_subrange(events: Vec<SearchEvent>, window: &TimeWindow) -> Vec<SearchEvent> {
    events
        .into_iter()
        .filter(|e| window.contains(e.timestamp))
        .collect()
}

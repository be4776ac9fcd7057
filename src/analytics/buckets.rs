//! Temporal Bucketer
//!
//! Daily and hour-of-day histograms over the record set of one window.
//! Days are keyed by `NaiveDate` so the trend sorts chronologically no matter
//! how the display label reads. Every one of the 24 hours is present in the
//! hourly distribution, with 0 for hours that saw no searches.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::zone::ViewerZone;
use crate::store::SearchEvent;

const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    /// Display label such as "Mar 7"
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourCount {
    /// Zero-padded hour, "00" through "23"
    pub hour: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalBuckets {
    pub search_trend: Vec<DayCount>,
    pub hourly_distribution: Vec<HourCount>,
}

/// Groups events by calendar day and hour in the viewer's zone
#[derive(Debug, Clone, Copy)]
pub struct TemporalBucketer {
    zone: ViewerZone,
}

impl TemporalBucketer {
    pub fn new(zone: ViewerZone) -> Self {
        Self { zone }
    }

    pub fn bucket(&self, events: &[SearchEvent]) -> TemporalBuckets {
        let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        let mut hours = [0usize; HOURS_PER_DAY];

        for event in events {
            let local = self.zone.local_datetime(event.timestamp);
            *days.entry(local.date()).or_insert(0) += 1;
            hours[self.zone.hour_of(event.timestamp) as usize] += 1;
        }

        let search_trend = days
            .into_iter()
            .map(|(date, count)| DayCount {
                date,
                label: date.format("%b %-d").to_string(),
                count,
            })
            .collect();

        let hourly_distribution = hours
            .iter()
            .enumerate()
            .map(|(hour, &count)| HourCount {
                hour: format!("{:02}", hour),
                count,
            })
            .collect();

        TemporalBuckets {
            search_trend,
            hourly_distribution,
        }
    }
}

//! Viewer time zone
//!
//! Day and hour boundaries are computed in the zone of the person reading the
//! dashboard, not in UTC. `ViewerZone` wraps either the machine's local zone
//! or a fixed offset and performs every calendar calculation the analytics
//! core needs.

use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike,
    Utc,
};

const SECONDS_PER_DAY: i64 = 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerZone {
    /// The zone configured on this machine (DST-aware)
    Local,
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl ViewerZone {
    pub fn utc() -> Self {
        ViewerZone::Fixed(Utc.fix())
    }

    /// Parse `local`, `utc`, or an offset like `+05:30`, `-0800`, `+09`
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "local" => return Ok(ViewerZone::Local),
            "utc" | "z" => return Ok(Self::utc()),
            _ => {}
        }

        if !trimmed.starts_with(['+', '-']) {
            return Err(format!("unrecognized time zone {:?}", s));
        }

        // chrono parses `±HH:MM` and `±HHMM`; the hour-only form is expanded first
        let hour_only = trimmed.len() == 3 && trimmed[1..].chars().all(|c| c.is_ascii_digit());
        let offset = if hour_only {
            format!("{}:00", trimmed)
        } else {
            trimmed.to_string()
        };

        offset
            .parse::<FixedOffset>()
            .map(ViewerZone::Fixed)
            .map_err(|e| format!("malformed UTC offset {:?}: {}", s, e))
    }

    /// Wall-clock time of an epoch-seconds timestamp in this zone
    ///
    /// Timestamps outside chrono's representable range are pinned to the epoch.
    pub fn local_datetime(&self, timestamp: i64) -> NaiveDateTime {
        let utc = DateTime::from_timestamp(timestamp, 0).unwrap_or_default();
        match self {
            ViewerZone::Local => utc.with_timezone(&Local).naive_local(),
            ViewerZone::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        }
    }

    /// Calendar day a timestamp falls on
    pub fn date_of(&self, timestamp: i64) -> NaiveDate {
        self.local_datetime(timestamp).date()
    }

    /// Hour of day (0-23) a timestamp falls in
    pub fn hour_of(&self, timestamp: i64) -> u32 {
        self.local_datetime(timestamp).hour()
    }

    /// Today's date for the viewer
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.date_of(now.timestamp())
    }

    /// First second of `date`
    pub fn start_of_day(&self, date: NaiveDate) -> i64 {
        match self {
            ViewerZone::Local => midnight(&Local, date),
            ViewerZone::Fixed(offset) => midnight(offset, date),
        }
    }

    /// Last second of `date`
    pub fn end_of_day(&self, date: NaiveDate) -> i64 {
        match date.succ_opt() {
            Some(next) => self.start_of_day(next) - 1,
            None => self.start_of_day(date) + SECONDS_PER_DAY - 1,
        }
    }
}

impl std::fmt::Display for ViewerZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerZone::Local => write!(f, "local"),
            ViewerZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.timestamp(),
        // Midnight skipped by a DST jump: the day starts at the transition
        None => {
            let offset = tz.offset_from_utc_datetime(&naive).fix();
            naive.and_utc().timestamp() - i64::from(offset.local_minus_utc())
        }
    }
}

//! CSV export row shaping
//!
//! Flattens fetched events into display rows and writes them as CSV with one
//! header row. Free-text fields are quoted by the `csv` writer, so queries
//! containing commas or quotes survive the round trip into a spreadsheet.

use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

use super::zone::ViewerZone;
use crate::store::SearchEvent;

pub const CSV_HEADERS: [&str; 7] = [
    "Query",
    "Results",
    "Filter",
    "Clicked",
    "Timestamp",
    "Session",
    "Latency (ms)",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One export row, already formatted for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub query: String,
    pub result_count: u32,
    pub filter_type: String,
    /// Clicked result, or "None"
    pub clicked_result: String,
    /// Viewer-local wall-clock time
    pub timestamp: String,
    pub session_id: String,
    /// Latency in milliseconds, or "N/A"
    pub latency_ms: String,
}

impl FlatRow {
    fn from_event(event: &SearchEvent, zone: &ViewerZone) -> Self {
        Self {
            query: event.query.clone(),
            result_count: event.result_count,
            filter_type: event.filter_type.clone(),
            clicked_result: match &event.clicked_result {
                Some(clicked) if !clicked.is_empty() => clicked.clone(),
                _ => "None".to_string(),
            },
            timestamp: zone
                .local_datetime(event.timestamp)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            session_id: event.session_id.clone(),
            latency_ms: event
                .latency_ms
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

pub fn export_rows(events: &[SearchEvent], zone: &ViewerZone) -> Vec<FlatRow> {
    events.iter().map(|e| FlatRow::from_event(e, zone)).collect()
}

/// Write `rows` as CSV with a single header row
pub fn write_csv<W: Write>(rows: &[FlatRow], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(rows: &[FlatRow]) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Download filename for an export made on `date`
pub fn export_filename(date: NaiveDate) -> String {
    format!("search-analytics-{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAR_10_2024: i64 = 1_710_028_800;

    #[test]
    fn test_row_shaping() {
        let events = vec![
            SearchEvent::new("calculus", 4, MAR_10_2024 + 3661)
                .filter("tutors")
                .clicked("tutor-12")
                .session("s-1")
                .latency(87),
            SearchEvent::new("art", 0, MAR_10_2024).filter("all").session("s-2"),
        ];
        let rows = export_rows(&events, &ViewerZone::utc());

        assert_eq!(rows[0].timestamp, "2024-03-10 01:01:01");
        assert_eq!(rows[0].clicked_result, "tutor-12");
        assert_eq!(rows[0].latency_ms, "87");
        assert_eq!(rows[1].clicked_result, "None");
        assert_eq!(rows[1].latency_ms, "N/A");
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let events = vec![SearchEvent::new("physics, \"intro\"", 2, MAR_10_2024).filter("all")];
        let csv = to_csv_string(&export_rows(&events, &ViewerZone::utc())).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("Query,Results,Filter,Clicked,Timestamp,Session,Latency (ms)")
        );
        assert_eq!(
            lines.next(),
            Some("\"physics, \"\"intro\"\"\",2,all,None,2024-03-10 00:00:00,,N/A")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_reads_back() {
        let events = vec![SearchEvent::new("a,b", 1, MAR_10_2024).clicked("x\ny")];
        let csv = to_csv_string(&export_rows(&events, &ViewerZone::utc())).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "a,b");
        assert_eq!(&record[3], "x\ny");
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let csv = to_csv_string(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_filename(date), "search-analytics-2024-03-07.csv");
    }
}

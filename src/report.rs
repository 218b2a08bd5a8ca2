//! Turns a [`GeoRecord`] into the fixed set of labeled rows shown after a
//! trace. Pure: no I/O, the clock reading is passed in.

use chrono::NaiveDateTime;
use serde_json::Number;

use crate::net::GeoRecord;

/// Placeholder for any field the service did not return.
pub const NOT_AVAILABLE: &str = "N/A";

/// Number of rows in every report.
pub const ROW_COUNT: usize = 15;

/// One `label > value` line of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub label: &'static str,
    pub value: String,
}

impl ReportRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Format a local time as `April 21, 2020, 5:35 pm`.
pub fn format_timestamp(now: NaiveDateTime) -> String {
    now.format("%B %-d, %Y, %-I:%M %P").to_string()
}

/// Build the report rows for `record`, stamped with `now`.
pub fn build_rows(record: &GeoRecord, now: NaiveDateTime) -> [ReportRow; ROW_COUNT] {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let lat = coordinate(record.lat.as_ref());
    let lon = coordinate(record.lon.as_ref());
    let location = format!("{lat}, {lon}");

    [
        ReportRow::new("IP Address", text(&record.query)),
        ReportRow::new("Country Code", text(&record.country_code)),
        ReportRow::new("Country", text(&record.country)),
        ReportRow::new("Date & Time", format_timestamp(now)),
        ReportRow::new("Region Code", text(&record.region_code)),
        ReportRow::new("Region", text(&record.region_name)),
        ReportRow::new("City", text(&record.city)),
        ReportRow::new("Zip Code", text(&record.zip)),
        ReportRow::new("Time Zone", text(&record.timezone)),
        ReportRow::new("ISP", text(&record.isp)),
        ReportRow::new("Organization", text(&record.org)),
        ReportRow::new("ASN", text(&record.asn)),
        ReportRow::new("Latitude", lat),
        ReportRow::new("Longitude", lon),
        ReportRow::new("Location", location),
    ]
}

// Printed as the number was written in the response: `40` stays `40`,
// `40.0` stays `40.0`.
fn coordinate(value: Option<&Number>) -> String {
    match value {
        Some(n) => n.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

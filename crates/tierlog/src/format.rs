//! Line and header rendering for the tier files.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::level::LogLevel;

/// strftime pattern for `DD-MM-YYYY - HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y - %H:%M:%S";

/// Second line of the audit header written to freshly created files.
pub const FORMAT_DESCRIPTION: &str = "Date set in the format [DD-MM-YYYY - HH:MM:SS]";

pub fn format_timestamp<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// `[DD-MM-YYYY - HH:MM:SS] [<Level>] <message>`
pub fn format_line<Tz>(timestamp: &DateTime<Tz>, level: LogLevel, message: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("[{}] [{}] {}", format_timestamp(timestamp), level, message)
}

/// Marker written once into a pre-existing file when a new run starts.
pub fn session_marker<Tz>(label: &str, timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "--- NEW LOGGER SESSION: {} started at [{}] ---",
        label,
        format_timestamp(timestamp)
    )
}

/// First line of the audit header.
pub fn audit_title(label: &str) -> String {
    format!("REAL TIME AUDIT: {}", label)
}

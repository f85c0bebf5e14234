//! MIME type detection utilities.
//!
//! Content types for the playground page, its JSON API, and whatever
//! format the configured compiler exports.

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const CALENDAR: &str = "text/calendar; charset=utf-8";
    pub const CSV: &str = "text/csv; charset=utf-8";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Guess MIME type from a file name such as `timeblok.ics`.
pub fn from_filename(name: &str) -> &'static str {
    from_extension(Path::new(name).extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("ics" | "ical" | "ifb") => types::CALENDAR,
        Some("csv") => types::CSV,
        Some("txt" | "tb") => types::PLAIN,
        Some("json") => types::JSON,
        Some("html" | "htm") => types::HTML,
        _ => types::OCTET_STREAM,
    }
}

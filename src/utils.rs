// Utility functions
use chrono::{DateTime, Utc};

/// Parses an RFC 3339 string into `DateTime<Utc>`, if possible.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Primary language subtag of a locale: "fr-FR" -> "fr".
pub fn language_of(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}

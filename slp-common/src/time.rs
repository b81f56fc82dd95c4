//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Timestamp as stored in TEXT columns (RFC 3339, UTC)
pub fn to_db_string(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

/// Parse a timestamp stored by [`to_db_string`]
pub fn from_db_string(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}

/// Expiry instant `seconds` after `from`; negative values clamp to `from`
pub fn expires_after(from: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    from + Duration::seconds(seconds.max(0))
}

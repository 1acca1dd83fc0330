// timetrack/backend-api/src/timestamps.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error_handler::ServiceError;

// Seconds (and fractions) first: "%H:%M" would reject the trailing ":SS" anyway.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO 8601 timestamp into naive UTC.
///
/// Offsets (`Z`, `+02:00`) are converted to UTC. Naive inputs, including the
/// `datetime-local` shape without seconds, are taken as UTC. A bare date means midnight.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<NaiveDateTime, ServiceError> {
    let raw = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.naive_utc());
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive);
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight);
    }

    log::debug!("Rejected {} value '{}'", field, raw);
    Err(ServiceError::BadRequest(format!(
        "Invalid {} format, expected ISO 8601",
        field
    )))
}

/// Whole minutes between `start` and `end`, truncated. `end` before `start` is rejected.
pub fn duration_minutes(start: NaiveDateTime, end: NaiveDateTime) -> Result<i32, ServiceError> {
    if end < start {
        return Err(ServiceError::BadRequest(
            "end_time must not be before start_time".to_string(),
        ));
    }
    let minutes = (end - start).num_seconds() / 60;
    i32::try_from(minutes)
        .map_err(|_| ServiceError::BadRequest("Time entry duration is too long".to_string()))
}

//! Timestamp parsing and formatting for segment-analysis documents.
//!
//! Segment boundaries arrive as `H:MM:SS.f` strings. Only the first
//! fractional digit is significant; anything after it is truncated, never
//! rounded, so parsed values line up with the precision of the source data.

use crate::error::{ModelError, ModelResult};

/// Parse an `H:MM:SS.f` timestamp to total seconds.
///
/// # Examples
/// ```
/// use emoline_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("0:01:27.4").unwrap(), 87.4);
/// assert_eq!(parse_timestamp("0:01:27.48").unwrap(), 87.4);
/// assert_eq!(parse_timestamp("1:00:00.0").unwrap(), 3600.0);
/// ```
pub fn parse_timestamp(ts: &str) -> ModelResult<f64> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(ModelError::malformed_timestamp(ts, "empty timestamp"));
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() != 3 {
        return Err(ModelError::malformed_timestamp(
            ts,
            "expected exactly three colon-separated fields",
        ));
    }

    let hours = parse_field(ts, parts[0], "invalid hours")?;
    let minutes = parse_field(ts, parts[1], "invalid minutes")?;
    if minutes >= 60 {
        return Err(ModelError::malformed_timestamp(ts, "minutes out of range"));
    }

    let (whole, fraction) = parts[2]
        .split_once('.')
        .ok_or_else(|| ModelError::malformed_timestamp(ts, "missing fractional seconds"))?;
    let seconds = parse_field(ts, whole, "invalid seconds")?;
    if seconds >= 60 {
        return Err(ModelError::malformed_timestamp(ts, "seconds out of range"));
    }
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ModelError::malformed_timestamp(
            ts,
            "unparseable fractional seconds",
        ));
    }
    let tenths = u64::from(fraction.as_bytes()[0] - b'0');

    // Whole tenths keep the result equal to the decimal literal.
    let total_tenths = hours
        .checked_mul(3600)
        .and_then(|s| s.checked_add(minutes * 60 + seconds))
        .and_then(|s| s.checked_mul(10))
        .and_then(|t| t.checked_add(tenths))
        .ok_or_else(|| ModelError::malformed_timestamp(ts, "hours out of range"))?;
    Ok(total_tenths as f64 / 10.0)
}

fn parse_field(ts: &str, field: &str, reason: &'static str) -> ModelResult<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ModelError::malformed_timestamp(ts, reason));
    }
    field
        .parse()
        .map_err(|_| ModelError::malformed_timestamp(ts, reason))
}

/// Format seconds as `H:MM:SS.f`, rounded to one decimal digit.
///
/// Negative and non-finite inputs format as `0:00:00.0`.
pub fn format_timestamp(total_secs: f64) -> String {
    let total_tenths = if total_secs.is_finite() && total_secs > 0.0 {
        (total_secs * 10.0).round() as u64
    } else {
        0
    };

    let tenths = total_tenths % 10;
    let whole = total_tenths / 10;
    let hours = whole / 3600;
    let mins = (whole % 3600) / 60;
    let secs = whole % 60;

    format!("{}:{:02}:{:02}.{}", hours, mins, secs, tenths)
}

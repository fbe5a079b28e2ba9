//! Timestamp parsing and offset formatting.

use thiserror::Error;

/// Error for malformed timestamp strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid timestamp format: {0}")]
pub struct TimestampError(pub String);

/// Parse a timestamp string (HH:MM:SS or HH:MM:SS.mmm) to seconds.
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() != 3 {
        return Err(TimestampError(ts.to_string()));
    }

    let hours: f64 = parts[0]
        .parse()
        .map_err(|_| TimestampError(ts.to_string()))?;
    let minutes: f64 = parts[1]
        .parse()
        .map_err(|_| TimestampError(ts.to_string()))?;
    let seconds: f64 = parts[2]
        .parse()
        .map_err(|_| TimestampError(ts.to_string()))?;

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Format a second offset for use in filenames.
///
/// Whole seconds drop the fractional part (`10.0` -> `"10"`), fractional
/// offsets keep it with trailing zeros trimmed (`10.50` -> `"10.5"`).
pub fn format_offset(secs: f64) -> String {
    if secs.fract().abs() < 1e-9 {
        format!("{}", secs as i64)
    } else {
        let s = format!("{:.3}", secs);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// Lenient ISO8601 timestamp parsing ("2012-01-02T12:00:00+0200")
use chrono::NaiveDate;
use thiserror::Error;

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_MINUTE: i64 = 60_000;

/// Position of the offset sign in `YYYY-MM-DDTHH:MM:SS±HHMM`
const OFFSET_SIGN_POSITION: usize = 19;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("expected at least 6 numeric fields in timestamp, found {found}")]
    MissingFields { found: usize },
    #[error("timestamp fields out of range: {input}")]
    OutOfRange { input: String },
}

/// Parse a timestamp to epoch milliseconds.
///
/// Every run of digits is a field; anything else is a separator, so the delimiters are
/// not checked. The first six fields are year, month, day, hour, minute and second in UTC.
/// A seventh field is read as an `HHMM` offset and applied according to the sign
/// character at position 19.
pub fn parse_date_from_iso8601(input: &str) -> Result<i64, TimestampError> {
    let parts: Vec<&str> = digit_runs(input).collect();
    if parts.len() < 6 {
        return Err(TimestampError::MissingFields { found: parts.len() });
    }

    let out_of_range = || TimestampError::OutOfRange {
        input: input.to_string(),
    };
    let field = |i: usize| parts[i].parse::<u32>().map_err(|_| out_of_range());

    let year = parts[0].parse::<i32>().map_err(|_| out_of_range())?;
    let utc = NaiveDate::from_ymd_opt(year, field(1)?, field(2)?)
        .and_then(|date| date.and_hms_opt(field(3).ok()?, field(4).ok()?, field(5).ok()?))
        .ok_or_else(out_of_range)?
        .and_utc()
        .timestamp_millis();

    let Some(offset_digits) = parts.get(6) else {
        return Ok(utc);
    };
    let offset = offset_millis(offset_digits);
    match input.as_bytes().get(OFFSET_SIGN_POSITION) {
        Some(b'+') => Ok(utc - offset),
        Some(b'-') => Ok(utc + offset),
        _ => Ok(utc),
    }
}

fn digit_runs(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
}

// Missing minute digits count as zero, so "+02" and "+02:00" both work
fn offset_millis(digits: &str) -> i64 {
    let hours = digits.get(..2).unwrap_or(digits).parse::<i64>().unwrap_or(0);
    let minutes = digits
        .get(2..digits.len().min(4))
        .and_then(|m| m.parse::<i64>().ok())
        .unwrap_or(0);
    hours * MS_PER_HOUR + minutes * MS_PER_MINUTE
}

//! Timestamp and duration parsing and formatting.

use chrono::{DateTime, TimeZone, Utc};

use super::value::{Duration, Timestamp};

/// Parse an RFC 3339 timestamp string.
///
/// Accepts forms like `2009-02-13T23:31:30Z`,
/// `2009-02-13T23:31:30.123456789Z`, and offsets like `+01:00`.
pub fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    let dt = DateTime::parse_from_rfc3339(s)
        .map_err(|e| format!("invalid timestamp format: {}", e))?;

    let ts = Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    };

    if !ts.is_valid() {
        return Err("timestamp out of range: must be between year 0001 and 9999".to_string());
    }

    Ok(ts)
}

/// Format a timestamp as RFC 3339 in UTC.
pub fn format_timestamp(ts: &Timestamp) -> String {
    match Utc.timestamp_opt(ts.seconds, ts.nanos.max(0) as u32) {
        chrono::LocalResult::Single(dt) => dt.to_rfc3339(),
        _ => format!("timestamp({}s {}ns)", ts.seconds, ts.nanos),
    }
}

/// Parse a duration string.
///
/// Accepts concatenated unit segments with an optional leading sign:
/// `100s`, `1.5h`, `1h30m45s`, `100ms`, `250us`, `500ns`, `-30s`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    if s.is_empty() {
        return Err("invalid duration: no value".to_string());
    }

    let mut total_nanos: i128 = 0;
    let mut remaining = s;

    while !remaining.is_empty() {
        let num_end = remaining
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(remaining.len());

        if num_end == 0 {
            return Err(format!(
                "invalid duration format: expected number at '{}'",
                remaining
            ));
        }

        let num_str = &remaining[..num_end];
        remaining = &remaining[num_end..];

        let unit_end = remaining
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(remaining.len());
        let unit = &remaining[..unit_end];
        remaining = &remaining[unit_end..];

        let value: f64 = num_str
            .parse()
            .map_err(|_| format!("invalid duration value: '{}'", num_str))?;

        let unit_nanos: f64 = match unit {
            "h" => 3_600_000_000_000.0,
            "m" => 60_000_000_000.0,
            "s" => 1_000_000_000.0,
            "ms" => 1_000_000.0,
            "us" | "µs" => 1_000.0,
            "ns" => 1.0,
            "" => return Err("invalid duration: missing unit".to_string()),
            other => return Err(format!("invalid duration unit: '{}'", other)),
        };

        total_nanos += (value * unit_nanos) as i128;
    }

    if negative {
        total_nanos = -total_nanos;
    }

    if total_nanos > i64::MAX as i128 || total_nanos < i64::MIN as i128 {
        return Err("duration out of range".to_string());
    }

    Ok(Duration::from_nanos(total_nanos as i64))
}

/// Format a duration in the compact unit notation used for diagnostics.
pub fn format_duration(d: &Duration) -> String {
    let total = d.to_nanos();
    if total == 0 {
        return "0s".to_string();
    }

    let negative = total < 0;
    let mut nanos = total.unsigned_abs();

    let mut out = String::new();
    if negative {
        out.push('-');
    }

    let hours = nanos / 3_600_000_000_000;
    nanos %= 3_600_000_000_000;
    let minutes = nanos / 60_000_000_000;
    nanos %= 60_000_000_000;
    let seconds = nanos / 1_000_000_000;
    nanos %= 1_000_000_000;

    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds > 0 || (hours == 0 && minutes == 0 && nanos == 0) {
        out.push_str(&format!("{}s", seconds));
    }
    if nanos > 0 {
        if nanos % 1_000_000 == 0 {
            out.push_str(&format!("{}ms", nanos / 1_000_000));
        } else if nanos % 1_000 == 0 {
            out.push_str(&format!("{}us", nanos / 1_000));
        } else {
            out.push_str(&format!("{}ns", nanos));
        }
    }

    out
}

/// The current wall-clock time as a [`Timestamp`].
///
/// Read once per validation call so every rule in one walk sees the same
/// `now`.
pub fn now() -> Timestamp {
    let now = Utc::now();
    Timestamp {
        seconds: now.timestamp(),
        nanos: now.timestamp_subsec_nanos() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rfc3339() {
        let ts = parse_timestamp("2009-02-13T23:31:30Z").unwrap();
        assert_eq!(ts.seconds, 1_234_567_890);
        assert_eq!(ts.nanos, 0);

        let ts = parse_timestamp("2009-02-13T23:31:30.5Z").unwrap();
        assert_eq!(ts.nanos, 500_000_000);
    }

    #[test]
    fn parse_rfc3339_with_offset() {
        let ts = parse_timestamp("2009-02-14T00:31:30+01:00").unwrap();
        assert_eq!(ts.seconds, 1_234_567_890);
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("not a timestamp").is_err());
        assert!(parse_timestamp("2009-02-13").is_err());
    }

    #[test]
    fn parse_durations() {
        assert_eq!(parse_duration("100s").unwrap(), Duration::from_seconds(100));
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            Duration::from_seconds(5400)
        );
        assert_eq!(
            parse_duration("1.5s").unwrap(),
            Duration::new(1, 500_000_000)
        );
        assert_eq!(
            parse_duration("-30s").unwrap(),
            Duration::from_seconds(-30)
        );
        assert_eq!(
            parse_duration("250ms").unwrap(),
            Duration::from_nanos(250_000_000)
        );
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10parsecs").is_err());
    }

    #[test]
    fn format_durations() {
        assert_eq!(format_duration(&Duration::from_seconds(0)), "0s");
        assert_eq!(format_duration(&Duration::from_seconds(90)), "1m30s");
        assert_eq!(format_duration(&Duration::from_seconds(-30)), "-30s");
        assert_eq!(format_duration(&Duration::from_nanos(1_500_000)), "1500us");
    }

    #[test]
    fn format_timestamp_round_trip() {
        let ts = Timestamp::new(1_234_567_890, 0);
        let formatted = format_timestamp(&ts);
        assert_eq!(parse_timestamp(&formatted).unwrap(), ts);
    }
}

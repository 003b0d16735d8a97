use chrono::{NaiveTime, Timelike};

/// Format of the repaired time of day, e.g. `13:45:07.123Z`
pub const TIME_FORMAT: &str = "%H:%M:%S%.fZ";

/// at most microsecond precision in the fractional part
const MAX_FRACTION_DIGITS: usize = 6;

/// Repairs a time of day logged with a colon in place of the fractional dot,
/// `13:45:07:123Z` becomes 13:45:07.123.
/// Returns None for anything that cannot be repaired and parsed.
pub fn fix_timestamp(ts: &str) -> Option<NaiveTime> {
    if ts.bytes().any(|b| b.is_ascii_whitespace()) {
        return None;
    }
    let stripped = ts.replace('Z', "");
    let (whole, fraction) = stripped.rsplit_once(':')?;
    if fraction.is_empty()
        || fraction.len() > MAX_FRACTION_DIGITS
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let fixed = format!("{}.{}Z", whole, fraction);
    let t = NaiveTime::parse_from_str(&fixed, TIME_FORMAT).ok()?;
    // chrono keeps second 60 as a leap second, seconds stop at 59 here
    if t.nanosecond() >= 1_000_000_000 {
        return None;
    }
    Some(t)
}

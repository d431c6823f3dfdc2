//! Age expressions such as `1d`, `3d12h` or `90m`
//!
//! An age is an optional whole number of days followed by `d`, then an optional
//! duration in the usual `<number><unit>` notation (`ns`, `us`, `ms`, `s`, `m`,
//! `h`, fractions allowed: `1.5h`, `2h45m`). Without a `d` the whole string is a
//! duration. The parsed age is returned as a negative offset to add to "now".

use crate::error::{PurgeError, Result};
use chrono::{DateTime, Duration, Utc};

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const MAX_FRACTION_DIGITS: usize = 18;

/// Parse an age expression into the (strictly negative) offset of the cutoff.
pub fn parse_ago(ago: &str) -> Result<Duration> {
    let ago = ago.trim();
    let (days, rest) = match ago.split_once('d') {
        Some((days, rest)) => {
            let days: i64 = days.parse().map_err(|_| {
                PurgeError::Parse(format!("invalid day count in age {:?}", ago))
            })?;
            (days, rest)
        }
        None => (0, ago),
    };

    let day_part = days
        .checked_mul(24)
        .and_then(Duration::try_hours)
        .ok_or_else(|| PurgeError::Parse(format!("age {:?} is out of range", ago)))?;

    let sub_day = if rest.is_empty() && ago.contains('d') {
        Duration::zero()
    } else {
        parse_duration(rest).map_err(|e| e.context(&format!("age {:?}", ago)))?
    };

    let total = day_part
        .checked_add(&sub_day)
        .ok_or_else(|| PurgeError::Parse(format!("age {:?} is out of range", ago)))?;

    if total <= Duration::zero() {
        return Err(PurgeError::Parse(format!(
            "age {:?} must be greater than zero",
            ago
        )));
    }

    Ok(-total)
}

/// The instant before which tags are condemned: `now` moved back by `ago`.
pub fn cutoff_from(ago: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let offset = parse_ago(ago)?;
    now.checked_add_signed(offset)
        .ok_or_else(|| PurgeError::Parse(format!("age {:?} reaches before the epoch", ago)))
}

/// Parse a duration such as `300ms`, `-1.5h` or `2h45m`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = || PurgeError::Parse(format!("invalid duration {:?}", input));

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let number = &rest[..number_end];
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale = unit_scale(unit).ok_or_else(|| {
            if unit.is_empty() {
                PurgeError::Parse(format!("missing unit in duration {:?}", input))
            } else {
                PurgeError::Parse(format!("unknown unit {:?} in duration {:?}", unit, input))
            }
        })?;

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(invalid());
        }

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let mut value = whole.checked_mul(scale).ok_or_else(invalid)?;

        if !fraction.is_empty() {
            let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
            let numerator: i128 = digits.parse().map_err(|_| invalid())?;
            let denominator = 10_i128.pow(digits.len() as u32);
            value = value
                .checked_add(numerator * scale / denominator)
                .ok_or_else(invalid)?;
        }

        total = total.checked_add(value).ok_or_else(invalid)?;
        if total > i64::MAX as i128 {
            return Err(PurgeError::Parse(format!(
                "duration {:?} is out of range",
                input
            )));
        }
    }

    let nanos = if negative { -total } else { total };
    Ok(Duration::nanoseconds(nanos as i64))
}

fn unit_scale(unit: &str) -> Option<i128> {
    let scale = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SECOND,
        "m" => 60 * NANOS_PER_SECOND,
        "h" => 3_600 * NANOS_PER_SECOND,
        _ => return None,
    };
    Some(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn one_day() {
        assert_eq!(parse_ago("1d").unwrap(), -Duration::hours(24));
    }

    #[test]
    fn days_and_hours() {
        assert_eq!(parse_ago("3d12h").unwrap(), -Duration::hours(84));
    }

    #[test]
    fn no_day_token_is_pure_duration() {
        assert_eq!(parse_ago("12h").unwrap(), -Duration::hours(12));
        assert_eq!(parse_ago("1h30m").unwrap(), -Duration::minutes(90));
        assert_eq!(parse_ago("1.5h").unwrap(), -Duration::minutes(90));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        for bad in ["abc", "", "d", "xd", "1d2", "1dabc", "12", "1..5h", "5w"] {
            assert!(
                matches!(parse_ago(bad), Err(PurgeError::Parse(_))),
                "expected parse error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn zero_or_negative_age_is_rejected() {
        assert!(matches!(parse_ago("0d"), Err(PurgeError::Parse(_))));
        assert!(matches!(parse_ago("-1h"), Err(PurgeError::Parse(_))));
        assert!(matches!(parse_ago("1d-24h"), Err(PurgeError::Parse(_))));
    }

    #[test]
    fn cutoff_is_now_minus_age() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let cutoff = cutoff_from("3d12h", now).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 3, 7, 0, 0, 0).unwrap());
    }

    #[test]
    fn sub_second_units() {
        assert_eq!(parse_duration("300ms").unwrap(), Duration::milliseconds(300));
        assert_eq!(parse_duration("1µs").unwrap(), Duration::microseconds(1));
        assert_eq!(parse_duration("-2s").unwrap(), Duration::seconds(-2));
        assert_eq!(parse_duration("0").unwrap(), Duration::zero());
    }
}

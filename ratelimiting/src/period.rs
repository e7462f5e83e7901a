//! @ai:module:intent Canonical ISO 8601 text form for refill periods
//! @ai:module:layer domain
//! @ai:module:public_api format_period, parse_period, serde_iso8601, serde_iso8601_option
//! @ai:module:stateless true
//!
//! Periods appear in cache keys and config files. Both go through
//! [`format_period`], so equal durations always produce equal text regardless
//! of how they were constructed.

use crate::error::{Error, Result};
use std::fmt::Write;
use std::time::Duration;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_WEEK: u64 = 604_800;

/// @ai:intent Render a duration as a canonical ISO 8601 duration string
/// @ai:example (Duration::from_secs(1)) -> "PT1S"
/// @ai:example (Duration::from_secs(90)) -> "PT1M30S"
/// @ai:example (Duration::from_millis(500)) -> "PT0.5S"
/// @ai:example (Duration::ZERO) -> "PT0S"
/// @ai:effects pure
pub fn format_period(period: Duration) -> String {
    if period.is_zero() {
        return "PT0S".to_string();
    }

    let mut secs = period.as_secs();
    let nanos = period.subsec_nanos();

    let days = secs / SECS_PER_DAY;
    secs %= SECS_PER_DAY;
    let hours = secs / SECS_PER_HOUR;
    secs %= SECS_PER_HOUR;
    let minutes = secs / SECS_PER_MINUTE;
    secs %= SECS_PER_MINUTE;

    let mut out = String::with_capacity(24);
    out.push('P');

    if days > 0 {
        let _ = write!(out, "{}D", days);
    }

    if hours == 0 && minutes == 0 && secs == 0 && nanos == 0 {
        return out;
    }

    out.push('T');
    if hours > 0 {
        let _ = write!(out, "{}H", hours);
    }
    if minutes > 0 {
        let _ = write!(out, "{}M", minutes);
    }
    if nanos > 0 {
        let mut fraction = nanos;
        let mut width = 9;
        while fraction % 10 == 0 {
            fraction /= 10;
            width -= 1;
        }
        let _ = write!(out, "{}.{:0width$}S", secs, fraction, width = width);
    } else if secs > 0 {
        let _ = write!(out, "{}S", secs);
    }

    out
}

/// @ai:intent Parse an ISO 8601 duration string (weeks, days, hours, minutes, seconds)
/// @ai:pre input uses only W/D before 'T' and H/M/S after it
/// @ai:post format_period(parse_period(s)) is the canonical form of s
/// @ai:effects pure
/// @ai:edge_cases "P" or "PT" with no components -> InvalidPeriod
/// @ai:edge_cases fractional values are accepted on seconds only
/// @ai:edge_cases repeated or out-of-order designators ("PT1S1S", "PT1S1H") -> InvalidPeriod
pub fn parse_period(input: &str) -> Result<Duration> {
    let invalid = |message: &str| Error::InvalidPeriod {
        input: input.to_string(),
        message: message.to_string(),
    };

    let rest = input
        .strip_prefix('P')
        .ok_or_else(|| invalid("must start with 'P'"))?;

    let (date, time) = match rest.split_once('T') {
        Some((_, "")) => return Err(invalid("'T' must be followed by a time component")),
        Some((date, time)) => (date, time),
        None => (rest, ""),
    };

    if date.is_empty() && time.is_empty() {
        return Err(invalid("no duration components"));
    }

    let mut secs: u64 = 0;
    let mut nanos: u32 = 0;

    let date = components(date).map_err(invalid)?;
    let time = components(time).map_err(invalid)?;
    ensure_ordered(&date, &['W', 'D']).map_err(invalid)?;
    ensure_ordered(&time, &['H', 'M', 'S']).map_err(invalid)?;

    for (number, designator) in date {
        let unit = match designator {
            'W' => SECS_PER_WEEK,
            'D' => SECS_PER_DAY,
            other => return Err(invalid(&format!("unexpected date designator '{}'", other))),
        };
        secs = add_units(secs, number, unit).map_err(invalid)?;
    }

    for (number, designator) in time {
        match designator {
            'H' => secs = add_units(secs, number, SECS_PER_HOUR).map_err(invalid)?,
            'M' => secs = add_units(secs, number, SECS_PER_MINUTE).map_err(invalid)?,
            'S' => {
                let (whole, fraction) = parse_seconds(number).map_err(invalid)?;
                secs = secs.checked_add(whole).ok_or_else(|| invalid("duration overflow"))?;
                nanos = fraction;
            }
            other => return Err(invalid(&format!("unexpected time designator '{}'", other))),
        }
    }

    Ok(Duration::new(secs, nanos))
}

/// @ai:intent Split a section into (number, designator) pairs
/// @ai:effects pure
fn components(section: &str) -> std::result::Result<Vec<(&str, char)>, &'static str> {
    let mut out = Vec::new();
    let mut start = 0;

    for (i, c) in section.char_indices() {
        if c.is_ascii_digit() || c == '.' {
            continue;
        }
        if start == i {
            return Err("designator without a number");
        }
        out.push((&section[start..i], c));
        start = i + c.len_utf8();
    }

    if start != section.len() {
        return Err("number without a designator");
    }

    Ok(out)
}

/// @ai:intent Require known designators to appear at most once, in `order`
/// @ai:effects pure
/// @ai:edge_cases unknown designators are left for the caller to report
fn ensure_ordered(parts: &[(&str, char)], order: &[char]) -> std::result::Result<(), &'static str> {
    let mut previous: Option<usize> = None;

    for (_, designator) in parts {
        let Some(rank) = order.iter().position(|d| d == designator) else {
            continue;
        };
        if previous.is_some_and(|p| rank <= p) {
            return Err("designators must appear once each, largest unit first");
        }
        previous = Some(rank);
    }

    Ok(())
}

/// @ai:intent Add number * unit seconds to an accumulator, rejecting fractions and overflow
/// @ai:effects pure
fn add_units(acc: u64, number: &str, unit: u64) -> std::result::Result<u64, &'static str> {
    let value = parse_whole(number)?;
    value
        .checked_mul(unit)
        .and_then(|secs| acc.checked_add(secs))
        .ok_or("duration overflow")
}

fn parse_whole(number: &str) -> std::result::Result<u64, &'static str> {
    if number.contains('.') {
        return Err("fractions are only allowed on seconds");
    }
    number.parse::<u64>().map_err(|_| "invalid number")
}

/// @ai:intent Parse "S" or "S.FFF" into whole seconds and nanoseconds
/// @ai:effects pure
/// @ai:edge_cases more than nine fraction digits -> truncated to nanoseconds
fn parse_seconds(number: &str) -> std::result::Result<(u64, u32), &'static str> {
    let Some((whole, fraction)) = number.split_once('.') else {
        return Ok((parse_whole(number)?, 0));
    };

    if fraction.is_empty() || fraction.contains('.') {
        return Err("invalid fraction");
    }

    let mut nanos: u32 = 0;
    let digits = fraction.len().min(9);
    for b in fraction.bytes().take(9) {
        nanos = nanos * 10 + u32::from(b - b'0');
    }
    nanos *= 10u32.pow((9 - digits) as u32);

    Ok((parse_whole(whole)?, nanos))
}

/// Serde adapter for `Duration` fields written as ISO 8601 strings.
pub mod serde_iso8601 {
    use super::{format_period, parse_period};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_period(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_period(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional ISO 8601 `Duration` fields.
pub mod serde_iso8601_option {
    use super::{format_period, parse_period};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&format_period(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| parse_period(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

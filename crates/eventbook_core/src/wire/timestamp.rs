//! Timestamp normalization for heterogeneous wire inputs.
//!
//! # Responsibility
//! - Convert every timestamp shape the remote store has ever emitted into
//!   one canonical UTC instant.
//! - Keep each recognition strategy a pure function returning an optional
//!   result.
//!
//! # Invariants
//! - `normalize` is total: it never fails and never panics, falling back to
//!   the current instant when nothing matches.
//! - Strategies are tried in a fixed order; a strategy that does not match
//!   its shape exactly falls through instead of guessing.

use crate::wire::value::{WirePayload, WireValue};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Epoch values whose magnitude exceeds this bound are milliseconds,
/// anything at or below it is seconds. Second-epoch values for realistic
/// dates stay far under 1e12 while millisecond-epoch values sit far above.
const EPOCH_MILLIS_BOUND: u64 = 1_000_000_000_000;

const SECONDS_KEYS: [&str; 2] = ["_seconds", "seconds"];
const NANOS_KEYS: [&str; 2] = ["_nanoseconds", "nanoseconds"];

/// "month-name day, year at h:mm:ss AM/PM" after whitespace normalization.
const HUMAN_WALL_CLOCK_FORMAT: &str = "%B %d, %Y at %I:%M:%S %p";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static AT_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i) at ").expect("valid at-separator regex"));
static OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])(\d{1,2}):(\d{2})$").expect("valid offset regex"));

/// Normalizes one wire value into a canonical UTC instant.
///
/// Recognized shapes, tried in order:
/// 1. store-native instant,
/// 2. seconds/nanos map (`_seconds`/`seconds` + optional
///    `_nanoseconds`/`nanoseconds`),
/// 3. numeric epoch (milliseconds above the 1e12 magnitude bound, seconds
///    otherwise),
/// 4. ISO-8601 text (RFC 3339, or an offset-less form read as local time),
/// 5. human-readable text with a `" UTC±H:MM"` suffix (wall clock at that
///    offset),
/// 6. human-readable text without an offset (local time).
///
/// Anything else, including every partial parse failure, yields the current
/// instant.
pub fn normalize(value: &WireValue) -> DateTime<Utc> {
    parse_native(value)
        .or_else(|| parse_seconds_nanos(value))
        .or_else(|| parse_epoch_number(value))
        .or_else(|| parse_text(value))
        .unwrap_or_else(Utc::now)
}

fn parse_native(value: &WireValue) -> Option<DateTime<Utc>> {
    match value {
        WireValue::Instant(instant) => Some(*instant),
        _ => None,
    }
}

fn parse_seconds_nanos(value: &WireValue) -> Option<DateTime<Utc>> {
    let map = value.as_map()?;
    let seconds = first_numeric(map, &SECONDS_KEYS)?;
    let nanos = first_numeric(map, &NANOS_KEYS).unwrap_or(0);

    let millis = seconds
        .checked_mul(1000)?
        .checked_add(nanos / 1_000_000)?;
    instant_from_millis(millis)
}

fn parse_epoch_number(value: &WireValue) -> Option<DateTime<Utc>> {
    match value {
        WireValue::Int(raw) => {
            let millis = if raw.unsigned_abs() > EPOCH_MILLIS_BOUND {
                *raw
            } else {
                raw.checked_mul(1000)?
            };
            instant_from_millis(millis)
        }
        WireValue::Float(raw) if raw.is_finite() => {
            let millis = if raw.abs() > EPOCH_MILLIS_BOUND as f64 {
                *raw
            } else {
                // Fractional seconds survive the scale-up; sub-millisecond
                // fractions truncate below.
                raw * 1000.0
            };
            if !millis.is_finite() {
                return None;
            }
            instant_from_millis(millis as i64)
        }
        _ => None,
    }
}

fn parse_text(value: &WireValue) -> Option<DateTime<Utc>> {
    let text = value.as_text()?.trim();
    if text.is_empty() {
        return None;
    }

    parse_iso(text)
        .or_else(|| parse_offset_suffixed(text))
        .or_else(|| parse_plain_local(text))
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    // Offset-less ISO form is wall-clock time in the local zone.
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    local_to_utc(&naive)
}

fn parse_offset_suffixed(text: &str) -> Option<DateTime<Utc>> {
    let (wall_clock, offset_raw) = text.split_once(" UTC")?;
    let offset_seconds = parse_offset_seconds(offset_raw.trim())?;
    let naive = parse_human_wall_clock(wall_clock)?;

    // The left-hand value is wall-clock time at that offset, so the UTC
    // instant is wall clock minus offset.
    FixedOffset::east_opt(offset_seconds)?
        .from_local_datetime(&naive)
        .single()
        .map(|fixed| fixed.with_timezone(&Utc))
}

fn parse_plain_local(text: &str) -> Option<DateTime<Utc>> {
    let naive = parse_human_wall_clock(text)?;
    local_to_utc(&naive)
}

fn parse_human_wall_clock(raw: &str) -> Option<NaiveDateTime> {
    let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ");
    let canonical = AT_SEPARATOR_RE.replace(&collapsed, " at ");
    NaiveDateTime::parse_from_str(&canonical, HUMAN_WALL_CLOCK_FORMAT).ok()
}

fn parse_offset_seconds(raw: &str) -> Option<i32> {
    let captures = OFFSET_RE.captures(raw)?;
    let sign: i32 = if &captures[1] == "-" { -1 } else { 1 };
    let hours: i32 = captures[2].parse().ok()?;
    let minutes: i32 = captures[3].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

fn first_numeric(map: &WirePayload, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| numeric_i64(map.get(*key)?))
}

fn numeric_i64(value: &WireValue) -> Option<i64> {
    match value {
        WireValue::Int(raw) => Some(*raw),
        WireValue::Float(raw) if raw.is_finite() => Some(*raw as i64),
        _ => None,
    }
}

fn instant_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

fn local_to_utc(naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

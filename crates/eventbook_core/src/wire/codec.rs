//! Record codec between canonical records and wire payloads.
//!
//! # Responsibility
//! - Emit the fixed canonical field set on the way out.
//! - Tolerate historical field-name drift on the way in, resolving each
//!   logical field as "first present alias wins".
//!
//! # Invariants
//! - `to_wire`/`from_wire` are total and side-effect-free.
//! - Missing text fields decode to empty strings, never to absent values.
//! - The timestamp field always goes through the normalizer, so decoded
//!   records always carry a concrete instant.

use crate::model::event::EventRecord;
use crate::wire::timestamp::normalize;
use crate::wire::value::{WirePayload, WireValue};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// In-payload identity key consulted when the store key channel is absent.
pub const ID_KEY: &str = "id";

/// Ordered alias sets per logical field, canonical name first. Older store
/// schema versions wrote the later names.
const TITLE_KEYS: [&str; 3] = ["title", "name", "eventName"];
const LOCATION_KEYS: [&str; 3] = ["location", "venue", "place"];
const OCCURS_AT_KEYS: [&str; 3] = ["occursAt", "dateTime", "date"];

/// Decode failure for a single feed entry.
///
/// The feed fold isolates this per entry; it never aborts a whole fold and
/// never reaches mutation callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Entry payload is not a key-value map.
    NotAMap { key: String },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAMap { key } => write!(f, "feed entry `{key}` is not a map payload"),
        }
    }
}

impl Error for DecodeError {}

/// Encodes one record into the canonical wire field set.
///
/// `occurs_at` is already UTC and rides as the store-native instant shape.
pub fn to_wire(record: &EventRecord) -> WirePayload {
    let mut payload = WirePayload::new();
    payload.insert(ID_KEY.to_string(), WireValue::Text(record.id.clone()));
    payload.insert(
        TITLE_KEYS[0].to_string(),
        WireValue::Text(record.title.clone()),
    );
    payload.insert(
        LOCATION_KEYS[0].to_string(),
        WireValue::Text(record.location.clone()),
    );
    payload.insert(
        OCCURS_AT_KEYS[0].to_string(),
        WireValue::Instant(record.occurs_at),
    );
    payload
}

/// Decodes one payload into a record, tolerating alias drift.
///
/// Identity comes from the store-provided `key` when it is non-empty, else
/// from the in-payload [`ID_KEY`], else the empty string. Aliased text
/// fields take the first present text value; non-text values under an alias
/// are skipped, not coerced.
pub fn from_wire(key: Option<&str>, payload: &WirePayload) -> EventRecord {
    let id = key
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| {
            payload
                .get(ID_KEY)
                .and_then(WireValue::as_text)
                .map(str::to_string)
        })
        .unwrap_or_default();

    let occurs_at = first_value(payload, &OCCURS_AT_KEYS)
        .map(normalize)
        .unwrap_or_else(|| normalize(&WireValue::Null));

    EventRecord {
        id,
        title: first_text(payload, &TITLE_KEYS).unwrap_or_default(),
        location: first_text(payload, &LOCATION_KEYS).unwrap_or_default(),
        occurs_at,
    }
}

/// Decodes one change-feed entry keyed by the store.
///
/// # Errors
/// - `NotAMap` when the entry payload is not a key-value map.
pub fn decode_entry(key: &str, payload: &WireValue) -> Result<EventRecord, DecodeError> {
    let map = payload.as_map().ok_or_else(|| DecodeError::NotAMap {
        key: key.to_string(),
    })?;
    Ok(from_wire(Some(key), map))
}

fn first_text(payload: &WirePayload, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| payload.get(*key)?.as_text().map(str::to_string))
}

fn first_value<'a>(payload: &'a WirePayload, keys: &[&str]) -> Option<&'a WireValue> {
    keys.iter().find_map(|key| payload.get(*key))
}

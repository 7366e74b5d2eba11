//! Tagged union over the wire shapes the remote store can deliver.
//!
//! # Responsibility
//! - Give the codec and normalizer one typed input instead of an
//!   `arbitrary`-typed payload.
//! - Bridge to and from `serde_json::Value` for hosts that speak JSON.
//!
//! # Invariants
//! - `Instant` is the only store-native shape; JSON bridging renders it as
//!   an RFC 3339 string, which the normalizer recognizes on the way back.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// Untyped key-value payload exchanged with the remote store.
///
/// `BTreeMap` keeps key order deterministic for logging and tests.
pub type WirePayload = BTreeMap<String, WireValue>;

/// One wire value in a remote payload or change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Store-native point-in-time value, already an absolute instant.
    Instant(DateTime<Utc>),
    Map(WirePayload),
    List(Vec<WireValue>),
}

impl WireValue {
    /// Returns the text content when this value is `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the payload map when this value is `Map`.
    pub fn as_map(&self) -> Option<&WirePayload> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Converts a host-side JSON value into the wire model.
    ///
    /// JSON has no native instant shape, so this never produces `Instant`;
    /// timestamps arrive as strings, numbers or seconds/nanos maps and are
    /// recognized by the normalizer instead.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Bool(*flag),
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Self::Int(int)
                } else {
                    Self::Float(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(text) => Self::Text(text.clone()),
            serde_json::Value::Array(items) => {
                Self::List(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(fields) => Self::Map(
                fields
                    .iter()
                    .map(|(key, item)| (key.clone(), Self::from_json(item)))
                    .collect(),
            ),
        }
    }

    /// Converts the wire model back into host-side JSON.
    ///
    /// `Instant` renders as an RFC 3339 string; a non-finite float has no
    /// JSON representation and degrades to null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(flag) => serde_json::Value::Bool(*flag),
            Self::Int(int) => serde_json::Value::from(*int),
            Self::Float(float) => serde_json::Number::from_f64(*float)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::Instant(instant) => serde_json::Value::String(
                instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            Self::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), item.to_json()))
                    .collect(),
            ),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}

//! Event domain model.
//!
//! # Responsibility
//! - Define the canonical record synchronized between local state and the
//!   remote store.
//! - Provide the canonical human-readable rendering used by display and
//!   search matching.
//!
//! # Invariants
//! - `id` is stable for the record's lifetime and unique within a collection.
//! - `occurs_at` is always a concrete instant; malformed source values are
//!   normalized before construction, never stored as absent.
//! - `title`/`location` are non-empty after `validate()`; sync paths do not
//!   re-validate and must not corrupt them.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for an event record.
///
/// Locally created records get a time-based epoch-millis string; records
/// observed through the change feed keep the remote store's native key.
pub type EventId = String;

/// Validation errors for form-layer input.
///
/// Sync and feed paths never call `validate()`; these exist for the excluded
/// form collaborator to check user input before handing a record to the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    EmptyTitle,
    EmptyLocation,
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "event title must not be empty"),
            Self::EmptyLocation => write!(f, "event location must not be empty"),
        }
    }
}

impl Error for EventValidationError {}

/// Canonical record for one calendar event.
///
/// The serde surface uses camelCase names matching the canonical wire
/// aliases, so host-side JSON dumps line up with what the codec emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Stable key used for local lookup and as the remote document key.
    pub id: EventId,
    /// Event title shown in lists and matched by search.
    pub title: String,
    /// Venue or place name.
    pub location: String,
    /// When the event occurs, normalized to UTC.
    pub occurs_at: DateTime<Utc>,
}

impl EventRecord {
    /// Creates a record with a fresh time-based local id.
    ///
    /// # Invariants
    /// - The id is the creation instant in epoch milliseconds, rendered as a
    ///   decimal string.
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        occurs_at: DateTime<Utc>,
    ) -> Self {
        Self::with_id(Utc::now().timestamp_millis().to_string(), title, location, occurs_at)
    }

    /// Creates a record with a caller-provided stable id.
    ///
    /// Used by the feed path where identity already exists as the remote
    /// store's key.
    pub fn with_id(
        id: impl Into<EventId>,
        title: impl Into<String>,
        location: impl Into<String>,
        occurs_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            location: location.into(),
            occurs_at,
        }
    }

    /// Checks form-layer field constraints.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is empty or whitespace-only.
    /// - `EmptyLocation` when the location is empty or whitespace-only.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        if self.location.trim().is_empty() {
            return Err(EventValidationError::EmptyLocation);
        }
        Ok(())
    }

    /// Renders `occurs_at` in the local zone for display.
    ///
    /// Search matches against this exact rendering, so a query for a visible
    /// fragment (month abbreviation, year) hits the records showing it.
    pub fn occurs_at_display(&self) -> String {
        self.occurs_at
            .with_timezone(&Local)
            .format("%b %-d, %Y %-I:%M %p")
            .to_string()
    }
}

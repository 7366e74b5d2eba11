//! Substring filtering over event records.
//!
//! # Responsibility
//! - Match a query against title, location and the rendered date/time.
//! - Preserve collection order in every result.
//!
//! # Invariants
//! - Pure view: never mutates or clones the underlying records.
//! - Date matching uses `EventRecord::occurs_at_display`, the same renderer
//!   the display layer shows, so a query for a visible fragment matches.

use crate::model::event::EventRecord;

/// Filters records by case-insensitive substring.
///
/// A blank (empty or whitespace-only) query returns every record in
/// collection order. Otherwise a record matches when its title, location or
/// rendered date/time string contains the query, case-insensitively.
pub fn filter_events<'a>(records: &'a [EventRecord], query: &str) -> Vec<&'a EventRecord> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return records.iter().collect();
    }

    let needle = trimmed.to_lowercase();
    records
        .iter()
        .filter(|record| {
            record.title.to_lowercase().contains(&needle)
                || record.location.to_lowercase().contains(&needle)
                || record.occurs_at_display().to_lowercase().contains(&needle)
        })
        .collect()
}

//! Ordered id-to-record collection.
//!
//! # Responsibility
//! - Keep records in insertion order with position-aware removal and
//!   reinsertion for rollback paths.
//! - Enforce id uniqueness at every mutation.
//!
//! # Invariants
//! - At most one record per id.
//! - `replace` preserves the record's position; `insert` appends.
//! - Readers get `&[EventRecord]` views or cloned snapshots only.

use crate::model::event::EventRecord;

/// Ordered collection of event records, keyed by `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCollection {
    records: Vec<EventRecord>,
}

impl EventCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns whether a record with this id is present.
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Returns the index of the record with this id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }

    /// Returns the record with this id.
    pub fn get(&self, id: &str) -> Option<&EventRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Appends a record when its id is absent.
    ///
    /// Returns `false` and leaves the collection untouched when the id is
    /// already present.
    pub fn insert(&mut self, record: EventRecord) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Reinserts a record at a specific index, clamped to the current length.
    ///
    /// Used by delete rollback to restore the original position. Returns
    /// `false` when the id is already present.
    pub fn insert_at(&mut self, index: usize, record: EventRecord) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        let index = index.min(self.records.len());
        self.records.insert(index, record);
        true
    }

    /// Replaces the record sharing the input's id, preserving its position.
    ///
    /// Returns the previous value, or `None` (input dropped) when the id is
    /// absent.
    pub fn replace(&mut self, record: EventRecord) -> Option<EventRecord> {
        let index = self.position(&record.id)?;
        Some(std::mem::replace(&mut self.records[index], record))
    }

    /// Removes the record with this id, returning it with its index.
    pub fn remove(&mut self, id: &str) -> Option<(usize, EventRecord)> {
        let index = self.position(id)?;
        Some((index, self.records.remove(index)))
    }

    /// Drops every record. Used by snapshot folds before re-decoding.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Read-only view in collection order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Detached copy of the current state, safe to hand across the boundary.
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.records.clone()
    }
}

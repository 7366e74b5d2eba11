//! Domain model for the synchronized event collection.
//!
//! # Responsibility
//! - Define the canonical record shape shared by local mutation and feed paths.
//! - Keep validation and display rendering next to the data they govern.
//!
//! # Invariants
//! - Every record is identified by a stable string `EventId`.
//! - `occurs_at` is always a concrete UTC instant, never an optional value.

pub mod event;

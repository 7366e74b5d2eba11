//! Local collection state and observer fanout.
//!
//! # Responsibility
//! - Own the ordered in-memory record list mutated only through the engine.
//! - Fan out change notifications to registered observers.
//!
//! # Invariants
//! - Record ids are unique within a collection at all times.
//! - External holders only ever see an immutable view or a snapshot copy,
//!   never a mutable alias.

pub mod collection;
pub mod observers;

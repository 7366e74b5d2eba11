//! Wire-facing value model, record codec and timestamp normalization.
//!
//! # Responsibility
//! - Model the remote store's untyped payloads as a typed tagged union.
//! - Keep all permissive parsing (field aliases, timestamp shapes) in pure,
//!   side-effect-free helpers.
//!
//! # Invariants
//! - Record decoding is total except for the single isolatable shape error
//!   (`codec::DecodeError::NotAMap`).
//! - Timestamp normalization never fails and never panics.

pub mod codec;
pub mod timestamp;
pub mod value;

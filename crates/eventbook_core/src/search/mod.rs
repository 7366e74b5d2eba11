//! Query view over the local collection.
//!
//! # Responsibility
//! - Derive filtered, non-owning views of current state from a text query.
//! - Keep matching consistent with the canonical display rendering.

pub mod filter;

//! Remote synchronization: SPI contract and the optimistic engine.
//!
//! # Responsibility
//! - Define the capability contract expected from the remote collaborator.
//! - Keep local state consistent with the remote through optimistic writes
//!   and change-feed folding.
//!
//! # Invariants
//! - Remote failures never propagate to mutation callers.
//! - All state mutation happens on the owning thread; remote legs resolve
//!   through channels drained there.

pub mod engine;
pub mod remote;

//! Core library for the eventbook synchronized record store.
//!
//! Keeps an ordered in-memory event collection consistent with a remote
//! document store: optimistic local mutations with rollback on rejected
//! writes, a change-feed listener for remote updates, permissive timestamp
//! normalization, and a substring search view over the records.

pub mod logging;
pub mod model;
pub mod search;
pub mod store;
pub mod sync;
pub mod wire;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::event::{EventId, EventRecord, EventValidationError};
pub use search::filter::filter_events;
pub use store::collection::EventCollection;
pub use store::observers::{ObserverId, Observers};
pub use sync::engine::{EventStore, EventStoreConfig};
pub use sync::remote::{
    ChangeEvent, ChangeFeed, FeedPublisher, NullRemote, RemoteError, RemoteResult, RemoteStore,
    WriteCompleter, WriteTicket,
};
pub use wire::codec::{decode_entry, from_wire, to_wire, DecodeError};
pub use wire::timestamp::normalize;
pub use wire::value::{WirePayload, WireValue};

/// Liveness probe for host integrations.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

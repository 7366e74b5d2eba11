//! Remote store capability contract and deferred-outcome plumbing.
//!
//! # Responsibility
//! - Define the trait boundary the engine drives: subscribe, write, patch,
//!   delete.
//! - Carry feed events and write outcomes over channels so remote legs
//!   resolve after the local call returns.
//!
//! # Invariants
//! - A `WriteTicket` resolves at most once; a completer dropped without
//!   answering settles as `Unavailable`.
//! - The engine treats transport failure and application rejection
//!   identically (both take the rollback path).

use crate::wire::value::{WirePayload, WireValue};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure signal from the remote collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport-level failure: store unreachable or channel gone.
    Unavailable(String),
    /// Application-level rejection of a delivered request.
    Rejected(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "remote store unavailable: {reason}"),
            Self::Rejected(reason) => write!(f, "remote store rejected request: {reason}"),
        }
    }
}

impl Error for RemoteError {}

/// One change notification from the remote collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// A record appeared under `key`.
    Added { key: String, payload: WireValue },
    /// The record under `key` changed.
    Changed { key: String, payload: WireValue },
    /// The record under `key` is gone.
    Removed { key: String },
    /// Full replacement of the collection contents.
    Snapshot(Vec<(String, WireValue)>),
}

/// Receiving end of a change subscription.
///
/// Events queue here until the engine drains them on the owning thread via
/// `EventStore::pump`.
pub struct ChangeFeed {
    receiver: Receiver<ChangeEvent>,
}

impl ChangeFeed {
    /// Creates a connected publisher/feed pair.
    pub fn channel() -> (FeedPublisher, ChangeFeed) {
        let (sender, receiver) = mpsc::channel();
        (FeedPublisher { sender }, ChangeFeed { receiver })
    }

    /// Takes the next queued event without blocking.
    ///
    /// Returns `None` when the queue is empty or the publisher is gone.
    pub fn try_next(&self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Publishing end of a change subscription, held by the remote collaborator.
#[derive(Clone)]
pub struct FeedPublisher {
    sender: Sender<ChangeEvent>,
}

impl FeedPublisher {
    /// Delivers one event to the feed.
    ///
    /// A detached feed (receiver dropped) swallows the event with a warn
    /// log; publishers never observe an error.
    pub fn publish(&self, event: ChangeEvent) {
        if self.sender.send(event).is_err() {
            warn!("event=feed_publish_dropped module=sync status=ignored reason=feed_detached");
        }
    }
}

/// Deferred outcome of one remote write leg.
pub struct WriteTicket {
    receiver: Receiver<RemoteResult<()>>,
}

impl WriteTicket {
    /// Creates an unresolved ticket and the completer that resolves it.
    pub fn pending() -> (WriteCompleter, WriteTicket) {
        let (sender, receiver) = mpsc::channel();
        (WriteCompleter { sender }, WriteTicket { receiver })
    }

    /// Creates a ticket that is already resolved.
    pub fn resolved(outcome: RemoteResult<()>) -> WriteTicket {
        let (completer, ticket) = Self::pending();
        completer.complete(outcome);
        ticket
    }

    /// Polls the outcome without blocking.
    ///
    /// `None` while unresolved; a completer dropped without answering
    /// settles as `Unavailable`.
    pub fn try_outcome(&self) -> Option<RemoteResult<()>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RemoteError::Unavailable(
                "write outcome channel dropped".to_string(),
            ))),
        }
    }
}

/// Resolving end of one write leg, held by the remote collaborator.
pub struct WriteCompleter {
    sender: Sender<RemoteResult<()>>,
}

impl WriteCompleter {
    /// Resolves the paired ticket.
    ///
    /// The engine may already have discarded the ticket; delivery failure is
    /// not observable and not an error.
    pub fn complete(self, outcome: RemoteResult<()>) {
        let _ = self.sender.send(outcome);
    }
}

/// Capability contract the engine expects from the remote collaborator.
///
/// Methods take `&self`; implementations needing mutability use interior
/// state. One instance represents one logical connection owned by one
/// store.
pub trait RemoteStore {
    /// Opens the change feed for one collection.
    ///
    /// # Errors
    /// - `Unavailable` when the feed cannot be established; the engine then
    ///   degrades to local-only behavior.
    fn subscribe(&self, collection: &str) -> RemoteResult<ChangeFeed>;

    /// Creates or replaces the document under `key`.
    fn write(&self, collection: &str, key: &str, payload: WirePayload) -> WriteTicket;

    /// Merges fields into the document under `key`.
    fn patch(&self, collection: &str, key: &str, payload: WirePayload) -> WriteTicket;

    /// Deletes the document under `key`.
    fn delete(&self, collection: &str, key: &str) -> WriteTicket;
}

/// Remote that is explicitly absent: local-only mode.
///
/// Subscription is unavailable and every write resolves as success, so
/// local mutations stand while remote persistence silently no-ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRemote;

impl RemoteStore for NullRemote {
    fn subscribe(&self, _collection: &str) -> RemoteResult<ChangeFeed> {
        Err(RemoteError::Unavailable(
            "no remote store configured".to_string(),
        ))
    }

    fn write(&self, _collection: &str, _key: &str, _payload: WirePayload) -> WriteTicket {
        WriteTicket::resolved(Ok(()))
    }

    fn patch(&self, _collection: &str, _key: &str, _payload: WirePayload) -> WriteTicket {
        WriteTicket::resolved(Ok(()))
    }

    fn delete(&self, _collection: &str, _key: &str) -> WriteTicket {
        WriteTicket::resolved(Ok(()))
    }
}

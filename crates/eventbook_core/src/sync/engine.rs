//! Optimistic mutation engine and change-feed folding.
//!
//! # Responsibility
//! - Apply local mutations immediately and reconcile them with deferred
//!   remote outcomes.
//! - Fold incremental and snapshot change notifications into local state.
//!
//! # Invariants
//! - Mutation callers never observe a remote failure; they see the local
//!   change stand or get rolled back.
//! - Observers are notified once per optimistic mutation, once per
//!   reconciliation rollback, once per folded incremental event, and once
//!   per snapshot.
//! - Rollbacks are stale-guarded: a failure outcome only reverts state that
//!   still matches what that write produced.

use crate::model::event::{EventId, EventRecord};
use crate::search::filter::filter_events;
use crate::store::collection::EventCollection;
use crate::store::observers::{ObserverId, Observers};
use crate::sync::remote::{ChangeEvent, ChangeFeed, RemoteError, RemoteStore, WriteTicket};
use crate::wire::codec;
use log::{debug, warn};
use std::sync::Arc;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStoreConfig {
    /// Remote collection key the store binds to.
    pub collection: String,
}

impl EventStoreConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self::new("events")
    }
}

/// Compensation plan recorded alongside each in-flight remote write.
enum Reconcile {
    Create {
        id: EventId,
        written: EventRecord,
    },
    Update {
        id: EventId,
        previous: EventRecord,
        written: EventRecord,
    },
    Delete {
        index: usize,
        removed: EventRecord,
    },
}

impl Reconcile {
    fn op(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    fn id(&self) -> &str {
        match self {
            Self::Create { id, .. } => id,
            Self::Update { id, .. } => id,
            Self::Delete { removed, .. } => &removed.id,
        }
    }
}

struct PendingWrite {
    ticket: WriteTicket,
    reconcile: Reconcile,
}

/// Client-side store keeping one local collection consistent with one
/// remote collection.
///
/// Single-owner and thread-affine: local mutations, feed folds (`pump`) and
/// write reconciliation (`settle`) all run on the owning thread, so no two
/// mutations of the collection ever race.
pub struct EventStore {
    remote: Arc<dyn RemoteStore>,
    config: EventStoreConfig,
    events: EventCollection,
    observers: Observers,
    feed: Option<ChangeFeed>,
    pending: Vec<PendingWrite>,
    initialized: bool,
}

impl EventStore {
    /// Creates a store bound to the default collection.
    ///
    /// Does not subscribe; call [`connect`](Self::connect) to attach the
    /// change feed.
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self::with_config(remote, EventStoreConfig::default())
    }

    pub fn with_config(remote: Arc<dyn RemoteStore>, config: EventStoreConfig) -> Self {
        Self {
            remote,
            config,
            events: EventCollection::new(),
            observers: Observers::new(),
            feed: None,
            pending: Vec::new(),
            initialized: false,
        }
    }

    /// Attempts to attach the change feed.
    ///
    /// Returns whether the feed is live. On failure the store stays usable
    /// in local-only mode and local state is untouched.
    pub fn connect(&mut self) -> bool {
        match self.remote.subscribe(&self.config.collection) {
            Ok(feed) => {
                self.feed = Some(feed);
                debug!(
                    "event=feed_attach module=sync status=ok collection={}",
                    self.config.collection
                );
                true
            }
            Err(err) => {
                self.feed = None;
                warn!(
                    "event=feed_attach module=sync status=degraded collection={} reason={}",
                    self.config.collection, err
                );
                false
            }
        }
    }

    /// Detaches the change feed; further remote changes no longer fold.
    ///
    /// Write legs already in flight still settle through
    /// [`settle`](Self::settle) against whatever state exists then.
    pub fn disconnect(&mut self) {
        self.feed = None;
    }

    /// Whether the change feed is attached.
    pub fn is_live(&self) -> bool {
        self.feed.is_some()
    }

    /// Whether a snapshot fold has initialized the collection.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of in-flight remote writes not yet settled.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Read-only view of the collection in its current order.
    pub fn records(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Detached copy of the collection.
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.events.snapshot()
    }

    /// Registers a state-change observer.
    pub fn subscribe_observer(&mut self, observer: impl Fn() + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Removes a state-change observer.
    pub fn unsubscribe_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Filters the collection by a text query.
    ///
    /// Blank queries return every record in order; see `search::filter`.
    pub fn search(&self, query: &str) -> Vec<&EventRecord> {
        filter_events(self.events.records(), query)
    }

    /// Inserts a record locally and writes it through to the remote.
    ///
    /// Policy: failed creates roll back. The remote contract always
    /// surfaces a write outcome, so a failed create removes the local copy
    /// again rather than tolerating it.
    ///
    /// A duplicate id is a logged no-op (id-uniqueness invariant).
    pub fn create(&mut self, record: EventRecord) {
        if self.events.contains(&record.id) {
            warn!(
                "event=duplicate_create module=store status=ignored id={}",
                record.id
            );
            return;
        }

        let written = record.clone();
        self.events.insert(record);
        self.observers.notify();

        let ticket = self
            .remote
            .write(&self.config.collection, &written.id, codec::to_wire(&written));
        self.pending.push(PendingWrite {
            ticket,
            reconcile: Reconcile::Create {
                id: written.id.clone(),
                written,
            },
        });
    }

    /// Replaces the record under `id` in place and patches the remote
    /// document.
    ///
    /// An absent `id` is a no-op, not an error. The stored record keeps
    /// `id` as its identity even when the input carries a different one.
    pub fn update(&mut self, id: &str, record: EventRecord) {
        if !self.events.contains(id) {
            return;
        }

        let mut written = record;
        written.id = id.to_string();

        let Some(previous) = self.events.replace(written.clone()) else {
            return;
        };
        self.observers.notify();

        let ticket = self
            .remote
            .patch(&self.config.collection, id, codec::to_wire(&written));
        self.pending.push(PendingWrite {
            ticket,
            reconcile: Reconcile::Update {
                id: id.to_string(),
                previous,
                written,
            },
        });
    }

    /// Removes the record under `id` and deletes the remote document.
    ///
    /// An absent `id` is a no-op, not an error.
    pub fn delete(&mut self, id: &str) {
        let Some((index, removed)) = self.events.remove(id) else {
            return;
        };
        self.observers.notify();

        let ticket = self.remote.delete(&self.config.collection, id);
        self.pending.push(PendingWrite {
            ticket,
            reconcile: Reconcile::Delete { index, removed },
        });
    }

    /// Drains queued feed events into local state.
    ///
    /// Returns the number of events folded. Decode failures are isolated
    /// per entry and logged, never aborting the fold.
    pub fn pump(&mut self) -> usize {
        let mut folded = 0;
        loop {
            let Some(event) = self.feed.as_ref().and_then(ChangeFeed::try_next) else {
                break;
            };
            self.fold(event);
            folded += 1;
        }
        folded
    }

    /// Polls in-flight write outcomes and reconciles failures.
    ///
    /// Returns the number of writes settled; unresolved tickets stay
    /// pending. Rollbacks are stale-guarded: when two writes to one id
    /// settle out of order, a late failure must not revert a newer value.
    pub fn settle(&mut self) -> usize {
        let mut settled = 0;
        let pending = std::mem::take(&mut self.pending);
        for write in pending {
            match write.ticket.try_outcome() {
                None => self.pending.push(write),
                Some(Ok(())) => {
                    settled += 1;
                    debug!(
                        "event=write_settled module=sync status=ok op={} id={}",
                        write.reconcile.op(),
                        write.reconcile.id()
                    );
                }
                Some(Err(err)) => {
                    settled += 1;
                    self.roll_back(write.reconcile, &err);
                }
            }
        }
        settled
    }

    fn fold(&mut self, event: ChangeEvent) {
        match event {
            ChangeEvent::Added { key, payload } => match codec::decode_entry(&key, &payload) {
                Ok(record) => {
                    // Replayed keys are already present; adding again is a
                    // no-op.
                    if self.events.insert(record) {
                        self.observers.notify();
                    }
                }
                Err(err) => warn!(
                    "event=feed_entry_skipped module=sync status=error key={key} reason={err}"
                ),
            },
            ChangeEvent::Changed { key, payload } => match codec::decode_entry(&key, &payload) {
                Ok(record) => {
                    // Out-of-order delivery for unknown keys is a no-op.
                    if self.events.replace(record).is_some() {
                        self.observers.notify();
                    }
                }
                Err(err) => warn!(
                    "event=feed_entry_skipped module=sync status=error key={key} reason={err}"
                ),
            },
            ChangeEvent::Removed { key } => {
                if self.events.remove(&key).is_some() {
                    self.observers.notify();
                }
            }
            ChangeEvent::Snapshot(entries) => {
                self.events.clear();
                for (key, payload) in &entries {
                    match codec::decode_entry(key, payload) {
                        Ok(record) => {
                            if !self.events.insert(record) {
                                warn!(
                                    "event=feed_entry_skipped module=sync status=error key={key} reason=duplicate_key"
                                );
                            }
                        }
                        Err(err) => warn!(
                            "event=feed_entry_skipped module=sync status=error key={key} reason={err}"
                        ),
                    }
                }
                self.initialized = true;
                // One notification per snapshot, not one per entry.
                self.observers.notify();
            }
        }
    }

    fn roll_back(&mut self, reconcile: Reconcile, err: &RemoteError) {
        let op = reconcile.op();
        match reconcile {
            Reconcile::Create { id, written } => {
                // Stale guard: only revert the exact value this write put
                // in place.
                if self.events.get(&id) == Some(&written) {
                    self.events.remove(&id);
                    warn!(
                        "event=write_rollback module=sync status=rolled_back op={op} id={id} reason={err}"
                    );
                    self.observers.notify();
                } else {
                    warn!(
                        "event=write_rollback_stale module=sync status=skipped op={op} id={id} reason={err}"
                    );
                }
            }
            Reconcile::Update {
                id,
                previous,
                written,
            } => {
                if self.events.get(&id) == Some(&written) {
                    self.events.replace(previous);
                    warn!(
                        "event=write_rollback module=sync status=rolled_back op={op} id={id} reason={err}"
                    );
                    self.observers.notify();
                } else {
                    warn!(
                        "event=write_rollback_stale module=sync status=skipped op={op} id={id} reason={err}"
                    );
                }
            }
            Reconcile::Delete { index, removed } => {
                let id = removed.id.clone();
                if self.events.contains(&id) {
                    // Re-created or re-observed since; the newer value wins.
                    warn!(
                        "event=write_rollback_stale module=sync status=skipped op={op} id={id} reason={err}"
                    );
                } else {
                    self.events.insert_at(index, removed);
                    warn!(
                        "event=write_rollback module=sync status=rolled_back op={op} id={id} reason={err}"
                    );
                    self.observers.notify();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventStore, EventStoreConfig};
    use crate::model::event::EventRecord;
    use crate::sync::remote::NullRemote;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn local_store() -> EventStore {
        EventStore::new(Arc::new(NullRemote))
    }

    fn record(id: &str, title: &str) -> EventRecord {
        let occurs_at = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        EventRecord::with_id(id, title, "Hall A", occurs_at)
    }

    #[test]
    fn default_config_binds_events_collection() {
        assert_eq!(EventStoreConfig::default().collection, "events");
        assert_eq!(EventStoreConfig::new("agenda").collection, "agenda");
    }

    #[test]
    fn connect_degrades_without_a_remote_feed() {
        let mut store = local_store();
        assert!(!store.connect());
        assert!(!store.is_live());
        assert!(store.is_empty());
    }

    #[test]
    fn local_only_create_survives_settle() {
        let mut store = local_store();
        store.create(record("1", "Tech Meetup"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.pending_writes(), 1);

        let settled = store.settle();
        assert_eq!(settled, 1);
        assert_eq!(store.pending_writes(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_create_is_ignored() {
        let mut store = local_store();
        store.create(record("1", "first"));
        store.create(record("1", "shadow"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].title, "first");
        assert_eq!(store.pending_writes(), 1);
    }

    #[test]
    fn update_and_delete_on_unknown_ids_are_no_ops() {
        let mut store = local_store();
        store.update("ghost", record("ghost", "nope"));
        store.delete("ghost");

        assert!(store.is_empty());
        assert_eq!(store.pending_writes(), 0);
    }

    #[test]
    fn update_forces_identity_to_target_id() {
        let mut store = local_store();
        store.create(record("1", "first"));
        store.update("1", record("999", "renamed"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].id, "1");
        assert_eq!(store.records()[0].title, "renamed");
    }

    #[test]
    fn search_delegates_to_filter() {
        let mut store = local_store();
        store.create(record("1", "Tech Meetup"));
        store.create(record("2", "Art Show"));

        let hits = store.search("tech");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
        assert_eq!(store.search("").len(), 2);
    }

    #[test]
    fn observer_handles_subscribe_and_unsubscribe() {
        let mut store = local_store();
        let id = store.subscribe_observer(|| {});
        assert!(store.unsubscribe_observer(id));
        assert!(!store.unsubscribe_observer(id));
    }
}

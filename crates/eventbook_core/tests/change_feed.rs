use chrono::{TimeZone, Utc};
use eventbook_core::{
    to_wire, ChangeEvent, ChangeFeed, EventRecord, EventStore, FeedPublisher, RemoteError,
    RemoteResult, RemoteStore, WirePayload, WireValue, WriteTicket,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

/// Remote double exposing only the feed side; writes always succeed.
struct FeedRemote {
    subscribe_ok: bool,
    publisher: RefCell<Option<FeedPublisher>>,
}

impl FeedRemote {
    fn new(subscribe_ok: bool) -> Arc<Self> {
        Arc::new(Self {
            subscribe_ok,
            publisher: RefCell::new(None),
        })
    }

    fn publish(&self, event: ChangeEvent) {
        self.publisher
            .borrow()
            .as_ref()
            .expect("feed should be subscribed")
            .publish(event);
    }
}

impl RemoteStore for FeedRemote {
    fn subscribe(&self, _collection: &str) -> RemoteResult<ChangeFeed> {
        if !self.subscribe_ok {
            return Err(RemoteError::Unavailable("scripted outage".to_string()));
        }
        let (publisher, feed) = ChangeFeed::channel();
        *self.publisher.borrow_mut() = Some(publisher);
        Ok(feed)
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

fn record(id: &str, title: &str, location: &str) -> EventRecord {
    let occurs_at = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
    EventRecord::with_id(id, title, location, occurs_at)
}

fn payload_for(record: &EventRecord) -> WireValue {
    WireValue::Map(to_wire(record))
}

fn connected_store(remote: &Arc<FeedRemote>) -> EventStore {
    let mut store = EventStore::new(Arc::clone(remote) as Arc<dyn RemoteStore>);
    assert!(store.connect());
    store
}

#[test]
fn added_events_are_idempotent_per_key() {
    let remote = FeedRemote::new(true);
    let mut store = connected_store(&remote);

    let added = ChangeEvent::Added {
        key: "1".to_string(),
        payload: payload_for(&record("1", "Tech Meetup", "Hall A")),
    };
    remote.publish(added.clone());
    remote.publish(added);

    assert_eq!(store.pump(), 2);
    assert_eq!(store.len(), 1);
    assert_eq!(store.records()[0].title, "Tech Meetup");
}

#[test]
fn changed_and_removed_for_unknown_keys_are_no_ops() {
    let remote = FeedRemote::new(true);
    let mut store = connected_store(&remote);

    let notifications = Rc::new(Cell::new(0u32));
    let probe = Rc::clone(&notifications);
    store.subscribe_observer(move || probe.set(probe.get() + 1));

    remote.publish(ChangeEvent::Changed {
        key: "ghost".to_string(),
        payload: payload_for(&record("ghost", "Phantom", "Nowhere")),
    });
    remote.publish(ChangeEvent::Removed {
        key: "ghost".to_string(),
    });

    assert_eq!(store.pump(), 2);
    assert!(store.is_empty());
    assert_eq!(notifications.get(), 0);
}

#[test]
fn changed_replaces_record_in_place() {
    let remote = FeedRemote::new(true);
    let mut store = connected_store(&remote);

    remote.publish(ChangeEvent::Added {
        key: "1".to_string(),
        payload: payload_for(&record("1", "Opening", "Hall A")),
    });
    remote.publish(ChangeEvent::Added {
        key: "2".to_string(),
        payload: payload_for(&record("2", "Keynote", "Hall B")),
    });
    remote.publish(ChangeEvent::Changed {
        key: "1".to_string(),
        payload: payload_for(&record("1", "Opening Remarks", "Hall A")),
    });
    assert_eq!(store.pump(), 3);

    let titles: Vec<&str> = store.records().iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Opening Remarks", "Keynote"]);
}

#[test]
fn added_without_payload_id_takes_identity_from_the_key() {
    let remote = FeedRemote::new(true);
    let mut store = connected_store(&remote);

    let mut payload = WirePayload::new();
    payload.insert("title".to_string(), WireValue::Text("Keyed".to_string()));
    remote.publish(ChangeEvent::Added {
        key: "from-key".to_string(),
        payload: WireValue::Map(payload),
    });

    assert_eq!(store.pump(), 1);
    assert_eq!(store.records()[0].id, "from-key");
}

#[test]
fn snapshot_replaces_state_skips_bad_entries_and_notifies_once() {
    let remote = FeedRemote::new(true);
    let mut store = connected_store(&remote);
    store.create(record("stale", "Local Draft", "Hall Z"));
    assert!(!store.is_initialized());

    let notifications = Rc::new(Cell::new(0u32));
    let probe = Rc::clone(&notifications);
    store.subscribe_observer(move || probe.set(probe.get() + 1));

    remote.publish(ChangeEvent::Snapshot(vec![
        (
            "1".to_string(),
            payload_for(&record("1", "Opening", "Hall A")),
        ),
        ("broken".to_string(), WireValue::Text("oops".to_string())),
        (
            "2".to_string(),
            payload_for(&record("2", "Keynote", "Hall B")),
        ),
    ]));
    assert_eq!(store.pump(), 1);

    assert!(store.is_initialized());
    assert_eq!(notifications.get(), 1);
    let ids: Vec<&str> = store.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);
}

#[test]
fn subscribe_failure_degrades_to_local_only_mode() {
    let remote = FeedRemote::new(false);
    let mut store = EventStore::new(remote as Arc<dyn RemoteStore>);

    assert!(!store.connect());
    assert!(!store.is_live());
    assert_eq!(store.pump(), 0);

    store.create(record("1", "Tech Meetup", "Hall A"));
    assert_eq!(store.settle(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn disconnect_stops_folding_further_events() {
    let remote = FeedRemote::new(true);
    let mut store = connected_store(&remote);

    remote.publish(ChangeEvent::Added {
        key: "1".to_string(),
        payload: payload_for(&record("1", "Opening", "Hall A")),
    });
    assert_eq!(store.pump(), 1);

    store.disconnect();
    assert!(!store.is_live());
    remote.publish(ChangeEvent::Added {
        key: "2".to_string(),
        payload: payload_for(&record("2", "Keynote", "Hall B")),
    });
    assert_eq!(store.pump(), 0);
    assert_eq!(store.len(), 1);
}

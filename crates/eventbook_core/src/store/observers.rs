//! Observer subject for state-change notification.
//!
//! # Responsibility
//! - Hold registered observers and invoke them on demand.
//! - Hand out ids so callers can unsubscribe without keeping closures
//!   comparable.
//!
//! # Invariants
//! - Callbacks receive no payload: they signal "state changed" and hosts
//!   re-read the collection afterwards.
//! - Callbacks run synchronously on the owner's thread and must not
//!   re-enter the owning store.

/// Handle returned by [`Observers::subscribe`].
pub type ObserverId = u64;

type ObserverFn = Box<dyn Fn()>;

/// Subject holding state-change observers.
#[derive(Default)]
pub struct Observers {
    next_id: ObserverId,
    entries: Vec<(ObserverId, ObserverFn)>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers one observer and returns its handle.
    pub fn subscribe(&mut self, observer: impl Fn() + 'static) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Box::new(observer)));
        id
    }

    /// Removes one observer by handle.
    ///
    /// Returns `false` when the handle is unknown (already removed or never
    /// issued).
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Invokes every registered observer in subscription order.
    pub fn notify(&self) {
        for (_, observer) in &self.entries {
            observer();
        }
    }
}

//! Synchronous change notification for entities.
//!
//! Each entity carries its own observer list. Dispatch happens in line with
//! the mutating call, in registration order, and completes before that call
//! returns. A [`Subscription`] is the cancellation handle; cancelling takes
//! effect immediately, even against an event currently being dispatched.

use std::cell::Cell;
use std::rc::Rc;

use crate::entity::Entity;
use crate::key::TypeKey;

// ---------------------------------------------------------------------------
// EntityChange
// ---------------------------------------------------------------------------

/// A change that an entity's observers are told about.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityChange {
    /// A component was stored under `key`. Fired once the map holds the new
    /// instance; on replacement it follows an
    /// [`EntityChange::ComponentRemoved`] for the same key.
    ComponentAdded { key: TypeKey },
    /// The component under `key` left the map, by explicit removal or by
    /// replacement. Fired once the entry is gone.
    ComponentRemoved { key: TypeKey },
    /// The entity was renamed. Carries the name it had before; the entity
    /// already answers to the new one.
    Renamed { previous: String },
}

/// Boxed observer callback as stored by an entity.
pub(crate) type BoxedObserver = Box<dyn FnMut(&Entity, &EntityChange)>;

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Cancellation handle returned by [`Entity::observe`].
///
/// Dropping the handle leaves the subscription running; only
/// [`cancel`](Subscription::cancel) ends it.
#[derive(Debug, Clone)]
pub struct Subscription {
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// End the subscription.
    ///
    /// Effective immediately: cancelled during a dispatch, the observer is
    /// skipped for the remainder of that same event.
    pub fn cancel(&self) {
        self.active.set(false);
    }

    /// Whether the subscription still receives events.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

// ---------------------------------------------------------------------------
// ObserverSet
// ---------------------------------------------------------------------------

/// Registration-ordered observer list carried by each entity.
#[derive(Default)]
pub(crate) struct ObserverSet {
    entries: Vec<ObserverEntry>,
}

struct ObserverEntry {
    active: Rc<Cell<bool>>,
    observer: BoxedObserver,
}

impl ObserverSet {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, observer: BoxedObserver) -> Subscription {
        self.prune();
        let active = Rc::new(Cell::new(true));
        self.entries.push(ObserverEntry {
            active: Rc::clone(&active),
            observer,
        });
        Subscription { active }
    }

    /// Call every active observer in registration order.
    ///
    /// The flag is read per call, so a cancellation performed by an earlier
    /// observer silences later ones within the same event.
    pub(crate) fn dispatch(&mut self, entity: &Entity, change: &EntityChange) {
        for entry in self.entries.iter_mut() {
            if entry.active.get() {
                (entry.observer)(entity, change);
            }
        }
        self.prune();
    }

    /// Number of subscriptions that would still receive an event.
    pub(crate) fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.active.get()).count()
    }

    fn prune(&mut self) {
        self.entries.retain(|e| e.active.get());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

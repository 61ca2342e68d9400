//! Typed event bus
//!
//! Presentation layers subscribe to state changes instead of polling. Each
//! event type declares a `Kind` so subscriptions are checked at compile time
//! rather than matched on strings.

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An event that can be published on an [`EventBus`]
pub trait Event: Send + Sync + 'static {
    /// Discriminant used to subscribe to one kind of event
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listener<E: Event> {
    id: SubscriptionId,
    /// `None` receives every event
    kind: Option<E::Kind>,
    handler: Handler<E>,
}

struct BusState<E: Event> {
    next_id: u64,
    listeners: Vec<Listener<E>>,
}

/// Synchronous publish/subscribe hub
///
/// Handlers run on the emitting thread, in subscription order. The internal
/// lock is released before handlers run, so a handler may subscribe or
/// unsubscribe.
pub struct EventBus<E: Event> {
    state: Mutex<BusState<E>>,
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BusState {
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, BusState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add(&self, kind: Option<E::Kind>, handler: Handler<E>) -> SubscriptionId {
        let mut state = self.state();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.listeners.push(Listener { id, kind, handler });
        id
    }

    /// Receive events of one kind
    pub fn subscribe<F>(&self, kind: E::Kind, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.add(Some(kind), Arc::new(handler))
    }

    /// Receive every event
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.add(None, Arc::new(handler))
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state();
        let before = state.listeners.len();
        state.listeners.retain(|listener| listener.id != id);
        state.listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        let kind = event.kind();
        let handlers: Vec<Handler<E>> = self
            .state()
            .listeners
            .iter()
            .filter(|listener| listener.kind.map_or(true, |k| k == kind))
            .map(|listener| Arc::clone(&listener.handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

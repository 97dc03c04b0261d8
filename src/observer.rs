//! Document observer fan-out
//!
//! Commands report structural changes through a [`DocEvent`] naming the
//! document, the sprite and the layer that should become the focal point
//! (for instance the timeline's selected row). Events carry identifiers
//! only, so observers can look but never reach back into the tree while
//! the event is being delivered.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::doc::{DocumentId, LayerId, SpriteId};

/// Notification that a document's layer structure changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocEvent {
    pub document: DocumentId,
    pub sprite: SpriteId,
    pub layer: LayerId,
}

/// Receiver of document events
pub trait DocObserver: Send {
    /// Called synchronously at the end of execute, undo and redo.
    fn on_layers_changed(&mut self, ev: &DocEvent);
}

/// Handle returned by [`ObserverBus::add_observer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers, notified in registration order
#[derive(Default)]
pub struct ObserverBus {
    observers: Vec<(ObserverId, Box<dyn DocObserver>)>,
    next_id: u64,
}

impl ObserverBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, observer: Box<dyn DocObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Unregister an observer. Returns false if the id is unknown.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&mut self, ev: &DocEvent) {
        for (_, observer) in &mut self.observers {
            observer.on_layers_changed(ev);
        }
    }
}

impl fmt::Debug for ObserverBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Shared view of the events captured by a [`RecordingObserver`]
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<DocEvent>>>);

impl EventLog {
    pub fn snapshot(&self) -> Vec<DocEvent> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    pub fn last(&self) -> Option<DocEvent> {
        self.0.lock().last().copied()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Observer that appends every event to an [`EventLog`]
#[derive(Debug, Default)]
pub struct RecordingObserver {
    log: EventLog,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the captured events; stays valid after the observer is
    /// boxed and registered
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

impl DocObserver for RecordingObserver {
    fn on_layers_changed(&mut self, ev: &DocEvent) {
        log::debug!("observed layer change, focus {}", ev.layer);
        self.log.0.lock().push(*ev);
    }
}

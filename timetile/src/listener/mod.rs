//! Load notifications.
//!
//! Observers (typically the chart container, which repaints on any change)
//! register a [`LoadListener`] with the scheduler. Notifications carry no
//! payload: a listener that wants data re-queries the selector.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

/// Receives load outcome notifications.
///
/// Called synchronously from the scheduler's completion handling, once per
/// successful load and once per failed attempt.
pub trait LoadListener: Send + Sync {
    /// A tile was loaded and stored.
    fn on_load_success(&self);

    /// A fetch attempt failed.
    fn on_load_failure(&self);
}

/// Handle returned by [`ListenerRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Set of registered listeners.
///
/// No ordering is guaranteed among listeners. Notification iterates over a
/// snapshot of the set taken before the first call.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: HashMap<ListenerId, Arc<dyn LoadListener>>,
    next_id: u64,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe(&mut self, listener: Arc<dyn LoadListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Tell every listener a tile loaded.
    pub fn notify_success(&self) {
        for listener in self.snapshot() {
            listener.on_load_success();
        }
    }

    /// Tell every listener a fetch attempt failed.
    pub fn notify_failure(&self) {
        for listener in self.snapshot() {
            listener.on_load_failure();
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn LoadListener>> {
        self.listeners.values().cloned().collect()
    }
}

/// Load outcome forwarded by [`ChannelListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    /// A tile was loaded.
    Success,
    /// A fetch attempt failed.
    Failure,
}

/// Listener that forwards notifications over a channel.
///
/// Lets a consumer on another task (a repaint loop, a test) observe loads
/// without sharing the scheduler. Events sent after the receiver is dropped
/// are discarded.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<LoadEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LoadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LoadListener for ChannelListener {
    fn on_load_success(&self) {
        let _ = self.tx.send(LoadEvent::Success);
    }

    fn on_load_failure(&self) {
        let _ = self.tx.send(LoadEvent::Failure);
    }
}

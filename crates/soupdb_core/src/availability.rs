//! Protected-storage availability signal.
//!
//! The host platform tells the signal when encrypted file storage becomes
//! readable (device unlocked) or is about to become unreadable (device
//! locking). Stores poll it through
//! [`Store::is_file_data_protection_active`](crate::Store::is_file_data_protection_active),
//! and interested parties can subscribe to the transitions.
//!
//! ```rust,ignore
//! let signal = Arc::new(AvailabilitySignal::new());
//! let rx = signal.subscribe();
//! signal.notify(AvailabilityEvent::BecameAvailable);
//! assert_eq!(rx.recv()?, AvailabilityEvent::BecameAvailable);
//! ```

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

/// A transition reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityEvent {
    /// Protected files can be read and written.
    BecameAvailable,
    /// Protected files are about to become unreadable.
    WillBecomeUnavailable,
}

/// Tracks whether protected file storage is currently available.
///
/// Starts out unavailable until the host says otherwise.
pub struct AvailabilitySignal {
    available: AtomicBool,
    subscribers: RwLock<Vec<Sender<AvailabilityEvent>>>,
}

impl AvailabilitySignal {
    /// Creates a signal in the unavailable state.
    pub fn new() -> Self {
        Self::with_initial(false)
    }

    /// Creates a signal with a known initial state.
    pub fn with_initial(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Records a transition and forwards it to subscribers.
    pub fn notify(&self, event: AvailabilityEvent) {
        let available = event == AvailabilityEvent::BecameAvailable;
        self.available.store(available, Ordering::SeqCst);
        tracing::debug!(target: "soupdb::availability", ?event, "protected storage transition");

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// True if the last reported transition made storage available.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Subscribes to future transitions.
    pub fn subscribe(&self) -> Receiver<AvailabilityEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for AvailabilitySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AvailabilitySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilitySignal")
            .field("available", &self.is_available())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn starts_unavailable() {
        assert!(!AvailabilitySignal::new().is_available());
        assert!(AvailabilitySignal::with_initial(true).is_available());
    }

    #[test]
    fn transitions_flip_state() {
        let signal = AvailabilitySignal::new();
        signal.notify(AvailabilityEvent::BecameAvailable);
        assert!(signal.is_available());
        signal.notify(AvailabilityEvent::WillBecomeUnavailable);
        assert!(!signal.is_available());
    }

    #[test]
    fn subscribers_receive_events() {
        let signal = AvailabilitySignal::new();
        let rx1 = signal.subscribe();
        let rx2 = signal.subscribe();

        signal.notify(AvailabilityEvent::BecameAvailable);

        assert_eq!(rx1.recv().unwrap(), AvailabilityEvent::BecameAvailable);
        assert_eq!(rx2.recv().unwrap(), AvailabilityEvent::BecameAvailable);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let signal = AvailabilitySignal::new();
        let rx = signal.subscribe();
        assert_eq!(signal.subscriber_count(), 1);

        drop(rx);
        signal.notify(AvailabilityEvent::WillBecomeUnavailable);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn notify_from_another_thread() {
        let signal = Arc::new(AvailabilitySignal::new());
        let rx = signal.subscribe();

        let remote = Arc::clone(&signal);
        thread::spawn(move || remote.notify(AvailabilityEvent::BecameAvailable))
            .join()
            .unwrap();

        let event = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(event, AvailabilityEvent::BecameAvailable);
        assert!(signal.is_available());
    }
}

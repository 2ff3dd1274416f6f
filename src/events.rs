//! The application wide notification channel.
//!
//! Controllers publish an [AppEvent] after a successful mutation instead of
//! refreshing other widgets themselves. Anything that shows server state
//! subscribes and re-renders when told to.

use tokio::sync::broadcast;

/// How many unread events a slow subscriber may fall behind by.
const EVENT_CAPACITY: usize = 16;

/// Something other parts of the UI need to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Server state changed, every view should re-render from its cached query.
    Refresh,
}

/// A cloneable publish/subscribe handle for [AppEvent]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// A bus without subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`, returning how many subscribers will see it.
    pub fn publish(&self, event: AppEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!("Published {event:?} to {receivers} subscriber(s)");
                receivers
            }
            Err(_) => {
                tracing::debug!("Published {event:?} without subscribers");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

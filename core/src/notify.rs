//! Notification side-channel: in-process publish/subscribe.
//!
//! RULE: publishing is fire-and-forget. A slow, missing, or dropped
//! subscriber can never fail or block a core mutation.

use crate::event::{event_type_name, DeskEvent};
use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Default)]
pub struct NotificationHub {
    subscribers: Vec<Sender<DeskEvent>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register an observer. The receiver may be dropped at any time;
    /// nothing tracks it beyond the next publish.
    pub fn subscribe(&mut self) -> Receiver<DeskEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber. An unbounded send never
    /// blocks; disconnected subscribers are pruned and the failure swallowed.
    pub fn publish(&mut self, event: DeskEvent) {
        log::debug!("notify: {}", event_type_name(&event));
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

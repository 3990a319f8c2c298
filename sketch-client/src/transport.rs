use sketch_types::{DrawClientMessage, PhaseClientMessage};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel is not connected")]
    NotConnected,
    #[error("channel is closed")]
    Closed,
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Outbound side of the phase channel. Retry/reconnect policy lives behind
/// this boundary, not in the core. `close` must be idempotent.
pub trait PhaseTransport {
    fn send(&mut self, msg: &PhaseClientMessage) -> Result<(), TransportError>;
    fn is_connected(&self) -> bool;
    fn close(&mut self);
}

/// Outbound side of the drawing channel, independent of the phase channel.
pub trait DrawTransport {
    fn send(&mut self, msg: &DrawClientMessage) -> Result<(), TransportError>;
    fn is_connected(&self) -> bool;
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Single-threaded subscriber registry with explicit unsubscribe and an
/// idempotent teardown, so no handler leaks across reconnects and nothing
/// fires after the owning component is torn down.
pub struct EventHub<E> {
    handlers: Vec<(SubscriptionId, Box<dyn FnMut(&E)>)>,
    next_id: u64,
    torn_down: bool,
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventHub<E> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
            torn_down: false,
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        if self.torn_down {
            warn!("subscribe after teardown; handler dropped");
        } else {
            self.handlers.push((id, Box::new(handler)));
        }
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

    /// Detach every handler; safe to call more than once.
    pub fn teardown(&mut self) {
        self.handlers.clear();
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter() -> (Rc<RefCell<u32>>, impl FnMut(&u32)) {
        let count = Rc::new(RefCell::new(0));
        let inner = count.clone();
        (count, move |_: &u32| *inner.borrow_mut() += 1)
    }

    #[test]
    fn test_subscribe_and_emit() {
        let mut hub = EventHub::new();
        let (count, handler) = counter();
        hub.subscribe(handler);
        hub.emit(&1);
        hub.emit(&2);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_unsubscribe_detaches_handler() {
        let mut hub = EventHub::new();
        let (count, handler) = counter();
        let id = hub.subscribe(handler);
        hub.emit(&1);
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.emit(&2);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_teardown_is_idempotent_and_final() {
        let mut hub = EventHub::new();
        let (count, handler) = counter();
        hub.subscribe(handler);
        hub.teardown();
        hub.teardown();
        hub.emit(&1);
        assert_eq!(*count.borrow(), 0);
        assert!(hub.is_torn_down());

        // Late subscribers never fire either.
        let (late_count, late_handler) = counter();
        hub.subscribe(late_handler);
        hub.emit(&1);
        assert_eq!(*late_count.borrow(), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }
}

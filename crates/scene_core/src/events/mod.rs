//! Event manager
//!
//! Subscriptions are keyed by `(event type, subscriber, sender)`:
//! - Handler returns bool (true = consumed, stops forwarding)
//! - A subscription with no sender filter hears every sender
//! - `send` queues for broadcast on the next `dispatch`
//! - `send_to` delivers synchronously to exactly one subscriber

use std::collections::HashMap;

use log::{error, warn};
use slotmap::{new_key_type, SlotMap};

use crate::config::EventLimits;
use crate::scene::EntityHandle;

new_key_type! {
    /// Handle to a registered subscription
    pub struct SubscriptionId;
}

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// An entity finished loading from a file
    EntityLoaded,
    /// An entity was removed from the scene
    EntityRemoved,
    /// A scene finished loading
    SceneLoaded,
    /// A scene was written to disk
    SceneSaved,
    /// The scene was destroyed
    SceneCleared,
    /// A trigger volume fired
    Trigger,
}

/// Typed event argument
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Entity reference
    Entity(EntityHandle),
    /// Name or filename
    Name(String),
    /// Count of things
    Count(usize),
    /// User-defined integer, e.g. a trigger's event id
    Int(i32),
}

/// Event with a type, optional sender and key-value arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Entity that raised the event
    pub sender: Option<EntityHandle>,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create an event without sender
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            sender: None,
            args: HashMap::new(),
        }
    }

    /// Set the sender (builder pattern)
    pub fn with_sender(mut self, sender: EntityHandle) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Add an argument to the event (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get an entity argument
    pub fn get_entity(&self, key: &str) -> Option<EntityHandle> {
        match self.get_arg(key) {
            Some(EventArg::Entity(handle)) => Some(*handle),
            _ => None,
        }
    }

    /// Get a name argument
    pub fn get_name(&self, key: &str) -> Option<&str> {
        match self.get_arg(key) {
            Some(EventArg::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Get a count argument
    pub fn get_count(&self, key: &str) -> Option<usize> {
        match self.get_arg(key) {
            Some(EventArg::Count(count)) => Some(*count),
            _ => None,
        }
    }

    /// Get an integer argument
    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.get_arg(key) {
            Some(EventArg::Int(value)) => Some(*value),
            _ => None,
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

impl<F> EventHandler for F
where
    F: FnMut(&Event) -> bool,
{
    fn on_event(&mut self, event: &Event) -> bool {
        self(event)
    }
}

struct Subscription {
    event_type: EventType,
    subscriber: Option<EntityHandle>,
    sender: Option<EntityHandle>,
    handler: Box<dyn EventHandler>,
}

impl Subscription {
    fn hears(&self, event: &Event) -> bool {
        self.event_type == event.event_type
            && (self.sender.is_none() || self.sender == event.sender)
    }
}

/// Bounded subscription table and event queue
pub struct EventManager {
    subscriptions: SlotMap<SubscriptionId, Subscription>,
    queue: Vec<Event>,
    limits: EventLimits,
}

impl EventManager {
    /// Create an empty manager with default limits
    pub fn new() -> Self {
        Self::with_limits(EventLimits::default())
    }

    /// Create an empty manager with the given limits
    pub fn with_limits(limits: EventLimits) -> Self {
        Self {
            subscriptions: SlotMap::with_capacity_and_key(limits.max_subscriptions),
            queue: Vec::with_capacity(limits.max_events),
            limits,
        }
    }

    /// Subscribe to every event of a type
    pub fn subscribe(
        &mut self,
        event_type: EventType,
        handler: Box<dyn EventHandler>,
    ) -> Option<SubscriptionId> {
        self.subscribe_filtered(event_type, None, None, handler)
    }

    /// Subscribe with an optional subscriber identity and sender filter
    ///
    /// Returns `None` when the subscription table is full.
    pub fn subscribe_filtered(
        &mut self,
        event_type: EventType,
        subscriber: Option<EntityHandle>,
        sender: Option<EntityHandle>,
        handler: Box<dyn EventHandler>,
    ) -> Option<SubscriptionId> {
        if self.subscriptions.len() >= self.limits.max_subscriptions {
            error!(
                "Max subscriptions limit reached ({}), cannot subscribe to {event_type:?}",
                self.limits.max_subscriptions
            );
            return None;
        }

        Some(self.subscriptions.insert(Subscription {
            event_type,
            subscriber,
            sender,
            handler,
        }))
    }

    /// Remove a subscription by id
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(id).is_some()
    }

    /// Remove every subscription matching the tuple exactly
    ///
    /// Returns the number removed.
    pub fn unsubscribe_matching(
        &mut self,
        event_type: EventType,
        subscriber: Option<EntityHandle>,
        sender: Option<EntityHandle>,
    ) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|_, sub| {
            !(sub.event_type == event_type && sub.subscriber == subscriber && sub.sender == sender)
        });
        let removed = before - self.subscriptions.len();
        if removed == 0 {
            warn!("No subscription to {event_type:?} for {subscriber:?} from {sender:?}");
        }
        removed
    }

    /// Remove every subscription held by `subscriber`
    pub fn unsubscribe_all(&mut self, subscriber: EntityHandle) {
        self.subscriptions.retain(|_, sub| sub.subscriber != Some(subscriber));
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Queue an event for broadcast on the next [`dispatch`](Self::dispatch)
    ///
    /// Returns false and drops the event when the queue is full.
    pub fn send(&mut self, event: Event) -> bool {
        if self.queue.len() >= self.limits.max_events {
            error!(
                "Event queue full ({}), dropping {:?}",
                self.limits.max_events, event.event_type
            );
            return false;
        }
        self.queue.push(event);
        true
    }

    /// Deliver an event right away to the one subscription of `subscriber`
    ///
    /// Returns whether a matching subscription existed.
    pub fn send_to(&mut self, subscriber: EntityHandle, event: &Event) -> bool {
        let target = self
            .subscriptions
            .values_mut()
            .find(|sub| sub.subscriber == Some(subscriber) && sub.hears(event));

        match target {
            Some(sub) => {
                sub.handler.on_event(event);
                true
            }
            None => false,
        }
    }

    /// Broadcast all queued events in send order
    ///
    /// Stops forwarding an event at the first handler that consumes it.
    pub fn dispatch(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        for event in &queued {
            for sub in self.subscriptions.values_mut().filter(|sub| sub.hears(event)) {
                if sub.handler.on_event(event) {
                    break;
                }
            }
        }
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Clear all queued events
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("subscriptions", &self.subscriptions.len())
            .field("queued", &self.queue.len())
            .field("limits", &self.limits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::EntityType;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<EventType>>>, consume: bool) -> Box<dyn EventHandler> {
        let log = Rc::clone(log);
        Box::new(move |event: &Event| {
            log.borrow_mut().push(event.event_type);
            consume
        })
    }

    fn handle(index: usize) -> EntityHandle {
        EntityHandle::new(EntityType::Default, index, 0)
    }

    #[test]
    fn test_broadcast_reaches_matching_type_only() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventManager::new();
        events.subscribe(EventType::SceneLoaded, recorder(&log, false));
        events.subscribe(EventType::SceneSaved, recorder(&log, false));

        events.send(Event::new(EventType::SceneLoaded));
        assert_eq!(events.pending(), 1);
        events.dispatch();

        assert_eq!(*log.borrow(), vec![EventType::SceneLoaded]);
        assert_eq!(events.pending(), 0);
    }

    #[test]
    fn test_event_consumption() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventManager::new();
        events.subscribe(EventType::Trigger, recorder(&first, true));
        events.subscribe(EventType::Trigger, recorder(&second, false));

        events.send(Event::new(EventType::Trigger));
        events.dispatch();

        assert_eq!(first.borrow().len(), 1);
        assert!(second.borrow().is_empty());
    }

    #[test]
    fn test_sender_filter() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventManager::new();
        events.subscribe_filtered(EventType::Trigger, None, Some(handle(1)), recorder(&log, false));

        events.send(Event::new(EventType::Trigger).with_sender(handle(2)));
        events.send(Event::new(EventType::Trigger).with_sender(handle(1)));
        events.dispatch();

        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_send_to_delivers_to_one_subscriber_immediately() {
        let a = Rc::new(RefCell::new(Vec::new()));
        let b = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventManager::new();
        events.subscribe_filtered(EventType::EntityLoaded, Some(handle(1)), None, recorder(&a, false));
        events.subscribe_filtered(EventType::EntityLoaded, Some(handle(2)), None, recorder(&b, false));

        assert!(events.send_to(handle(2), &Event::new(EventType::EntityLoaded)));
        assert!(!events.send_to(handle(3), &Event::new(EventType::EntityLoaded)));

        assert!(a.borrow().is_empty());
        assert_eq!(b.borrow().len(), 1);
        assert_eq!(events.pending(), 0);
    }

    #[test]
    fn test_unsubscribe_by_id_and_tuple() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventManager::new();
        let id = events.subscribe(EventType::SceneCleared, recorder(&log, false)).unwrap();
        events.subscribe_filtered(EventType::Trigger, Some(handle(4)), None, recorder(&log, false));

        assert!(events.unsubscribe(id));
        assert!(!events.unsubscribe(id));
        assert_eq!(events.unsubscribe_matching(EventType::Trigger, Some(handle(4)), None), 1);
        assert_eq!(events.subscription_count(), 0);
    }

    #[test]
    fn test_limits() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventManager::with_limits(EventLimits {
            max_events: 1,
            max_subscriptions: 1,
        });

        assert!(events.subscribe(EventType::Trigger, recorder(&log, false)).is_some());
        assert!(events.subscribe(EventType::Trigger, recorder(&log, false)).is_none());
        assert!(events.send(Event::new(EventType::Trigger)));
        assert!(!events.send(Event::new(EventType::Trigger)));
    }

    #[test]
    fn test_event_args() {
        let event = Event::new(EventType::EntityRemoved)
            .with_arg("entity", EventArg::Entity(handle(7)))
            .with_arg("name", EventArg::Name("Door".to_string()));

        assert_eq!(event.get_entity("entity"), Some(handle(7)));
        assert_eq!(event.get_name("name"), Some("Door"));
        assert_eq!(event.get_count("name"), None);
    }
}

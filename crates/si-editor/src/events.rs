//! Typed publish/subscribe for inspector notifications.
//!
//! One channel per `InspectorEvent` kind. Handlers run synchronously, in
//! subscription order, during `publish`.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InspectorEvent {
    /// A region selection gesture started.
    SelectStart,
    /// A region selection gesture ended.
    SelectEnd,
    Paused,
    Play,
    /// An export download was produced.
    Export,
    /// An import was applied to the world.
    Import,
}

impl InspectorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InspectorEvent::SelectStart => "selectStart",
            InspectorEvent::SelectEnd => "selectEnd",
            InspectorEvent::Paused => "paused",
            InspectorEvent::Play => "play",
            InspectorEvent::Export => "export",
            InspectorEvent::Import => "import",
        }
    }
}

impl fmt::Display for InspectorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Handler = Box<dyn FnMut(InspectorEvent)>;

#[derive(Default)]
pub struct EventBus {
    next_id: usize,
    channels: HashMap<InspectorEvent, Vec<(SubscriptionId, Handler)>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .channels
            .iter()
            .map(|(k, v)| (k.name(), v.len()))
            .collect();
        f.debug_struct("EventBus").field("channels", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        event: InspectorEvent,
        handler: impl FnMut(InspectorEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.channels
            .entry(event)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.channels.values_mut() {
            if let Some(pos) = handlers.iter().position(|(h, _)| *h == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn publish(&mut self, event: InspectorEvent) {
        log::debug!("event: {event}");
        if let Some(handlers) = self.channels.get_mut(&event) {
            for (_, handler) in handlers.iter_mut() {
                handler(event);
            }
        }
    }

    pub fn subscriber_count(&self, event: InspectorEvent) -> usize {
        self.channels.get(&event).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn publish_reaches_only_its_channel() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = seen.clone();
        bus.subscribe(InspectorEvent::Paused, move |e| sink.borrow_mut().push(e));

        bus.publish(InspectorEvent::Play);
        bus.publish(InspectorEvent::Paused);
        assert_eq!(*seen.borrow(), vec![InspectorEvent::Paused]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = count.clone();
        let id = bus.subscribe(InspectorEvent::Export, move |_| *c.borrow_mut() += 1);
        bus.publish(InspectorEvent::Export);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(InspectorEvent::Export);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count(InspectorEvent::Export), 0);
    }

    #[test]
    fn names() {
        assert_eq!(InspectorEvent::SelectStart.to_string(), "selectStart");
        assert_eq!(InspectorEvent::Import.name(), "import");
    }
}

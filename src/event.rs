use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt,
    rc::Rc,
};

/// An event dispatched through an [`EventEmitter`], listeners subscribe to
/// its [`Event::Kind`].
pub trait Event {
    type Kind: Copy + Ord + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

pub type Listener<E> = Rc<dyn Fn(&E)>;

/// handle returned on subscription, needed to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Registry of listeners per event kind.
///
/// Listeners of a given kind are called in subscription order. Emitting
/// works on a snapshot of the listeners so a listener may subscribe or
/// unsubscribe (itself or others) while being called.
pub struct EventEmitter<E: Event> {
    next_id: Cell<u64>,
    listeners: RefCell<BTreeMap<E::Kind, Vec<(ListenerId, Listener<E>)>>>,
}

impl<E: Event> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(BTreeMap::new()),
        }
    }
}

impl<E: Event> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: E::Kind, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, listener));
        id
    }

    /// returns `false` if the listener was not (or no longer) subscribed
    pub fn off(&self, kind: E::Kind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };

        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() != before;

        if list.is_empty() {
            listeners.remove(&kind);
        }
        removed
    }

    /// call every listener of the event's kind, returns how many were called
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .get(&event.kind())
            .map(|list| list.iter().map(|(_, listener)| Rc::clone(listener)).collect())
            .unwrap_or_default();

        for listener in &snapshot {
            listener(event);
        }

        snapshot.len()
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.borrow().get(&kind).map_or(0, Vec::len)
    }
}

impl<E: Event> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        f.debug_map()
            .entries(listeners.iter().map(|(kind, list)| (kind, list.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Kind {
        Ping,
        Pong,
    }

    #[derive(Debug)]
    struct Message(Kind, u32);

    impl Event for Message {
        type Kind = Kind;

        fn kind(&self) -> Kind {
            self.0
        }
    }

    #[test]
    fn dispatch_in_subscription_order() {
        let emitter = EventEmitter::<Message>::new();
        let received = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let received = Rc::clone(&received);
            emitter.on(
                Kind::Ping,
                Rc::new(move |message: &Message| received.borrow_mut().push((tag, message.1))),
            );
        }

        assert_eq!(emitter.emit(&Message(Kind::Ping, 7)), 2);
        assert_eq!(emitter.emit(&Message(Kind::Pong, 8)), 0);
        assert_eq!(*received.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn unsubscribe() {
        let emitter = EventEmitter::<Message>::new();
        let id = emitter.on(Kind::Pong, Rc::new(|_: &Message| {}));

        assert_eq!(emitter.listener_count(Kind::Pong), 1);
        assert!(!emitter.off(Kind::Ping, id));
        assert!(emitter.off(Kind::Pong, id));
        assert!(!emitter.off(Kind::Pong, id));
        assert_eq!(emitter.listener_count(Kind::Pong), 0);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let emitter = Rc::new(EventEmitter::<Message>::new());
        let calls = Rc::new(Cell::new(0));
        let id = Rc::new(Cell::new(None));

        let listener = {
            let emitter = Rc::downgrade(&emitter);
            let calls = Rc::clone(&calls);
            let id = Rc::clone(&id);
            Rc::new(move |_: &Message| {
                calls.set(calls.get() + 1);
                if let (Some(emitter), Some(id)) = (emitter.upgrade(), id.get()) {
                    emitter.off(Kind::Ping, id);
                }
            })
        };
        id.set(Some(emitter.on(Kind::Ping, listener)));

        emitter.emit(&Message(Kind::Ping, 1));
        emitter.emit(&Message(Kind::Ping, 2));

        assert_eq!(calls.get(), 1);
    }
}

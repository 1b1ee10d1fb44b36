//! Observable container for the published [`ViewState`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::models::ViewState;

/// Handle returned by [`ViewStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&Rc<ViewState>)>;

/// Holds the current snapshot and notifies subscribers of every new one.
///
/// Each update produces a fresh `Rc<ViewState>`; snapshots already handed
/// out never change.
pub struct ViewStore {
    state: RefCell<Rc<ViewState>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<u64>,
}

impl ViewStore {
    pub fn new(initial: ViewState) -> Self {
        Self {
            state: RefCell::new(Rc::new(initial)),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Rc<ViewState> {
        self.state.borrow().clone()
    }

    /// Apply `f` to a copy of the state and publish the result.
    pub fn update(&self, f: impl FnOnce(&mut ViewState)) {
        let next = {
            let mut state = self.state.borrow_mut();
            f(Rc::make_mut(&mut *state));
            state.clone()
        };
        self.notify(&next);
    }

    /// Register a listener for future snapshots.
    pub fn subscribe(&self, listener: impl Fn(&Rc<ViewState>) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn notify(&self, state: &Rc<ViewState>) {
        // listeners may subscribe or read the store while being notified
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DirectoryAddress;

    #[test]
    fn test_update_produces_new_snapshot() {
        let store = ViewStore::new(ViewState::default());
        let before = store.snapshot();

        store.update(|view| view.loading = true);

        assert!(!before.loading);
        assert!(store.snapshot().loading);
    }

    #[test]
    fn test_subscribers_see_every_publish() {
        let store = ViewStore::new(ViewState::default());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        let id = store.subscribe(move |view| sink.borrow_mut().push(view.loading));

        store.update(|view| view.loading = true);
        store.update(|view| view.loading = false);
        assert_eq!(*seen.borrow(), vec![true, false]);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.update(|view| view.loading = true);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_listener_can_read_store() {
        let store = Rc::new(ViewStore::new(ViewState::default()));
        let seen = Rc::new(RefCell::new(None));

        let (inner, sink) = (store.clone(), seen.clone());
        store.subscribe(move |_| *sink.borrow_mut() = Some(inner.snapshot().dir.clone()));

        store.update(|view| view.dir = DirectoryAddress::parse("a/"));
        assert_eq!(seen.borrow().as_ref().map(|d| d.as_str()), Some("a/"));
    }
}

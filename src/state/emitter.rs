/// Typed listener registry used by images, collections and the toolbar.
///
/// Dispatch is synchronous: `emit` returns only after every listener has
/// run. The listener list is snapshotted before dispatch, so a listener may
/// subscribe, unsubscribe or emit again while it is being called.
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Opaque handle returned by `subscribe`, used to remove that exact listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    fn next() -> Self {
        Subscription(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

type Listener<E> = Rc<dyn Fn(&E)>;

pub struct Emitter<E> {
    listeners: RefCell<Vec<(Subscription, Listener<E>)>>,
}

impl<E> Emitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Register a listener; it is called after every listener registered before it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        let subscription = Subscription::next();
        self.listeners
            .borrow_mut()
            .push((subscription, Rc::new(listener)));
        subscription
    }

    /// Remove a listener. Returns false if the handle is not (or no longer) registered.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|(s, _)| s == subscription) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

//! Single-threaded observer primitive
//!
//! A [`Signal`] keeps a list of listeners and calls them synchronously on
//! [`Signal::emit`]. Subscribing hands back a [`Subscription`] that removes
//! the listener when dropped, so handlers never outlive the route that
//! registered them.
//!
//! Listeners may subscribe, unsubscribe or emit again from inside a callback.
//! A listener removed during an emission is not called for the rest of it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct SignalInner<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

impl<T> SignalInner<T> {
    fn is_subscribed(&self, id: u64) -> bool {
        self.listeners.iter().any(|(other, _)| *other == id)
    }
}

pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Adds a listener. It stays registered while the returned handle lives.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Rc::new(listener)));
            id
        };

        let weak: Weak<RefCell<SignalInner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().listeners.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    /// Calls every listener with `value`, in subscription order
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Listener<T>)> = self.inner.borrow().listeners.clone();
        for (id, listener) in snapshot {
            if self.inner.borrow().is_subscribed(id) {
                listener(value);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.inner.borrow().listeners.len())
            .finish()
    }
}

/// Handle of a registered listener
///
/// Dropping it, or calling [`Subscription::unsubscribe`], removes the
/// listener. Removing it after the signal itself is gone is a no-op.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

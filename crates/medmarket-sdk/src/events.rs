//! In-process notification channels.
//!
//! The client announces three kinds of events, each on its own
//! [`Channel`]:
//!
//! * `errors`: every failed request, as an [`ErrorEvent`].
//! * `force_logout`: the session can no longer be renewed.
//! * `token_refreshed`: a new access token was stored.
//!
//! Delivery is synchronous to [`Channel::emit`]. A panicking listener is
//! isolated: the remaining listeners still run and the publisher never
//! observes the panic.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use medmarket_models::ErrorEvent;
use tracing::warn;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ChannelInner<T> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener<T>)>>,
}

/// A fan-out channel with any number of synchronous listeners.
pub struct Channel<T> {
    inner: Arc<ChannelInner<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                next_id: AtomicU64::new(0),
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl<T: 'static> Channel<T> {
    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        let weak: Weak<ChannelInner<T>> = Arc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .listeners
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    /// Deliver `value` to every listener; returns how many ran to completion.
    pub fn emit(&self, value: &T) -> usize {
        // Snapshot so listeners may (un)subscribe while being called.
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        let mut delivered = 0;
        for listener in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(value))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!("event listener panicked"),
            }
        }
        delivered
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle returned by [`Channel::subscribe`]; unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keep the listener registered for the lifetime of the channel.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// The three channels an [`ApiClient`](crate::ApiClient) publishes on.
///
/// Cloning shares the underlying channels.
#[derive(Clone, Default)]
pub struct AuthEvents {
    /// Failed requests.
    pub errors: Channel<ErrorEvent>,
    /// The session was terminated after a failed refresh.
    pub force_logout: Channel<()>,
    /// A new access token was stored.
    pub token_refreshed: Channel<String>,
}

impl AuthEvents {
    /// Fresh, listener-less channels.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn emit_reaches_every_listener() {
        let channel: Channel<u32> = Channel::default();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = Arc::clone(&total);
        let _a = channel.subscribe(move |v| {
            t1.fetch_add(*v as usize, Ordering::SeqCst);
        });
        let t2 = Arc::clone(&total);
        let _b = channel.subscribe(move |v| {
            t2.fetch_add(*v as usize, Ordering::SeqCst);
        });

        assert_eq!(channel.emit(&5), 2);
        assert_eq!(total.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let channel: Channel<()> = Channel::default();
        let sub = channel.subscribe(|()| {});
        assert_eq!(channel.listener_count(), 1);
        drop(sub);
        assert_eq!(channel.listener_count(), 0);
        assert_eq!(channel.emit(&()), 0);
    }

    #[test]
    fn detached_listener_stays() {
        let channel: Channel<()> = Channel::default();
        channel.subscribe(|()| {}).detach();
        assert_eq!(channel.listener_count(), 1);
    }

    #[test]
    fn panicking_listener_is_isolated() {
        let channel: Channel<ErrorEvent> = Channel::default();
        let seen = Arc::new(AtomicUsize::new(0));

        let _bad = channel.subscribe(|_| panic!("listener bug"));
        let s = Arc::clone(&seen);
        let _good = channel.subscribe(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        let delivered = channel.emit(&ErrorEvent::new("boom"));
        assert_eq!(delivered, 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_unsubscribe_during_emit() {
        let channel: Channel<()> = Channel::default();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let s = Arc::clone(&slot);
        let sub = channel.subscribe(move |()| {
            s.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);

        assert_eq!(channel.emit(&()), 1);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn cloned_events_share_channels() {
        let events = AuthEvents::new();
        let clone = events.clone();
        let _sub = clone.force_logout.subscribe(|()| {});
        assert_eq!(events.force_logout.listener_count(), 1);
    }
}

//! The `observable` module provides the cold value stream used throughout the
//! crate and the `observe_on` transform that moves delivery onto a scheduler.

use std::{
    error::Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use tracing::warn;

use crate::observer::Observer;
use crate::scheduler::Scheduler;
use crate::subscription::subscribe::{
    Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic, Unsubscribeable,
};

/// A cold source of values.
///
/// Every `subscribe` call runs the subscribe closure again with a fresh
/// `Subscriber`. The closure decides where values are emitted from (inline, an
/// OS thread, a Tokio task) and returns the `Subscription` that tears the
/// emission down.
///
/// # Example
///
/// ```no_run
/// use rxbind::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
/// use rxbind::{Observable, Observer, Subscribeable};
///
/// let mut observable = Observable::new(|mut subscriber| {
///     let join_handle = std::thread::spawn(move || {
///         for i in 0..10 {
///             subscriber.next(i);
///         }
///         subscriber.complete();
///     });
///     Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::JoinThread(join_handle))
/// });
///
/// let subscription = observable.subscribe(Subscriber::on_next(|v| println!("Emitted {}", v)));
/// subscription.join().ok();
/// ```
pub struct Observable<T> {
    subscribe_fn: Box<dyn FnMut(Subscriber<T>) -> Subscription + Send + Sync>,
}

impl<T> Observable<T> {
    /// Creates an observable from a subscribe closure.
    pub fn new(sf: impl FnMut(Subscriber<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Observable {
            subscribe_fn: Box::new(sf),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// An observable that completes immediately without emitting.
    #[must_use]
    pub fn empty() -> Self {
        Observable::new(|mut o: Subscriber<T>| {
            o.complete();
            Subscription::empty()
        })
    }

    /// An observable that fails immediately with `error`.
    #[must_use]
    pub fn fail(error: Arc<dyn Error + Send + Sync>) -> Self {
        Observable::new(move |mut o: Subscriber<T>| {
            o.error(Arc::clone(&error));
            Subscription::empty()
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// A synchronous observable that emits `items` in order, then completes.
    ///
    /// Each subscriber receives the whole sequence before `subscribe` returns.
    pub fn sequence(items: impl IntoIterator<Item = T>) -> Self {
        let items: Vec<T> = items.into_iter().collect();
        Observable::new(move |mut o: Subscriber<T>| {
            for v in &items {
                o.next(v.clone());
            }
            o.complete();
            Subscription::empty()
        })
    }
}

impl<T: Clone + Send + Sync + 'static> FromIterator<T> for Observable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Observable::sequence(iter)
    }
}

impl<T> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<Self::ObsType>) -> Subscription {
        (self.subscribe_fn)(v)
    }
}

/// Transforms available on every `Subscribeable` stream.
pub trait ObservableExt<T: 'static>: Subscribeable<ObsType = T> {
    /// Redelivers every event of this stream on `scheduler`.
    ///
    /// Values, errors and completion are queued on the scheduler in the order
    /// the source emits them and handed to the downstream subscriber from
    /// there. Events still queued when the returned subscription is
    /// unsubscribed are discarded. Events that cannot be queued because the
    /// scheduler is closed are dropped with a warning.
    fn observe_on<S>(mut self, scheduler: S) -> Observable<T>
    where
        Self: Sized + Send + Sync + 'static,
        S: Scheduler,
        T: Send,
    {
        let scheduler: Arc<dyn Scheduler> = Arc::new(scheduler);

        Observable::new(move |o| {
            let relay = Relay {
                subscriber: Arc::new(Mutex::new(o)),
                cancelled: Arc::new(AtomicBool::new(false)),
                scheduler: Arc::clone(&scheduler),
            };
            let cancelled = Arc::clone(&relay.cancelled);
            let relay_e = relay.clone();
            let relay_c = relay.clone();

            let u = Subscriber::new(
                move |v| relay.deliver(move |s| s.next(v)),
                move |observable_error| relay_e.deliver(move |s| s.error(observable_error)),
                move || relay_c.deliver(|s| s.complete()),
            );

            let mut upstream = self.subscribe(u);
            let handle = std::mem::replace(&mut upstream.subscription_future, SubscriptionHandle::Nil);

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || {
                    cancelled.store(true, Ordering::Release);
                    upstream.unsubscribe();
                })),
                handle,
            )
        })
    }
}

impl<O, T: 'static> ObservableExt<T> for O where O: Subscribeable<ObsType = T> {}

struct Relay<T> {
    subscriber: Arc<Mutex<Subscriber<T>>>,
    cancelled: Arc<AtomicBool>,
    scheduler: Arc<dyn Scheduler>,
}

impl<T> Clone for Relay<T> {
    fn clone(&self) -> Self {
        Relay {
            subscriber: Arc::clone(&self.subscriber),
            cancelled: Arc::clone(&self.cancelled),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<T: Send + 'static> Relay<T> {
    fn deliver(&self, event: impl FnOnce(&mut Subscriber<T>) + Send + 'static) {
        if self.cancelled.load(Ordering::Acquire) {
            return;
        }
        let subscriber = Arc::clone(&self.subscriber);
        let cancelled = Arc::clone(&self.cancelled);

        let scheduled = self.scheduler.schedule(Box::new(move || {
            if cancelled.load(Ordering::Acquire) {
                return;
            }
            if let Ok(mut s) = subscriber.lock() {
                event(&mut s);
            }
        }));
        if let Err(e) = scheduled {
            warn!(error = %e, "observe_on dropped an event");
        }
    }
}

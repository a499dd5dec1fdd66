use std::{
    error::Error,
    mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use crate::{
    observer::Observer,
    subscription::subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
        Unsubscribeable,
    },
    Observable,
};

/// A `Subject` multicasts every value pushed into it to all currently
/// registered observers.
///
/// Use [`Subject::emitter_receiver`] to obtain a [`SubjectEmitter`] for pushing
/// values and a [`SubjectReceiver`] for subscribing. Both are shallow handles
/// and can be cloned freely.
///
/// Values are not stored: an observer only sees what is pushed after it
/// subscribed. Once the subject completes or errors it keeps the terminal event
/// and hands it to every later subscriber immediately.
///
/// Observers are called without the subject locked, so a handler may subscribe
/// to or unsubscribe from the subject that is calling it. An observer removed
/// while a value is being delivered does not receive that value.
///
/// # Example
///
///```no_run
/// use rxbind::{subjects::Subject, subscribe::Subscriber};
/// use rxbind::{Observer, Subscribeable};
///
/// let (mut emitter, mut receiver) = Subject::emitter_receiver();
///
/// receiver.subscribe(Subscriber::on_next(|v: i32| println!("first: {}", v)));
/// emitter.next(1);
///
/// receiver.subscribe(Subscriber::on_next(|v: i32| println!("second: {}", v)));
/// emitter.next(2);
///
/// emitter.complete();
/// emitter.next(3); // Ignored.
///```
pub struct Subject<T> {
    observers: Vec<Arc<Registered<T>>>,
    next_key: u64,
    completed: bool,
    closed: bool,
    error: Option<Arc<dyn Error + Send + Sync>>,
}

struct Registered<T> {
    key: u64,
    active: AtomicBool,
    subscriber: Mutex<Subscriber<T>>,
}

impl<T> Registered<T> {
    fn deliver(&self, event: impl FnOnce(&mut Subscriber<T>)) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let mut subscriber = self.subscriber.lock().unwrap_or_else(PoisonError::into_inner);
        event(&mut *subscriber);
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

fn lock<T>(subject: &Arc<Mutex<Subject<T>>>) -> MutexGuard<'_, Subject<T>> {
    subject.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: 'static> Subject<T> {
    /// Creates a new pair of `SubjectEmitter` for emitting values and
    /// `SubjectReceiver` for subscribing to values.
    pub fn emitter_receiver() -> (SubjectEmitter<T>, SubjectReceiver<T>) {
        let s = Arc::new(Mutex::new(Subject {
            observers: Vec::with_capacity(16),
            next_key: 0,
            completed: false,
            closed: false,
            error: None,
        }));

        (
            SubjectEmitter(Arc::clone(&s)),
            SubjectReceiver(Arc::clone(&s)),
        )
    }
}

/// Subscribing side of a `Subject`.
///
/// Calling `unsubscribe` on the receiver closes the subject: registered
/// observers are dropped without a terminal event and nothing is emitted or
/// registered afterwards.
pub struct SubjectReceiver<T>(Arc<Mutex<Subject<T>>>);

/// Pushing side of a `Subject`.
pub struct SubjectEmitter<T>(Arc<Mutex<Subject<T>>>);

impl<T> Clone for SubjectReceiver<T> {
    fn clone(&self) -> Self {
        SubjectReceiver(Arc::clone(&self.0))
    }
}

impl<T> Clone for SubjectEmitter<T> {
    fn clone(&self) -> Self {
        SubjectEmitter(Arc::clone(&self.0))
    }
}

impl<T> SubjectReceiver<T> {
    /// Returns the number of registered observers.
    pub fn len(&self) -> usize {
        lock(&self.0).observers.len()
    }

    /// Returns `true` if no observers are registered, `false` otherwise.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Subscribeable for SubjectReceiver<T> {
    type ObsType = T;

    fn subscribe(&mut self, mut v: Subscriber<Self::ObsType>) -> Subscription {
        let key = {
            let mut src = lock(&self.0);
            // A closed Subject neither emits nor registers.
            if src.closed {
                return Subscription::empty();
            }
            // A terminated Subject replays its terminal event instead of
            // registering.
            if src.completed {
                let error = src.error.clone();
                drop(src);
                match error {
                    Some(err) => v.error(err),
                    None => v.complete(),
                }
                return Subscription::empty();
            }
            let key = src.next_key;
            src.next_key += 1;
            src.observers.push(Arc::new(Registered {
                key,
                active: AtomicBool::new(true),
                subscriber: Mutex::new(v),
            }));
            key
        };

        let source_cloned = Arc::clone(&self.0);

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                lock(&source_cloned).observers.retain(|o| {
                    if o.key == key {
                        o.deactivate();
                        return false;
                    }
                    true
                });
            })),
            SubscriptionHandle::Nil,
        )
    }
}

impl<T> Unsubscribeable for SubjectReceiver<T> {
    fn unsubscribe(self) {
        let removed = {
            let mut src = lock(&self.0);
            src.closed = true;
            mem::take(&mut src.observers)
        };
        for o in removed {
            o.deactivate();
        }
    }
}

impl<T> SubjectEmitter<T> {
    // Marks the subject terminated and hands back the observers to notify.
    fn terminate(&self, error: Option<Arc<dyn Error + Send + Sync>>) -> Vec<Arc<Registered<T>>> {
        let mut src = lock(&self.0);
        if src.completed || src.closed {
            return Vec::new();
        }
        src.completed = true;
        src.error = error;
        mem::take(&mut src.observers)
    }
}

impl<T: Clone> Observer for SubjectEmitter<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        let observers = {
            let src = lock(&self.0);
            if src.completed || src.closed {
                return;
            }
            src.observers.clone()
        };
        for o in observers {
            o.deliver(|s| s.next(v.clone()));
        }
    }

    fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        for o in self.terminate(Some(Arc::clone(&e))) {
            o.deliver(|s| s.error(Arc::clone(&e)));
            o.deactivate();
        }
    }

    fn complete(&mut self) {
        for o in self.terminate(None) {
            o.deliver(|s| s.complete());
            o.deactivate();
        }
    }
}

impl<T: Clone + 'static> From<SubjectEmitter<T>> for Subscriber<T> {
    fn from(mut value: SubjectEmitter<T>) -> Self {
        let mut vn = value.clone();
        let mut ve = value.clone();
        Subscriber::new(
            move |v| vn.next(v),
            move |e| ve.error(e),
            move || value.complete(),
        )
    }
}

impl<T: Send + 'static> From<SubjectReceiver<T>> for Observable<T> {
    fn from(mut value: SubjectReceiver<T>) -> Self {
        Observable::new(move |subscriber| value.subscribe(subscriber))
    }
}

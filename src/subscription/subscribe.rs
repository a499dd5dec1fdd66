use std::{error::Error, future::Future, pin::Pin, sync::Arc, thread::JoinHandle as ThreadJoinHandle};

use tokio::runtime;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::{errors::JoinError, observer::Observer};

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values emitted by a stream.
pub trait Subscribeable {
    /// The type of items emitted by the stream.
    type ObsType;

    /// Attaches `s` to the stream and returns the `Subscription` controlling that
    /// attachment.
    ///
    /// Subscribing is eager: a synchronous stream may deliver all of its values
    /// and its terminal event before this method returns.
    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, releasing whatever keeps the
/// stream delivering to the subscriber.
pub trait Unsubscribeable {
    /// Consumes the value and runs its teardown.
    fn unsubscribe(self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(Arc<dyn Error + Send + Sync>) + Send>;

/// An observer built from closures.
///
/// Once `complete` or `error` has been delivered the subscriber is stopped and
/// every later event is dropped, so handlers observe at most one terminal event
/// and never see a value after it.
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    stopped: bool,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` with handlers for values, errors and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send,
        complete_fn: impl FnMut() + 'static + Send,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            stopped: false,
        }
    }

    /// Creates a new `Subscriber` that only handles values.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            stopped: false,
        }
    }

    /// Sets the completion handler.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Sets the error handler.
    pub fn on_error(&mut self, error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send) {
        self.error_fn = Some(Box::new(error_fn));
    }

    /// Returns `true` once a terminal event has been delivered.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.stopped {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }

    fn error(&mut self, observable_error: Arc<dyn Error + Send + Sync>) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Some(efn) = &mut self.error_fn {
            (efn)(observable_error);
        }
    }
}

/// Handle used to await the background work of an asynchronous observable.
pub enum SubscriptionHandle {
    /// Nothing to await.
    Nil,

    /// The observable emits from a Tokio task.
    JoinTask(JoinHandle<()>),

    /// The observable emits from an OS thread.
    JoinThread(ThreadJoinHandle<()>),
}

/// Represents the attachment of a subscriber to an observable or subject.
///
/// Holds the teardown to run on `unsubscribe` and, for asynchronous observables,
/// a handle to await their background work.
pub struct Subscription {
    pub(crate) unsubscribe_logic: UnsubscribeLogic,
    pub(crate) subscription_future: SubscriptionHandle,
    pub(crate) runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>,
}

impl Subscription {
    /// Creates a new `Subscription` with the given teardown and join handle.
    ///
    /// If called inside a Tokio runtime the runtime handle is captured so that
    /// [`UnsubscribeLogic::Future`] can later be spawned from any thread.
    #[must_use]
    pub fn new(unsubscribe_logic: UnsubscribeLogic, subscription_future: SubscriptionHandle) -> Self {
        let runtime_handle = tokio::runtime::Handle::try_current();
        Subscription {
            unsubscribe_logic,
            subscription_future,
            runtime_handle,
        }
    }

    /// A subscription with nothing to tear down and nothing to await.
    #[must_use]
    pub fn empty() -> Self {
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    }

    /// Awaits the Tokio task or OS thread associated with this subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the task or thread used by the observable panicked.
    pub async fn join_concurrent(self) -> Result<(), JoinError> {
        match self.subscription_future {
            SubscriptionHandle::JoinTask(task_handle) => Ok(task_handle.await?),
            SubscriptionHandle::JoinThread(thread_handle) => {
                thread_handle.join().map_err(|_| JoinError::Thread)
            }
            SubscriptionHandle::Nil => Ok(()),
        }
    }

    /// Blocks until the OS thread associated with this subscription finishes.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::Thread`] if the thread panicked and
    /// [`JoinError::WrongHandle`] if the observable runs on a Tokio task.
    pub fn join(self) -> Result<(), JoinError> {
        match self.subscription_future {
            SubscriptionHandle::JoinThread(thread_handle) => {
                thread_handle.join().map_err(|_| JoinError::Thread)
            }
            SubscriptionHandle::Nil => Ok(()),
            SubscriptionHandle::JoinTask(_) => Err(JoinError::WrongHandle),
        }
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(self) {
        self.unsubscribe_logic.unsubscribe(self.runtime_handle);
    }
}

/// Teardown options for a subscription.
pub enum UnsubscribeLogic {
    /// No teardown.
    Nil,

    /// Unsubscribes another subscription this one depends on.
    Wrapped(Box<Subscription>),

    /// Teardown defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Asynchronous teardown, spawned on the Tokio runtime that was current when
    /// the subscription was created.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl UnsubscribeLogic {
    fn unsubscribe(self, runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
            UnsubscribeLogic::Wrapped(subscription) => subscription.unsubscribe(),
            UnsubscribeLogic::Future(future) => match runtime_handle {
                Ok(handle) => {
                    handle.spawn(future);
                }
                Err(e) => {
                    warn!(error = %e, "async unsubscribe logic dropped outside of a Tokio runtime");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug)]
    struct Failed;

    impl std::fmt::Display for Failed {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "failed")
        }
    }

    impl Error for Failed {}

    #[test]
    fn subscriber_ignores_events_after_complete() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (en, ee, ec) = (Arc::clone(&events), Arc::clone(&events), Arc::clone(&events));

        let mut s = Subscriber::new(
            move |v: i32| en.lock().unwrap().push(format!("next {v}")),
            move |_| ee.lock().unwrap().push("error".to_owned()),
            move || ec.lock().unwrap().push("complete".to_owned()),
        );

        s.next(1);
        s.complete();
        s.next(2);
        s.complete();
        s.error(Arc::new(Failed));

        assert!(s.is_stopped());
        assert_eq!(*events.lock().unwrap(), vec!["next 1", "complete"]);
    }

    #[test]
    fn subscriber_ignores_events_after_error() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (en, ee, ec) = (Arc::clone(&events), Arc::clone(&events), Arc::clone(&events));

        let mut s = Subscriber::new(
            move |v: i32| en.lock().unwrap().push(format!("next {v}")),
            move |e| ee.lock().unwrap().push(format!("error {e}")),
            move || ec.lock().unwrap().push("complete".to_owned()),
        );

        s.error(Arc::new(Failed));
        s.next(1);
        s.complete();

        assert_eq!(*events.lock().unwrap(), vec!["error failed"]);
    }

    #[test]
    fn wrapped_unsubscribe_runs_inner_logic() {
        let called = Arc::new(Mutex::new(0));
        let called_c = Arc::clone(&called);

        let inner = Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || *called_c.lock().unwrap() += 1)),
            SubscriptionHandle::Nil,
        );
        let outer = Subscription::new(
            UnsubscribeLogic::Wrapped(Box::new(inner)),
            SubscriptionHandle::Nil,
        );
        outer.unsubscribe();

        assert_eq!(*called.lock().unwrap(), 1);
    }

    #[test]
    fn future_logic_outside_runtime_is_dropped() {
        let s = Subscription::new(
            UnsubscribeLogic::Future(Box::pin(async {})),
            SubscriptionHandle::Nil,
        );
        // Must not panic without a runtime.
        s.unsubscribe();
    }

    #[test]
    fn join_waits_for_thread() {
        let done = Arc::new(Mutex::new(false));
        let done_c = Arc::clone(&done);
        let jh = std::thread::spawn(move || *done_c.lock().unwrap() = true);

        let s = Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::JoinThread(jh));
        assert!(s.join().is_ok());
        assert!(*done.lock().unwrap());
    }

    #[tokio::test]
    async fn join_rejects_task_handle() {
        let jh = tokio::task::spawn(async {});
        let s = Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::JoinTask(jh));
        assert!(matches!(s.join(), Err(JoinError::WrongHandle)));
    }

    #[tokio::test]
    async fn join_concurrent_awaits_task() {
        let jh = tokio::task::spawn(async {
            tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
        });
        let s = Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::JoinTask(jh));
        assert!(s.join_concurrent().await.is_ok());
    }
}

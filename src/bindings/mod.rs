//! Owned subscriptions.
//!
//! [`Bindings`] is a small component an object embeds to subscribe to streams
//! for as long as the object lives. Every bind call subscribes immediately and
//! keeps the resulting [`AnyCancellable`] in the owner's set; dropping the
//! owner (or calling [`Bindings::cancel_all`]) cancels all of them.
//!
//! ```no_run
//! use rxbind::bindings::{Bindings, Completion};
//! use rxbind::scheduler::MainContext;
//! use rxbind::subjects::{Subject, SubjectReceiver};
//! use rxbind::Observer;
//!
//! struct Counter {
//!     bindings: Bindings,
//! }
//!
//! impl Counter {
//!     fn new(clicks: SubjectReceiver<u32>, bindings: Bindings) -> Self {
//!         bindings.bind_with_completion(
//!             clicks,
//!             |n| println!("clicked {} times", n),
//!             |completion: Completion| println!("done: {:?}", completion),
//!         );
//!         Counter { bindings }
//!     }
//! }
//!
//! let (main, mut main_loop) = MainContext::new();
//! let (mut emitter, receiver) = Subject::emitter_receiver();
//!
//! let counter = Counter::new(receiver, Bindings::new(main));
//! emitter.next(1);
//! drop(counter); // Cancels the subscription.
//! emitter.next(2); // Not delivered.
//! main_loop.run_until_idle();
//! ```

mod sink;

pub use sink::Completion;

use std::{
    collections::HashSet,
    fmt, mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, trace};

use crate::{
    observable::ObservableExt,
    observer::Observer,
    scheduler::Scheduler,
    subscription::{
        cancellable::{AnyCancellable, Lifecycle},
        subscribe::{Subscribeable, Subscriber},
    },
};

/// Owner of a set of active subscriptions.
///
/// `Bindings` is `Send + Sync`; bind calls from several threads insert into the
/// set safely. Handles stay in the set after their stream terminates until the
/// owner is dropped, [`cancel_all`](Self::cancel_all) is called, or
/// [`prune_finished`](Self::prune_finished) removes them.
///
/// Handlers are owned `'static` closures. State they capture must be owned or
/// shared (`Arc`), which keeps it valid for the whole subscription.
pub struct Bindings {
    active_subscriptions: Mutex<HashSet<AnyCancellable>>,
    main: Arc<dyn Scheduler>,
}

impl Bindings {
    /// Creates an empty owner whose `*_on_main` operations deliver on `main`.
    pub fn new(main: impl Scheduler) -> Self {
        Bindings {
            active_subscriptions: Mutex::new(HashSet::new()),
            main: Arc::new(main),
        }
    }

    /// Subscribes `on_value` to `stream` and keeps the subscription.
    ///
    /// Values are delivered synchronously on whatever context the stream emits
    /// from. Termination is ignored.
    pub fn bind<S, T>(&self, stream: S, on_value: impl FnMut(T) + Send + 'static)
    where
        S: Subscribeable<ObsType = T>,
        T: 'static,
    {
        self.bind_with_completion(stream, on_value, |_| {});
    }

    /// Subscribes `on_value` and `on_completion` to `stream` and keeps the
    /// subscription.
    ///
    /// `on_completion` runs exactly once when the stream completes or fails,
    /// after every value, unless the subscription was cancelled first.
    pub fn bind_with_completion<S, T>(
        &self,
        stream: S,
        on_value: impl FnMut(T) + Send + 'static,
        on_completion: impl FnOnce(Completion) + Send + 'static,
    ) where
        S: Subscribeable<ObsType = T>,
        T: 'static,
    {
        self.attach(stream, |lifecycle| {
            sink::handler_sink(lifecycle, on_value, on_completion)
        });
    }

    /// Like [`bind`](Self::bind), but every callback runs on the main context.
    ///
    /// Emission order of the stream is preserved.
    pub fn bind_on_main<S, T>(&self, stream: S, on_value: impl FnMut(T) + Send + 'static)
    where
        S: Subscribeable<ObsType = T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        self.bind_on_main_with_completion(stream, on_value, |_| {});
    }

    /// Like [`bind_with_completion`](Self::bind_with_completion), but every
    /// callback runs on the main context.
    pub fn bind_on_main_with_completion<S, T>(
        &self,
        stream: S,
        on_value: impl FnMut(T) + Send + 'static,
        on_completion: impl FnOnce(Completion) + Send + 'static,
    ) where
        S: Subscribeable<ObsType = T> + Send + Sync + 'static,
        T: Send + 'static,
    {
        let stream = stream.observe_on(Arc::clone(&self.main));
        self.bind_with_completion(stream, on_value, on_completion);
    }

    /// Pushes every event of `stream` into `target` and keeps the subscription.
    ///
    /// Values pass through unchanged. Completion and failure of `stream` are
    /// passed to `target` as well; what that means for a subject is up to the
    /// subject.
    pub fn forward<S, T, O>(&self, stream: S, target: O)
    where
        S: Subscribeable<ObsType = T>,
        T: 'static,
        O: Observer<NextFnType = T> + Send + 'static,
    {
        self.attach(stream, |lifecycle| sink::forward_sink(lifecycle, target));
    }

    /// Like [`forward`](Self::forward), but `target` is fed on the main context.
    pub fn forward_on_main<S, T, O>(&self, stream: S, target: O)
    where
        S: Subscribeable<ObsType = T> + Send + Sync + 'static,
        T: Send + 'static,
        O: Observer<NextFnType = T> + Send + 'static,
    {
        let stream = stream.observe_on(Arc::clone(&self.main));
        self.forward(stream, target);
    }

    /// Keeps an externally created handle alongside the owner's own.
    pub fn store(&self, cancellable: AnyCancellable) {
        self.subscriptions().insert(cancellable);
    }

    /// Number of handles currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions().len()
    }

    /// Returns `true` if no handles are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes handles whose streams already terminated and returns how many
    /// were removed.
    pub fn prune_finished(&self) -> usize {
        let finished = {
            let mut set = self.subscriptions();
            let (finished, active): (HashSet<_>, HashSet<_>) = mem::take(&mut *set)
                .into_iter()
                .partition(AnyCancellable::is_finished);
            *set = active;
            finished
        };
        trace!(pruned = finished.len(), "pruned finished subscriptions");
        finished.len()
    }

    /// Cancels and removes every handle.
    pub fn cancel_all(&self) {
        // Handles are dropped outside the lock so teardown code may bind again.
        let cancelled = mem::take(&mut *self.subscriptions());
        if !cancelled.is_empty() {
            debug!(count = cancelled.len(), "cancelling subscriptions");
        }
        drop(cancelled);
    }

    fn attach<S, T>(&self, mut stream: S, make: impl FnOnce(&Arc<Lifecycle>) -> Subscriber<T>)
    where
        S: Subscribeable<ObsType = T>,
    {
        let lifecycle = Lifecycle::new();
        // Synchronous streams may call back into this owner, so the set is not
        // locked while subscribing.
        let subscription = stream.subscribe(make(&lifecycle));
        let cancellable = AnyCancellable::with_lifecycle(lifecycle, subscription);

        let mut set = self.subscriptions();
        set.insert(cancellable);
        trace!(active = set.len(), "subscription stored");
    }

    fn subscriptions(&self) -> MutexGuard<'_, HashSet<AnyCancellable>> {
        self.active_subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Bindings {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("active_subscriptions", &self.len())
            .finish_non_exhaustive()
    }
}

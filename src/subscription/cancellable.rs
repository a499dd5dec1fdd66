use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use tracing::trace;

use super::subscribe::{Subscription, Unsubscribeable};

const ACTIVE: u8 = 0;
const FINISHED: u8 = 1;
const CANCELLED: u8 = 2;

/// State shared between a handle and the subscriber feeding it.
///
/// The subscriber checks `is_cancelled` before every delivery, so cancelling
/// stops delivery even when the upstream teardown is `UnsubscribeLogic::Nil`.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Lifecycle {
            state: AtomicU8::new(ACTIVE),
        })
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.state.load(Ordering::Acquire) == FINISHED
    }

    /// Marks the stream as terminated. Returns `false` if the handle was
    /// already cancelled or finished.
    pub(crate) fn finish(&self) -> bool {
        self.state
            .compare_exchange(ACTIVE, FINISHED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Returns `true` only for the call that performed the cancellation.
    fn cancel(&self) -> bool {
        self.state.swap(CANCELLED, Ordering::AcqRel) != CANCELLED
    }
}

/// Opaque, idempotent cancellation token for one subscription.
///
/// Cancelling stops delivery to the consumer and runs the upstream teardown.
/// Cancelling again, or cancelling after the stream terminated, has no further
/// effect. Dropping the handle cancels it, so a set of handles cancels
/// everything it holds when it is cleared or dropped.
///
/// Handles compare equal only to themselves.
pub struct AnyCancellable {
    lifecycle: Arc<Lifecycle>,
    subscription: Mutex<Option<Subscription>>,
}

impl AnyCancellable {
    /// Wraps a `Subscription` so it is torn down on `cancel` or drop.
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self::with_lifecycle(Lifecycle::new(), subscription)
    }

    pub(crate) fn with_lifecycle(lifecycle: Arc<Lifecycle>, subscription: Subscription) -> Self {
        AnyCancellable {
            lifecycle,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Cancels the subscription. Safe to call any number of times.
    pub fn cancel(&self) {
        if !self.lifecycle.cancel() {
            return;
        }
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            trace!("cancelling subscription");
            subscription.unsubscribe();
        }
    }

    /// Returns `true` once `cancel` has been called or the handle was dropped
    /// from its owner.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.lifecycle.is_cancelled()
    }

    /// Returns `true` if the stream terminated and the handle has not been
    /// cancelled since.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.lifecycle.is_finished()
    }

    /// Moves the handle into `set`.
    pub fn store(self, set: &mut HashSet<AnyCancellable>) {
        set.insert(self);
    }
}

impl From<Subscription> for AnyCancellable {
    fn from(subscription: Subscription) -> Self {
        AnyCancellable::new(subscription)
    }
}

impl Drop for AnyCancellable {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl PartialEq for AnyCancellable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lifecycle, &other.lifecycle)
    }
}

impl Eq for AnyCancellable {}

impl Hash for AnyCancellable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.lifecycle).hash(state);
    }
}

impl fmt::Debug for AnyCancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyCancellable")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

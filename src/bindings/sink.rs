use std::{
    error::Error,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    observer::Observer, subscription::cancellable::Lifecycle, subscription::subscribe::Subscriber,
};

/// How a bound stream terminated.
#[derive(Debug, Clone)]
pub enum Completion {
    /// The stream completed normally.
    Finished,
    /// The stream failed with the contained error.
    Failure(Arc<dyn Error + Send + Sync>),
}

impl Completion {
    /// Returns `true` for normal completion.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Completion::Finished)
    }

    /// The failure, if the stream failed.
    #[must_use]
    pub fn error(&self) -> Option<&Arc<dyn Error + Send + Sync>> {
        match self {
            Completion::Finished => None,
            Completion::Failure(e) => Some(e),
        }
    }
}

/// Subscriber delivering to handler closures while `lifecycle` is not cancelled.
///
/// `on_completion` runs at most once, and never after cancellation.
pub(crate) fn handler_sink<T, V, C>(
    lifecycle: &Arc<Lifecycle>,
    mut on_value: V,
    on_completion: C,
) -> Subscriber<T>
where
    T: 'static,
    V: FnMut(T) + Send + 'static,
    C: FnOnce(Completion) + Send + 'static,
{
    let on_completion = Arc::new(Mutex::new(Some(on_completion)));
    let on_failure = Arc::clone(&on_completion);

    let lifecycle_n = Arc::clone(lifecycle);
    let lifecycle_e = Arc::clone(lifecycle);
    let lifecycle_c = Arc::clone(lifecycle);

    Subscriber::new(
        move |v| {
            if !lifecycle_n.is_cancelled() {
                on_value(v);
            }
        },
        move |e| {
            if lifecycle_e.finish() {
                if let Some(f) = take_once(&on_failure) {
                    f(Completion::Failure(e));
                }
            }
        },
        move || {
            if lifecycle_c.finish() {
                if let Some(f) = take_once(&on_completion) {
                    f(Completion::Finished);
                }
            }
        },
    )
}

/// Subscriber pushing every event into `target` while `lifecycle` is not
/// cancelled.
pub(crate) fn forward_sink<T, O>(lifecycle: &Arc<Lifecycle>, target: O) -> Subscriber<T>
where
    T: 'static,
    O: Observer<NextFnType = T> + Send + 'static,
{
    let target = Arc::new(Mutex::new(target));
    let target_e = Arc::clone(&target);
    let target_c = Arc::clone(&target);

    let lifecycle_n = Arc::clone(lifecycle);
    let lifecycle_e = Arc::clone(lifecycle);
    let lifecycle_c = Arc::clone(lifecycle);

    Subscriber::new(
        move |v| {
            if !lifecycle_n.is_cancelled() {
                target.lock().unwrap_or_else(PoisonError::into_inner).next(v);
            }
        },
        move |e| {
            if lifecycle_e.finish() {
                target_e.lock().unwrap_or_else(PoisonError::into_inner).error(e);
            }
        },
        move || {
            if lifecycle_c.finish() {
                target_c.lock().unwrap_or_else(PoisonError::into_inner).complete();
            }
        },
    )
}

fn take_once<F>(slot: &Mutex<Option<F>>) -> Option<F> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

//! Execution contexts that deliveries can be redirected onto.
//!
//! A [`Scheduler`] accepts tasks and runs them later on the context it
//! represents. [`ObservableExt::observe_on`](crate::ObservableExt::observe_on)
//! uses it to move every event of a stream onto that context, and
//! [`Bindings::bind_on_main`](crate::bindings::Bindings::bind_on_main) uses it
//! with the owner's [`MainScheduler`].

mod main_context;

pub use main_context::*;

use std::sync::Arc;

use crate::errors::ScheduleError;

/// Unit of work queued on a scheduler.
pub type Task = Box<dyn FnOnce() + Send>;

/// An execution context accepting tasks.
///
/// Implementations used with `observe_on` must run tasks one at a time and in
/// the order they were scheduled.
pub trait Scheduler: Send + Sync + 'static {
    /// Queues `task` for execution.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Closed`] if the context no longer runs tasks.
    fn schedule(&self, task: Task) -> Result<(), ScheduleError>;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(&self, task: Task) -> Result<(), ScheduleError> {
        (**self).schedule(task)
    }
}

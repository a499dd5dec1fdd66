//! Error types for the crate's own fallible operations.
//!
//! Stream failures are not represented here. They travel as opaque
//! `Arc<dyn Error + Send + Sync>` values through `Observer::error` and end up in
//! [`Completion::Failure`](crate::bindings::Completion::Failure).

use thiserror::Error;

/// Returned by [`Scheduler::schedule`](crate::scheduler::Scheduler::schedule).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("main loop is closed, task was discarded")]
    Closed,
}

/// Returned when the dedicated main-context thread cannot be started.
#[derive(Error, Debug)]
#[error("failed to spawn main context thread")]
pub struct SpawnError(#[from] std::io::Error);

/// Returned when awaiting the background work behind a `Subscription`.
#[derive(Error, Debug)]
pub enum JoinError {
    #[error("observable thread panicked")]
    Thread,
    #[error("observable task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("subscription holds a Tokio task handle, use `join_concurrent().await`")]
    WrongHandle,
}

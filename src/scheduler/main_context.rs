use std::{
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle, ThreadId},
};

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use super::{Scheduler, Task};
use crate::errors::{JoinError, ScheduleError, SpawnError};

const DEFAULT_THREAD_NAME: &str = "main-context";

enum Message {
    Run(Task),
    Quit,
}

/// Entry point for creating a designated main execution context.
///
/// A main context is a FIFO task queue served by exactly one [`MainLoop`]. The
/// loop can run on a thread you own (`run`), inside a Tokio event loop
/// (`run_async`), be pumped manually (`run_until_idle`), or live on a dedicated
/// thread started by [`MainContext::spawn`].
///
/// ```no_run
/// use rxbind::scheduler::{MainContext, Scheduler};
///
/// let (scheduler, main_loop) = MainContext::new();
///
/// std::thread::spawn(move || {
///     scheduler.schedule(Box::new(|| println!("runs on the main context"))).ok();
///     scheduler.quit();
/// });
///
/// main_loop.run();
/// ```
pub struct MainContext;

impl MainContext {
    /// Creates a scheduler handle and the loop that serves it.
    #[allow(clippy::new_ret_no_self)]
    #[must_use]
    pub fn new() -> (MainScheduler, MainLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        let thread = Arc::new(Mutex::new(None));
        (
            MainScheduler {
                tx,
                thread: Arc::clone(&thread),
            },
            MainLoop { rx, thread },
        )
    }

    /// Starts a main context on a dedicated OS thread named `main-context`.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] if the thread cannot be created.
    pub fn spawn() -> Result<(MainScheduler, MainThread), SpawnError> {
        Self::builder().spawn()
    }

    /// Returns a builder for configuring a dedicated main-context thread.
    #[must_use]
    pub fn builder() -> MainContextBuilder {
        MainContextBuilder {
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
        }
    }
}

/// Configuration for [`MainContext::spawn`].
#[derive(Debug, Clone)]
pub struct MainContextBuilder {
    thread_name: String,
}

impl MainContextBuilder {
    /// Name of the dedicated thread.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Starts the loop on a new thread.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] if the thread cannot be created.
    pub fn spawn(self) -> Result<(MainScheduler, MainThread), SpawnError> {
        let (scheduler, main_loop) = MainContext::new();
        let handle = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || main_loop.run())?;
        debug!(thread = %self.thread_name, "main context started");

        Ok((
            scheduler.clone(),
            MainThread {
                scheduler,
                handle: Some(handle),
            },
        ))
    }
}

/// Cloneable handle used to queue tasks on a main context.
#[derive(Clone)]
pub struct MainScheduler {
    tx: UnboundedSender<Message>,
    thread: Arc<Mutex<Option<ThreadId>>>,
}

impl MainScheduler {
    /// Asks the loop to stop after the tasks queued before this call.
    ///
    /// Quitting a loop that is already gone is a no-op.
    pub fn quit(&self) {
        if self.tx.send(Message::Quit).is_err() {
            trace!("quit requested on a closed main context");
        }
    }

    /// Returns `true` if called from the thread currently running the loop.
    #[must_use]
    pub fn is_current(&self) -> bool {
        *self.thread.lock().unwrap_or_else(PoisonError::into_inner) == Some(thread::current().id())
    }

    /// Returns `true` once the loop has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Scheduler for MainScheduler {
    fn schedule(&self, task: Task) -> Result<(), ScheduleError> {
        self.tx
            .send(Message::Run(task))
            .map_err(|_| ScheduleError::Closed)
    }
}

/// The runner of a main context. Tasks execute one at a time, in the order
/// they were scheduled, on whichever context drives this value.
pub struct MainLoop {
    rx: UnboundedReceiver<Message>,
    thread: Arc<Mutex<Option<ThreadId>>>,
}

impl MainLoop {
    /// Runs tasks on the calling thread until `quit` is requested or every
    /// `MainScheduler` is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context. Use
    /// [`run_async`](Self::run_async) there.
    pub fn run(mut self) {
        self.enter();
        while let Some(message) = self.rx.blocking_recv() {
            match message {
                Message::Run(task) => self.execute(task),
                Message::Quit => break,
            }
        }
        self.leave();
    }

    /// Runs tasks inside an asynchronous event loop until `quit` is requested
    /// or every `MainScheduler` is dropped.
    ///
    /// Drive it from a `current_thread` runtime or a `LocalSet` so that every
    /// task runs on the same thread.
    pub async fn run_async(mut self) {
        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Run(task) => {
                    self.enter();
                    self.execute(task);
                }
                Message::Quit => break,
            }
        }
        self.leave();
    }

    /// Runs every task already queued on the calling thread, then returns the
    /// number of tasks executed. Stops early at a `quit` request.
    pub fn run_until_idle(&mut self) -> usize {
        self.enter();
        let mut executed = 0;
        loop {
            match self.rx.try_recv() {
                Ok(Message::Run(task)) => {
                    self.execute(task);
                    executed += 1;
                }
                Ok(Message::Quit) | Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        self.leave();
        executed
    }

    fn execute(&self, task: Task) {
        trace!("running main context task");
        task();
    }

    fn enter(&self) {
        *self.thread.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
    }

    fn leave(&self) {
        *self.thread.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Guard for a main context running on a dedicated thread.
///
/// Dropping the guard asks the loop to quit without waiting for it.
pub struct MainThread {
    scheduler: MainScheduler,
    handle: Option<JoinHandle<()>>,
}

impl MainThread {
    /// Identifier of the dedicated thread.
    #[must_use]
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.handle.as_ref().map(|h| h.thread().id())
    }

    /// Requests the loop to quit after already queued tasks, then waits for the
    /// thread to finish.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::Thread`] if a task panicked on the main context.
    pub fn shutdown(mut self) -> Result<(), JoinError> {
        self.scheduler.quit();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| JoinError::Thread),
            None => Ok(()),
        }
    }
}

impl Drop for MainThread {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.scheduler.quit();
        }
    }
}

#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    thread::ThreadId,
};

use rxbind::{bindings::Completion, subscribe::Subscriber};

/// Records everything delivered to the handlers it hands out.
pub struct Emissions<T> {
    values: Arc<Mutex<Vec<T>>>,
    completions: Arc<Mutex<Vec<Completion>>>,
    threads: Arc<Mutex<Vec<ThreadId>>>,
}

impl<T: Clone + Send + 'static> Emissions<T> {
    pub fn new() -> Self {
        Emissions {
            values: Arc::new(Mutex::new(Vec::with_capacity(5))),
            completions: Arc::new(Mutex::new(Vec::with_capacity(1))),
            threads: Arc::new(Mutex::new(Vec::with_capacity(5))),
        }
    }

    pub fn on_value(&self) -> impl FnMut(T) + Send + 'static {
        let values = Arc::clone(&self.values);
        let threads = Arc::clone(&self.threads);
        move |v| {
            // Track value deliveries and where they happened.
            threads.lock().unwrap().push(std::thread::current().id());
            values.lock().unwrap().push(v);
        }
    }

    pub fn on_completion(&self) -> impl FnOnce(Completion) + Send + 'static {
        let completions = Arc::clone(&self.completions);
        let threads = Arc::clone(&self.threads);
        move |c| {
            threads.lock().unwrap().push(std::thread::current().id());
            completions.lock().unwrap().push(c);
        }
    }

    /// A plain `Subscriber` feeding the same records.
    pub fn subscriber(&self) -> Subscriber<T> {
        let completions_e = Arc::clone(&self.completions);
        let completions_c = Arc::clone(&self.completions);
        Subscriber::new(
            self.on_value(),
            move |e| completions_e.lock().unwrap().push(Completion::Failure(e)),
            move || completions_c.lock().unwrap().push(Completion::Finished),
        )
    }

    pub fn values(&self) -> Vec<T> {
        self.values.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<Completion> {
        self.completions.lock().unwrap().clone()
    }

    pub fn finished_count(&self) -> usize {
        self.completions().iter().filter(|c| c.is_finished()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.completions().iter().filter(|c| !c.is_finished()).count()
    }

    pub fn threads(&self) -> Vec<ThreadId> {
        self.threads.lock().unwrap().clone()
    }
}

//! Subjects act as both observer and observable.
//!
//! A `Subject` is split into an emitter and a receiver by
//! `Subject::emitter_receiver`. The `SubjectEmitter` is an `Observer`, so it
//! can be pushed into directly or used as the target of
//! [`Bindings::forward`](crate::bindings::Bindings::forward). The
//! `SubjectReceiver` is `Subscribeable` and can be bound like any other stream.

mod subject;

pub use subject::*;

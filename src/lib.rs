//! Owned, cancel-on-drop bindings for reactive streams.
//!
//! An object that subscribes to streams has to keep the subscriptions alive
//! while it wants values and cancel them when it goes away. `rxbind` packages
//! that contract into [`Bindings`](bindings::Bindings), a component the object
//! embeds:
//!
//! - `bind` attaches handler closures to a stream,
//! - `bind_on_main` does the same but delivers on a designated main context,
//! - `forward` pipes a stream into a subject (or any other `Observer`).
//!
//! Each call subscribes immediately and stores an
//! [`AnyCancellable`](subscription::cancellable::AnyCancellable) in the owner.
//! Dropping the owner cancels every stored subscription.
//!
//! The crate also contains the small stream layer the owner works with: the
//! cold [`Observable`], the multicast [`Subject`], the
//! [`Subscriber`](subscribe::Subscriber) / [`Subscription`](subscribe::Subscription)
//! pair, and the [`observe_on`](ObservableExt::observe_on) transform backed by
//! a [`Scheduler`](scheduler::Scheduler).
//!
//! # Example
//!
//! ```no_run
//! use rxbind::bindings::Bindings;
//! use rxbind::scheduler::MainContext;
//! use rxbind::{Observer, Subject};
//!
//! let (main, main_thread) = MainContext::spawn().expect("main context thread");
//! let bindings = Bindings::new(main);
//!
//! let (mut source, source_rx) = Subject::emitter_receiver();
//! let (labels, labels_rx) = Subject::emitter_receiver();
//!
//! bindings.forward(source_rx, labels);
//! bindings.bind_on_main(labels_rx, |text: String| println!("label: {}", text));
//!
//! source.next("hello".to_owned());
//!
//! drop(bindings);
//! main_thread.shutdown().ok();
//! ```

pub mod bindings;
pub mod errors;
pub mod observable;
mod observer;
pub mod scheduler;
pub mod subjects;
pub mod subscription;

pub use observable::*;
pub use observer::Observer;
pub use subjects::Subject;
pub use subscription::subscribe;
pub use subscription::subscribe::{Subscribeable, Unsubscribeable};

//! Provides structures and traits related to subscription management.
//!
//! `Subscriber` handles observed values, errors and completion. `Subscription`
//! controls one attachment to an observable or subject, and `AnyCancellable`
//! turns it into an idempotent, cancel-on-drop token that can be kept in a set.
pub mod cancellable;
pub mod subscribe;

mod custom_error;
mod register_emissions;

use std::sync::Arc;

use custom_error::CustomError;
use register_emissions::Emissions;
use rxbind::{
    bindings::Bindings,
    scheduler::{MainContext, MainLoop},
    subjects::Subject,
    Observable, Observer, Subscribeable,
};

fn make_owner() -> (Bindings, MainLoop) {
    let (main, main_loop) = MainContext::new();
    (Bindings::new(main), main_loop)
}

#[test]
fn forward_stores_subscription() {
    let (owner, _main_loop) = make_owner();
    let (_source, source_rx) = Subject::<String>::emitter_receiver();
    let (target, _target_rx) = Subject::<String>::emitter_receiver();

    owner.forward(source_rx, target);
    assert_eq!(owner.len(), 1);
}

#[test]
fn forwarded_value_reaches_subscriber_of_other_owner() {
    let (forwarder, _main_loop) = make_owner();
    let (listener, _listener_loop) = make_owner();
    let emissions = Emissions::new();

    let (mut p, p_rx) = Subject::emitter_receiver();
    let (q, q_rx) = Subject::emitter_receiver();

    forwarder.forward(p_rx, q);
    listener.bind(q_rx, emissions.on_value());

    p.next("x");

    assert_eq!(emissions.values(), vec!["x"]);
}

#[test]
fn forward_passes_values_unchanged_and_in_order() {
    let (owner, _main_loop) = make_owner();
    let emissions = Emissions::new();
    let (target, mut target_rx) = Subject::emitter_receiver();

    target_rx.subscribe(emissions.subscriber());
    owner.forward(Observable::sequence(vec![5, 3, 9]), target);

    assert_eq!(emissions.values(), vec![5, 3, 9]);
    // Completion of the source is passed on to the subject.
    assert_eq!(emissions.finished_count(), 1);
}

#[test]
fn forward_passes_failure_to_subject() {
    let (owner, _main_loop) = make_owner();
    let emissions = Emissions::<u8>::new();
    let (target, target_rx) = Subject::emitter_receiver();

    owner.bind_with_completion(target_rx.clone(), emissions.on_value(), emissions.on_completion());
    owner.forward(Observable::fail(Arc::new(CustomError)), target);

    assert_eq!(emissions.failure_count(), 1);

    // Late subscribers see the stored failure.
    let late = Emissions::<u8>::new();
    owner.bind_with_completion(target_rx, late.on_value(), late.on_completion());
    assert_eq!(late.failure_count(), 1);
}

#[test]
fn subject_with_several_producers_keeps_running_values() {
    let (owner, _main_loop) = make_owner();
    let emissions = Emissions::new();

    let (mut a, a_rx) = Subject::emitter_receiver();
    let (mut b, b_rx) = Subject::emitter_receiver();
    let (target, target_rx) = Subject::emitter_receiver();

    owner.bind(target_rx, emissions.on_value());
    owner.forward(a_rx, target.clone());
    owner.forward(b_rx, target);

    a.next(1);
    b.next(2);
    a.next(3);

    assert_eq!(emissions.values(), vec![1, 2, 3]);
    assert_eq!(owner.len(), 3);
}

#[test]
fn dropping_forwarder_stops_forwarding() {
    let (forwarder, _main_loop) = make_owner();
    let (listener, _listener_loop) = make_owner();
    let emissions = Emissions::new();

    let (mut p, p_rx) = Subject::emitter_receiver();
    let (q, q_rx) = Subject::emitter_receiver();

    forwarder.forward(p_rx.clone(), q);
    listener.bind(q_rx, emissions.on_value());

    p.next(1);
    drop(forwarder);
    p.next(2);

    assert_eq!(emissions.values(), vec![1]);
    assert!(p_rx.is_empty());
    assert_eq!(listener.len(), 1);
}

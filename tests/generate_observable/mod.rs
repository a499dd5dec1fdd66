#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rxbind::{
    subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic},
    Observable, Observer,
};

/// Emits `0..=end` from an OS thread, one value per millisecond, and stops
/// early when unsubscribed. `last_emit` receives the last emitted value.
pub fn generate_u32_observable(
    end: u32,
    last_emit: impl FnMut(u32) + Send + 'static,
) -> Observable<u32> {
    let last_emit = Arc::new(Mutex::new(last_emit));

    Observable::new(move |mut o: Subscriber<_>| {
        let done = Arc::new(Mutex::new(false));
        let done_c = Arc::clone(&done);
        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            if let Ok(i) = rx.recv() {
                *done_c.lock().unwrap() = i;
            }
        });

        let last_emit = Arc::clone(&last_emit);
        let jh = std::thread::spawn(move || {
            let mut last = 0;

            for i in 0..=end {
                if *done.lock().unwrap() {
                    break;
                }
                last = i;
                o.next(i);
                std::thread::sleep(Duration::from_millis(1));
            }
            o.complete();
            last_emit.lock().unwrap()(last);
        });

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                if tx.send(true).is_err() {
                    eprintln!("receiver dropped");
                }
            })),
            SubscriptionHandle::JoinThread(jh),
        )
    })
}

use deferred::{Deferred, Dispatch, Resolve, Status, TurnQueue};
use std::sync::{Arc, Mutex};
use std::thread;

fn queued(queue: &TurnQueue) -> (Deferred<i32, String>, Resolve<i32, String>) {
    let mut caps = None;
    let d = Deferred::builder()
        .dispatch(Dispatch::Queued(queue.clone()))
        .label("queued")
        .build(|resolve, _| {
            caps = Some(resolve);
            Ok(())
        });

    (d, caps.unwrap())
}

#[test]
fn test_default_dispatch_is_inline() {
    let d = Deferred::<i32, String>::pending();

    assert!(matches!(d.dispatch(), Dispatch::Inline));
}

#[test]
fn test_queued_settlement_waits_for_driver() {
    let queue = TurnQueue::new();
    let (d, resolve) = queued(&queue);

    let child = d.and_then(|v| Ok(v + 1));
    resolve.resolve(41);

    assert_eq!(d.status(), Status::Fulfilled);
    assert!(child.is_pending());
    assert_eq!(queue.len(), 1);

    assert_eq!(queue.run_until_idle(), 1);
    assert_eq!(child.outcome(), Some(Ok(42)));
}

#[test]
fn test_queued_late_registration_waits_for_driver() {
    let queue = TurnQueue::new();
    let (d, resolve) = queued(&queue);
    resolve.resolve(1);

    let child = d.and_then(|v| Ok(v * 10));

    assert!(child.is_pending());
    assert!(queue.run_next());
    assert_eq!(child.outcome(), Some(Ok(10)));
}

#[test]
fn test_children_inherit_dispatch() {
    let queue = TurnQueue::new();
    let (d, resolve) = queued(&queue);

    let tail = d.and_then(|v| Ok(v + 1)).and_then(|v| Ok(v + 1));
    assert!(matches!(tail.dispatch(), Dispatch::Queued(_)));
    assert_eq!(tail.label(), None);

    resolve.resolve(0);

    assert!(queue.run_next());
    assert!(tail.is_pending());

    // The second link was queued by the first one.
    assert_eq!(queue.run_until_idle(), 1);
    assert_eq!(tail.outcome(), Some(Ok(2)));
}

#[test]
fn test_queued_order_preservation() {
    let queue = TurnQueue::new();
    let (d, resolve) = queued(&queue);
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..4 {
        let order = order.clone();
        let _ = d.and_then(move |v| {
            order.lock().unwrap().push(i);
            Ok(v)
        });
    }

    resolve.resolve(0);
    assert!(order.lock().unwrap().is_empty());

    queue.run_until_idle();
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn test_queued_rejection_recovery() {
    let queue = TurnQueue::new();
    let d = Deferred::<i32, String>::builder()
        .dispatch(Dispatch::Queued(queue.clone()))
        .build(|_, _| Err("boom".to_owned()));

    let child = d.or_else(|r| Ok(r.len() as i32));

    assert_eq!(d.status(), Status::Rejected);
    assert!(child.is_pending());

    queue.run_until_idle();
    assert_eq!(child.outcome(), Some(Ok(4)));
}

#[test]
fn test_settle_from_another_thread() {
    let mut caps = None;
    let d = Deferred::<i32, String>::new(|resolve, _| {
        caps = Some(resolve);
        Ok(())
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let child = d.and_then(move |v| {
        s.lock().unwrap().push(v);
        Ok(v * 3)
    });

    let resolve = caps.unwrap();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let resolve = resolve.clone();
            thread::spawn(move || resolve.resolve(i))
        })
        .collect();

    let effective = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|settled| *settled)
        .count();

    assert_eq!(effective, 1);
    assert_eq!(seen.lock().unwrap().len(), 1);

    let value = seen.lock().unwrap()[0];
    assert_eq!(d.outcome(), Some(Ok(value)));
    assert_eq!(child.outcome(), Some(Ok(value * 3)));
}

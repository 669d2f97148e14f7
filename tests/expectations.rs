//! Integration tests for the expectation watcher: success, timeout, the
//! race between them, bulk teardown, and settle futures.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use testkit_swizzle::fixture::{ops, GenericTestObject};
use testkit_swizzle::prelude::*;

fn watcher() -> ExpectationWatcher {
    ExpectationWatcher::new(SwizzleRegistry::new())
}

fn fixture() -> Arc<GenericTestObject> {
    Arc::new(GenericTestObject::new())
}

#[test]
fn success_path_preserves_original_behavior() {
    let watcher = watcher();
    let object = fixture();
    let (tx, rx) = mpsc::channel();

    watcher
        .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, move || {
            tx.send(()).unwrap();
        })
        .unwrap();

    object.void_method_without_params();

    rx.try_recv().unwrap();
    assert!(rx.try_recv().is_err(), "callback fires exactly once");
    assert!(object.was_called(), "original body still ran");
    assert_eq!(watcher.registry().record_count(), 0, "watch undid itself");
}

#[test]
fn watched_value_returning_operation_still_echoes() {
    let watcher = watcher();
    let object = fixture();
    let (tx, rx) = mpsc::channel();

    watcher
        .expect_call(
            ops::INTEGER_RETURNING_METHOD_WITH_INTEGER,
            &object,
            move || tx.send(()).unwrap(),
        )
        .unwrap();

    // The pass-through policy keeps the original return value intact.
    assert_eq!(object.integer_returning_method_with_integer(5), 5);
    rx.try_recv().unwrap();
}

#[test]
fn timeout_path_fires_once_and_disarms() {
    let watcher = watcher();
    let object = fixture();
    let (tx, rx) = mpsc::channel();

    let handle = watcher
        .expect_call_before_timeout(
            ops::VOID_METHOD_WITHOUT_PARAMS,
            &object,
            Duration::from_millis(20),
            move || tx.send(()).unwrap(),
        )
        .unwrap();

    rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(handle.outcome(), Some(WatchOutcome::TimedOut));
    assert_eq!(watcher.registry().record_count(), 0);

    // A late call neither re-triggers the timeout callback nor counts as
    // success.
    object.void_method_without_params();
    assert!(rx.try_recv().is_err());
    assert_eq!(handle.outcome(), Some(WatchOutcome::TimedOut));
    assert!(object.was_called(), "late call behaves normally");
}

#[test]
fn call_and_timeout_are_mutually_exclusive() {
    let watcher = watcher();
    let object = fixture();
    let (tx, rx) = mpsc::channel();

    let called = tx.clone();
    let handle = watcher
        .expect_call_with_timeout(
            ops::VOID_METHOD_WITHOUT_PARAMS,
            &object,
            Duration::from_millis(60),
            move || called.send("called").unwrap(),
            move || tx.send("timed_out").unwrap(),
        )
        .unwrap();

    object.void_method_without_params();

    // Exactly one callback, never both, never zero.
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "called");
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(handle.outcome(), Some(WatchOutcome::Called));
}

#[test]
fn timeout_wins_when_no_call_arrives() {
    let watcher = watcher();
    let object = fixture();
    let (tx, rx) = mpsc::channel();

    let called = tx.clone();
    watcher
        .expect_call_with_timeout(
            ops::INTEGER_RETURNING_METHOD_WITH_INTEGER,
            &object,
            Duration::from_millis(20),
            move || called.send("called").unwrap(),
            move || tx.send("timed_out").unwrap(),
        )
        .unwrap();

    assert_eq!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap(),
        "timed_out"
    );
    assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
}

#[test]
fn multiple_watches_settle_independently() {
    let watcher = watcher();
    let object = fixture();
    let (tx, rx) = mpsc::channel();

    let void_tx = tx.clone();
    watcher
        .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, move || {
            void_tx.send("void").unwrap();
        })
        .unwrap();
    watcher
        .expect_call(
            ops::INTEGER_RETURNING_METHOD_WITH_INTEGER,
            &object,
            move || tx.send("integer").unwrap(),
        )
        .unwrap();

    assert_eq!(object.integer_returning_method_with_integer(5), 5);
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "integer");
    assert_eq!(watcher.pending_count(), 1);

    object.void_method_without_params();
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "void");
    assert_eq!(watcher.pending_count(), 0);
}

#[test]
fn bulk_release_restores_everything_silently() {
    let watcher = watcher();
    let first = fixture();
    let second = fixture();
    let (tx, rx) = mpsc::channel::<&str>();

    let a = tx.clone();
    let first_handle = watcher
        .expect_call_before_timeout(
            ops::VOID_METHOD_WITHOUT_PARAMS,
            &first,
            Duration::from_millis(40),
            move || a.send("a").unwrap(),
        )
        .unwrap();
    let b = tx.clone();
    watcher
        .expect_call(ops::INTEGER_RETURNING_METHOD_WITH_INTEGER, &first, move || {
            b.send("b").unwrap();
        })
        .unwrap();
    watcher
        .expect_call_with_timeout(
            ops::VOID_METHOD_WITHOUT_PARAMS,
            &second,
            Duration::from_millis(40),
            {
                let c = tx.clone();
                move || c.send("c").unwrap()
            },
            move || tx.send("d").unwrap(),
        )
        .unwrap();

    watcher.release_expectations();

    assert_eq!(first_handle.outcome(), Some(WatchOutcome::Released));
    assert_eq!(watcher.registry().record_count(), 0);

    // Dispatch is fully restored on both objects.
    first.void_method_without_params();
    second.void_method_without_params();
    assert_eq!(first.integer_returning_method_with_integer(5), 5);
    assert!(first.was_called());
    assert!(second.was_called());

    // No callback ever fires, even past the would-have-been timeouts.
    assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
}

#[test]
fn release_with_no_watches_is_a_noop() {
    let watcher = watcher();
    watcher.release_expectations();
    watcher.release_expectations();
    assert_eq!(watcher.pending_count(), 0);
}

#[test]
fn settle_future_resolves_for_each_outcome() {
    // Called
    let watcher = self::watcher();
    let object = fixture();
    let handle = watcher
        .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, || {})
        .unwrap();
    let caller = Arc::clone(&object);
    let thread = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(10));
        caller.void_method_without_params();
    });
    assert_eq!(
        futures::executor::block_on(handle.settled()),
        WatchOutcome::Called
    );
    thread.join().unwrap();

    // TimedOut
    let handle = watcher
        .expect_call_before_timeout(
            ops::VOID_METHOD_WITHOUT_PARAMS,
            &object,
            Duration::from_millis(15),
            || {},
        )
        .unwrap();
    assert_eq!(
        futures::executor::block_on(handle.settled()),
        WatchOutcome::TimedOut
    );

    // Released
    let handle = watcher
        .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, || {})
        .unwrap();
    watcher.release_expectations();
    assert_eq!(
        futures::executor::block_on(handle.settled()),
        WatchOutcome::Released
    );
}

#[test]
fn watcher_drop_tears_down_like_release() {
    let registry = SwizzleRegistry::new();
    let object = fixture();
    let (tx, rx) = mpsc::channel::<()>();

    {
        let watcher = ExpectationWatcher::new(registry.clone());
        let timeout_tx = tx.clone();
        watcher
            .expect_call_with_timeout(
                ops::VOID_METHOD_WITHOUT_PARAMS,
                &object,
                Duration::from_millis(30),
                move || tx.send(()).unwrap(),
                move || timeout_tx.send(()).unwrap(),
            )
            .unwrap();
    }

    assert_eq!(registry.record_count(), 0);
    object.void_method_without_params();
    assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
}

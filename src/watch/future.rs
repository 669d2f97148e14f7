//! A pollable view of a watch's settlement.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use super::watcher::{WatchOutcome, WatchState};

/// A future that resolves to the terminal [`WatchOutcome`] of one watch.
///
/// Created by [`WatchHandle::settled`](super::WatchHandle::settled).
/// Resolution is driven by whichever event settles the watch: the watched
/// call, the timeout timer, or teardown.
pub struct SettledFuture {
    state: Arc<WatchState>,
}

impl SettledFuture {
    pub(crate) fn new(state: Arc<WatchState>) -> Self {
        Self { state }
    }
}

impl Future for SettledFuture {
    type Output = WatchOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.state.outcome() {
            return Poll::Ready(outcome);
        }
        // Register before re-checking so a settle between the two reads
        // cannot strand this task.
        self.state.register_waker(cx.waker());
        match self.state.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{ops, GenericTestObject};
    use crate::swizzle::SwizzleRegistry;
    use crate::watch::ExpectationWatcher;
    use futures::task::noop_waker;
    use std::time::Duration;

    #[test]
    fn test_polls_pending_until_settled() {
        let watcher = ExpectationWatcher::new(SwizzleRegistry::new());
        let object = Arc::new(GenericTestObject::new());

        let handle = watcher
            .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, || {})
            .unwrap();

        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        let mut future = Box::pin(handle.settled());

        assert!(future.as_mut().poll(&mut cx).is_pending());

        object.void_method_without_params();
        assert_eq!(
            future.as_mut().poll(&mut cx),
            Poll::Ready(WatchOutcome::Called)
        );
    }

    #[test]
    fn test_blocks_until_called_from_another_thread() {
        let watcher = ExpectationWatcher::new(SwizzleRegistry::new());
        let object = Arc::new(GenericTestObject::new());

        let handle = watcher
            .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, || {})
            .unwrap();

        let caller = Arc::clone(&object);
        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            caller.void_method_without_params();
        });

        let outcome = futures::executor::block_on(handle.settled());
        assert_eq!(outcome, WatchOutcome::Called);
        thread.join().unwrap();
    }

    #[test]
    fn test_resolves_on_timeout() {
        let watcher = ExpectationWatcher::new(SwizzleRegistry::new());
        let object = Arc::new(GenericTestObject::new());

        let handle = watcher
            .expect_call_before_timeout(
                ops::VOID_METHOD_WITHOUT_PARAMS,
                &object,
                Duration::from_millis(20),
                || {},
            )
            .unwrap();

        let outcome = futures::executor::block_on(handle.settled());
        assert_eq!(outcome, WatchOutcome::TimedOut);
    }

    #[test]
    fn test_resolves_on_release() {
        let watcher = ExpectationWatcher::new(SwizzleRegistry::new());
        let object = Arc::new(GenericTestObject::new());

        let handle = watcher
            .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, || {})
            .unwrap();
        watcher.release_expectations();

        let outcome = futures::executor::block_on(handle.settled());
        assert_eq!(outcome, WatchOutcome::Released);
    }
}

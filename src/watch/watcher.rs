//! Call-expectation watches: one-shot "this operation will be invoked"
//! assertions, optionally raced against a timeout.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::Waker;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;
use crate::swizzle::{CallOriginal, Invocation, ObjectKey, Operation, SwizzleRegistry, Swizzlable};

use super::future::SettledFuture;
use super::timer::{TimerHandle, TimerQueue};

type Callback = Box<dyn FnOnce() + Send>;

const ARMED: u8 = 0;

/// The terminal state of a settled watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchOutcome {
    /// The watched operation was invoked before any timeout.
    Called = 1,
    /// The time budget elapsed without a call.
    TimedOut = 2,
    /// The watch was torn down by
    /// [`release_expectations`](ExpectationWatcher::release_expectations)
    /// without either event.
    Released = 3,
}

impl WatchOutcome {
    fn from_stage(stage: u8) -> Option<Self> {
        match stage {
            1 => Some(Self::Called),
            2 => Some(Self::TimedOut),
            3 => Some(Self::Released),
            _ => None,
        }
    }
}

/// Shared state for one armed watch.
///
/// The `stage` atomic is the single settlement authority: the operation
/// call, the timer, and teardown all race to claim it with a
/// compare-and-swap, and only the winner acts.
pub(crate) struct WatchState {
    operation: Operation,
    target: ObjectKey,
    stage: AtomicU8,
    on_called: Mutex<Option<Callback>>,
    on_timeout: Mutex<Option<Callback>>,
    timer: Mutex<Option<TimerHandle>>,
    wakers: Mutex<Vec<Waker>>,
}

impl WatchState {
    fn new(
        operation: Operation,
        target: ObjectKey,
        on_called: Option<Callback>,
        on_timeout: Option<Callback>,
    ) -> Self {
        Self {
            operation,
            target,
            stage: AtomicU8::new(ARMED),
            on_called: Mutex::new(on_called),
            on_timeout: Mutex::new(on_timeout),
            timer: Mutex::new(None),
            wakers: Mutex::new(Vec::new()),
        }
    }

    /// Claims the terminal `outcome`; returns `true` only for the winner.
    fn try_settle(&self, outcome: WatchOutcome) -> bool {
        self.stage
            .compare_exchange(ARMED, outcome as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn outcome(&self) -> Option<WatchOutcome> {
        WatchOutcome::from_stage(self.stage.load(Ordering::SeqCst))
    }

    fn is_settled(&self) -> bool {
        self.outcome().is_some()
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.cancel();
        }
    }

    fn drop_callbacks(&self) {
        self.on_called.lock().take();
        self.on_timeout.lock().take();
    }

    pub(crate) fn register_waker(&self, waker: &Waker) {
        let mut wakers = self.wakers.lock();
        if !wakers.iter().any(|known| known.will_wake(waker)) {
            wakers.push(waker.clone());
        }
    }

    fn wake_all(&self) {
        for waker in self.wakers.lock().drain(..) {
            waker.wake();
        }
    }
}

/// A handle to one armed watch.
///
/// Settlement is driven by the watched call, the timer, or teardown; the
/// handle only observes it. Dropping the handle does not release the watch.
pub struct WatchHandle {
    state: Arc<WatchState>,
}

impl WatchHandle {
    /// The terminal outcome, or `None` while the watch is still armed.
    #[must_use]
    pub fn outcome(&self) -> Option<WatchOutcome> {
        self.state.outcome()
    }

    /// Returns `true` once the watch has settled.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.is_settled()
    }

    /// A future resolving to the terminal [`WatchOutcome`].
    #[must_use]
    pub fn settled(&self) -> SettledFuture {
        SettledFuture::new(Arc::clone(&self.state))
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("operation", &self.state.operation)
            .field("outcome", &self.state.outcome())
            .finish()
    }
}

/// Watches for operations to be invoked on specific objects, dispatching a
/// success or timeout callback exactly once per watch.
///
/// Constructed with the [`SwizzleRegistry`] it installs interceptions
/// through (dependency injection, no global state). Watches use
/// [`CallOriginal::Before`], so the watched operation's real behavior is
/// preserved; the interception is undone the moment the watch settles, so
/// only the first subsequent call is special-cased.
///
/// Dropping the watcher releases every outstanding watch without invoking
/// any callback.
///
/// # Example
///
/// ```rust
/// use std::sync::mpsc;
/// use std::sync::Arc;
/// use testkit_swizzle::fixture::{ops, GenericTestObject};
/// use testkit_swizzle::swizzle::SwizzleRegistry;
/// use testkit_swizzle::watch::ExpectationWatcher;
///
/// let watcher = ExpectationWatcher::new(SwizzleRegistry::new());
/// let object = Arc::new(GenericTestObject::new());
/// let (tx, rx) = mpsc::channel();
///
/// watcher
///     .expect_call(ops::VOID_METHOD_WITHOUT_PARAMS, &object, move || {
///         tx.send(()).unwrap();
///     })
///     .unwrap();
///
/// object.void_method_without_params();
///
/// rx.try_recv().unwrap(); // the callback ran on the calling thread
/// assert!(object.was_called()); // original behavior preserved
/// ```
pub struct ExpectationWatcher {
    registry: SwizzleRegistry,
    timers: TimerQueue,
    watches: Mutex<Vec<Arc<WatchState>>>,
}

impl ExpectationWatcher {
    /// Creates a watcher that installs interceptions through `registry`.
    #[must_use]
    pub fn new(registry: SwizzleRegistry) -> Self {
        Self {
            registry,
            timers: TimerQueue::new(),
            watches: Mutex::new(Vec::new()),
        }
    }

    /// The registry this watcher installs interceptions through.
    #[must_use]
    pub fn registry(&self) -> &SwizzleRegistry {
        &self.registry
    }

    /// Runs `on_called` when `operation` is next invoked on `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchOperation`](crate::Error::NoSuchOperation) if
    /// `target` does not respond to `operation`.
    pub fn expect_call<T>(
        &self,
        operation: Operation,
        target: &Arc<T>,
        on_called: impl FnOnce() + Send + 'static,
    ) -> Result<WatchHandle>
    where
        T: Swizzlable + Send + Sync + 'static,
    {
        self.watch(operation, target, None, Some(Box::new(on_called)), None)
    }

    /// Runs `on_timeout` if `operation` is not invoked on `target` within
    /// `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchOperation`](crate::Error::NoSuchOperation) if
    /// `target` does not respond to `operation`.
    pub fn expect_call_before_timeout<T>(
        &self,
        operation: Operation,
        target: &Arc<T>,
        timeout: Duration,
        on_timeout: impl FnOnce() + Send + 'static,
    ) -> Result<WatchHandle>
    where
        T: Swizzlable + Send + Sync + 'static,
    {
        self.watch(
            operation,
            target,
            Some(timeout),
            None,
            Some(Box::new(on_timeout)),
        )
    }

    /// Runs `on_called` if `operation` is invoked on `target` within
    /// `timeout`, or `on_timeout` otherwise. Exactly one of the two runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchOperation`](crate::Error::NoSuchOperation) if
    /// `target` does not respond to `operation`.
    pub fn expect_call_with_timeout<T>(
        &self,
        operation: Operation,
        target: &Arc<T>,
        timeout: Duration,
        on_called: impl FnOnce() + Send + 'static,
        on_timeout: impl FnOnce() + Send + 'static,
    ) -> Result<WatchHandle>
    where
        T: Swizzlable + Send + Sync + 'static,
    {
        self.watch(
            operation,
            target,
            Some(timeout),
            Some(Box::new(on_called)),
            Some(Box::new(on_timeout)),
        )
    }

    /// The single watch primitive behind the `expect_*` entry points.
    fn watch<T>(
        &self,
        operation: Operation,
        target: &Arc<T>,
        timeout: Option<Duration>,
        on_called: Option<Callback>,
        on_timeout: Option<Callback>,
    ) -> Result<WatchHandle>
    where
        T: Swizzlable + Send + Sync + 'static,
    {
        let state = Arc::new(WatchState::new(
            operation,
            ObjectKey::of(target),
            on_called,
            on_timeout,
        ));

        let call_state = Arc::clone(&state);
        let call_registry = self.registry.clone();
        self.registry
            .swizzle(operation, target, CallOriginal::Before, move |_: &mut Invocation| {
                if call_state.try_settle(WatchOutcome::Called) {
                    call_state.cancel_timer();
                    call_registry.undo_key(call_state.operation, call_state.target);
                    if let Some(callback) = call_state.on_called.lock().take() {
                        callback();
                    }
                    call_state.wake_all();
                }
            })?;

        if let Some(timeout) = timeout {
            let timer_state = Arc::clone(&state);
            let timer_registry = self.registry.clone();
            let handle = self.timers.schedule(timeout, move || {
                if timer_state.try_settle(WatchOutcome::TimedOut) {
                    timer_registry.undo_key(timer_state.operation, timer_state.target);
                    if let Some(callback) = timer_state.on_timeout.lock().take() {
                        callback();
                    }
                    timer_state.wake_all();
                }
            });
            *state.timer.lock() = Some(handle);
        }

        let mut watches = self.watches.lock();
        watches.retain(|watch| !watch.is_settled());
        watches.push(Arc::clone(&state));
        Ok(WatchHandle { state })
    }

    /// Tears down every outstanding watch without invoking any callback:
    /// timers are invalidated and interceptions undone.
    ///
    /// Idempotent, and safe to call with no outstanding watches. Also runs
    /// when the watcher is dropped.
    pub fn release_expectations(&self) {
        let drained: Vec<_> = self.watches.lock().drain(..).collect();
        for state in drained {
            if state.try_settle(WatchOutcome::Released) {
                // Invalidate the timer before undoing the interception so
                // neither path can observe a half-released watch.
                state.cancel_timer();
                self.registry.undo_key(state.operation, state.target);
                state.drop_callbacks();
                state.wake_all();
            }
        }
    }

    /// The number of watches still armed.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.watches
            .lock()
            .iter()
            .filter(|watch| !watch.is_settled())
            .count()
    }
}

impl Drop for ExpectationWatcher {
    fn drop(&mut self) {
        self.release_expectations();
    }
}

impl fmt::Debug for ExpectationWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpectationWatcher")
            .field("pending", &self.pending_count())
            .finish()
    }
}

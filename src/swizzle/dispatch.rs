//! Per-instance dispatch tables and the [`Swizzlable`] target contract.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::invocation::{Invocation, Operation};

/// An installed dispatch behavior: the closure a table entry routes calls
/// through. Built by the registry; encapsulates the calling policy and the
/// captured original.
pub(crate) type BehaviorFn = Arc<dyn Fn(&mut Invocation) + Send + Sync>;

/// A per-instance dispatch table mapping operations to installed behaviors.
///
/// Every [`Swizzlable`] object owns one table and routes its operations
/// through it. Cloning a table is cheap and shares state, so the registry
/// can hold a handle to the same entries the object dispatches through.
///
/// Operations with no entry fall through to the object's own
/// implementation; installing and removing entries is the registry's job.
///
/// # Example
///
/// ```rust
/// use testkit_swizzle::swizzle::{DispatchTable, Operation};
///
/// let table = DispatchTable::new();
/// assert!(!table.is_intercepted(Operation::new("ping")));
/// ```
#[derive(Clone, Default)]
pub struct DispatchTable {
    inner: Arc<TableInner>,
}

#[derive(Default)]
struct TableInner {
    entries: Mutex<HashMap<Operation, BehaviorFn>>,
}

impl DispatchTable {
    /// Creates an empty dispatch table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if an interception is currently installed for
    /// `operation`.
    #[must_use]
    pub fn is_intercepted(&self, operation: Operation) -> bool {
        self.inner.entries.lock().contains_key(&operation)
    }

    /// Returns the currently-installed behavior for `operation`, if any.
    pub(crate) fn current(&self, operation: Operation) -> Option<BehaviorFn> {
        self.inner.entries.lock().get(&operation).map(Arc::clone)
    }

    /// Installs `behavior` as the dispatch target for `operation`.
    pub(crate) fn install(&self, operation: Operation, behavior: BehaviorFn) {
        self.inner.entries.lock().insert(operation, behavior);
    }

    /// Removes the entry for `operation`, restoring passthrough dispatch.
    pub(crate) fn remove(&self, operation: Operation) {
        self.inner.entries.lock().remove(&operation);
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("intercepted", &self.inner.entries.lock().len())
            .finish()
    }
}

/// The contract an object implements to make its operations interceptable.
///
/// Implementors expose the operations they respond to, a shared
/// [`DispatchTable`], and their true implementations behind
/// [`call_original`](Self::call_original). Each public method of the object
/// builds an [`Invocation`] and funnels it through
/// [`dispatch`](Self::dispatch), which routes to the installed behavior if
/// one exists and falls through to the true implementation otherwise.
///
/// See [`GenericTestObject`](crate::fixture::GenericTestObject) for a
/// complete implementation.
pub trait Swizzlable {
    /// The dispatch table this instance routes its operations through.
    fn dispatch_table(&self) -> &DispatchTable;

    /// Every operation this object responds to.
    fn operations(&self) -> &'static [Operation];

    /// Runs the true implementation of `invocation.operation()`, reading
    /// arguments from and writing the result into the invocation.
    fn call_original(&self, invocation: &mut Invocation);

    /// Returns `true` if this object exposes `operation`.
    fn responds_to(&self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }

    /// Routes one call through the dispatch table.
    ///
    /// The table lock is released before the behavior runs, so behaviors
    /// may install or undo interceptions without deadlocking.
    fn dispatch(&self, invocation: &mut Invocation) {
        if let Some(behavior) = self.dispatch_table().current(invocation.operation()) {
            behavior(invocation);
        } else {
            self.call_original(invocation);
        }
    }
}

//! The interception registry: installs, replaces, and restores per-instance
//! operation dispatch.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};

use super::dispatch::{BehaviorFn, DispatchTable, Swizzlable};
use super::invocation::{Invocation, Operation};

/// Governs whether, and when, the original implementation runs relative to
/// the substitute behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallOriginal {
    /// The original never runs; the substitute's return-slot writes are
    /// authoritative.
    Never,
    /// The original runs first and seeds the return slot; the substitute
    /// runs afterwards and may overwrite it.
    Before,
    /// The substitute runs first; the original runs afterwards and its
    /// result overwrites whatever the substitute wrote.
    After,
}

/// Identifies a target instance by the address of its `Arc` allocation.
///
/// Stable for the lifetime of an interception record because the record
/// keeps the target alive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct ObjectKey(usize);

impl ObjectKey {
    pub(crate) fn of<T>(target: &Arc<T>) -> Self {
        Self(Arc::as_ptr(target).cast::<()>() as usize)
    }
}

/// What dispatch looked like for a pair before an interception was
/// installed: either passthrough to the object's true implementation, or a
/// previously-installed behavior.
enum PriorDispatch {
    Passthrough,
    Behavior(BehaviorFn),
}

/// One active interception for an `(operation, target)` pair.
struct InterceptionRecord {
    operation: Operation,
    table: DispatchTable,
    prior: PriorDispatch,
    /// The record this one displaced, if the pair was re-swizzled without
    /// an intervening undo. Lets each `undo` peel exactly one layer.
    replaced: Option<Box<InterceptionRecord>>,
    /// Keeps the target alive while the interception is active.
    _target: Arc<dyn Any + Send + Sync>,
}

type RecordKey = (Operation, ObjectKey);

/// Installs substitute dispatch for individual operations on individual
/// object instances, and restores the original dispatch on request.
///
/// Cloning a registry is cheap and shares state. Dropping the last clone
/// undoes every interception it still tracks, so a leaked swizzle can never
/// bleed into subsequent tests.
///
/// Independent registries do not interfere with each other's records, but
/// both ultimately mutate the same dispatch table on the object; two
/// registries redirecting the *same* pair is out of contract (last writer
/// wins).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use testkit_swizzle::fixture::{ops, GenericTestObject};
/// use testkit_swizzle::swizzle::{CallOriginal, SwizzleRegistry, Value};
///
/// let registry = SwizzleRegistry::new();
/// let object = Arc::new(GenericTestObject::new());
///
/// registry
///     .swizzle(
///         ops::INTEGER_RETURNING_METHOD_WITH_INTEGER,
///         &object,
///         CallOriginal::Never,
///         |invocation| invocation.set_return_value(Value::Integer(42)),
///     )
///     .unwrap();
/// assert_eq!(object.integer_returning_method_with_integer(5), 42);
///
/// registry.undo(ops::INTEGER_RETURNING_METHOD_WITH_INTEGER, &object);
/// assert_eq!(object.integer_returning_method_with_integer(5), 5);
/// ```
#[derive(Clone, Default)]
pub struct SwizzleRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    records: Mutex<HashMap<RecordKey, InterceptionRecord>>,
}

impl SwizzleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `substitute` as the dispatch target for `operation` on
    /// `target`.
    ///
    /// The substitute receives the call's [`Invocation`] (arguments plus a
    /// writable return slot); `calling` decides whether the original
    /// implementation runs never, before, or after it.
    ///
    /// If the pair is already intercepted, the existing record is replaced:
    /// the currently-installed behavior becomes the new record's original,
    /// so a single [`undo`](Self::undo) restores the immediately preceding
    /// state rather than pristine dispatch.
    ///
    /// The target is kept alive until the interception is undone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchOperation`] if `target` does not respond to
    /// `operation`. The check happens at install time, never at call time.
    ///
    /// # Warning
    ///
    /// The substitute must not synchronously re-dispatch the intercepted
    /// operation on the same object; the result of doing so is undefined.
    pub fn swizzle<T>(
        &self,
        operation: Operation,
        target: &Arc<T>,
        calling: CallOriginal,
        substitute: impl Fn(&mut Invocation) + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: Swizzlable + Send + Sync + 'static,
    {
        if !target.responds_to(operation) {
            return Err(Error::NoSuchOperation(operation));
        }

        let table = target.dispatch_table().clone();
        let key = (operation, ObjectKey::of(target));

        // Install and record under the registry lock so competing
        // swizzle/undo calls on the same pair are serialized.
        let mut records = self.inner.records.lock();
        let replaced = records.remove(&key).map(Box::new);

        let prior = match table.current(operation) {
            Some(behavior) => PriorDispatch::Behavior(behavior),
            None => PriorDispatch::Passthrough,
        };
        let original: BehaviorFn = match &prior {
            PriorDispatch::Behavior(behavior) => Arc::clone(behavior),
            PriorDispatch::Passthrough => {
                let object = Arc::clone(target);
                Arc::new(move |invocation: &mut Invocation| object.call_original(invocation))
            }
        };

        let behavior: BehaviorFn = Arc::new(move |invocation: &mut Invocation| match calling {
            CallOriginal::Never => substitute(invocation),
            CallOriginal::Before => {
                original(invocation);
                substitute(invocation);
            }
            CallOriginal::After => {
                substitute(invocation);
                original(invocation);
            }
        });
        table.install(operation, behavior);

        records.insert(
            key,
            InterceptionRecord {
                operation,
                table,
                prior,
                replaced,
                _target: Arc::clone(target) as Arc<dyn Any + Send + Sync>,
            },
        );
        Ok(())
    }

    /// Removes the interception for `(operation, target)` and restores the
    /// dispatch captured when it was installed.
    ///
    /// Restores exactly one layer: after two `swizzle` calls on the same
    /// pair, the first `undo` returns to the state installed by the first
    /// swizzle, and a second `undo` returns to pristine dispatch. A pair
    /// with no record is a silent no-op.
    pub fn undo<T>(&self, operation: Operation, target: &Arc<T>)
    where
        T: Swizzlable,
    {
        self.undo_key(operation, ObjectKey::of(target));
    }

    /// Keyed variant of [`undo`](Self::undo); returns `true` if a record
    /// was removed.
    pub(crate) fn undo_key(&self, operation: Operation, target: ObjectKey) -> bool {
        let mut records = self.inner.records.lock();
        let Some(record) = records.remove(&(operation, target)) else {
            return false;
        };
        match record.prior {
            PriorDispatch::Passthrough => record.table.remove(record.operation),
            PriorDispatch::Behavior(behavior) => record.table.install(record.operation, behavior),
        }
        if let Some(previous) = record.replaced {
            records.insert((operation, target), *previous);
        }
        true
    }

    /// Restores every tracked pair to its pristine dispatch and clears all
    /// records. Safe to call with no records; also runs when the last clone
    /// of the registry is dropped.
    pub fn undo_all(&self) {
        let drained: Vec<_> = {
            let mut records = self.inner.records.lock();
            records.drain().map(|(_, record)| record).collect()
        };
        for record in drained {
            restore_pristine(record);
        }
    }

    /// The number of active interception records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.inner.records.lock().len()
    }
}

impl fmt::Debug for SwizzleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwizzleRegistry")
            .field("records", &self.record_count())
            .finish()
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        for (_, record) in self.records.get_mut().drain() {
            restore_pristine(record);
        }
    }
}

/// Unwinds a record chain completely, restoring the dispatch that was in
/// place before the oldest layer was installed.
fn restore_pristine(record: InterceptionRecord) {
    let mut deepest = record;
    while let Some(previous) = deepest.replaced {
        deepest = *previous;
    }
    match deepest.prior {
        PriorDispatch::Passthrough => deepest.table.remove(deepest.operation),
        PriorDispatch::Behavior(behavior) => deepest.table.install(deepest.operation, behavior),
    }
}

//! # testkit-swizzle 🧪
//!
//! > Instance-level method interception and call expectations for unit tests
//!
//! **testkit-swizzle** lets a test intercept calls to a specific operation
//! on a specific object *instance*, substitute or augment its behavior,
//! and later restore the original behavior — plus a call-expectation
//! watcher built on top that asserts "operation X will be invoked on object
//! O", optionally within a time budget.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use testkit_swizzle::fixture::{ops, GenericTestObject};
//! use testkit_swizzle::swizzle::{CallOriginal, SwizzleRegistry, Value};
//!
//! let registry = SwizzleRegistry::new();
//! let object = Arc::new(GenericTestObject::new());
//!
//! registry
//!     .swizzle(
//!         ops::INTEGER_RETURNING_METHOD_WITH_INTEGER,
//!         &object,
//!         CallOriginal::Never,
//!         |invocation| invocation.set_return_value(Value::Integer(42)),
//!     )
//!     .unwrap();
//!
//! assert_eq!(object.integer_returning_method_with_integer(5), 42);
//!
//! registry.undo(ops::INTEGER_RETURNING_METHOD_WITH_INTEGER, &object);
//! assert_eq!(object.integer_returning_method_with_integer(5), 5);
//! ```
//!
//! ## Features
//!
//! - 🔀 **Reversible interception** - redirect one operation on one
//!   instance, then restore it
//! - ⏪ **Calling policies** - run the original never, before, or after the
//!   substitute
//! - 👀 **Call expectations** - one-shot watches with success callbacks
//! - ⏱️ **Timeouts** - race a watch against a time budget, exactly one
//!   callback fires
//! - 🧹 **Deterministic cleanup** - undo-all on teardown, nothing leaks
//!   into the next test

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod fixture;
pub mod swizzle;
pub mod watch;

/// Prelude for convenient imports
///
/// ```rust
/// use testkit_swizzle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::swizzle::{
        CallOriginal, DispatchTable, Invocation, Operation, SwizzleRegistry, Swizzlable, Value,
    };
    pub use crate::watch::{ExpectationWatcher, WatchHandle, WatchOutcome};
}

// Re-exports
pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_exports() {
        let registry = SwizzleRegistry::new();
        let _ = ExpectationWatcher::new(registry);
        assert_eq!(Operation::new("x"), Operation::new("x"));
    }
}

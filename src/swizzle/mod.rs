//! Reversible, per-instance operation interception.
//!
//! This module provides the interception engine:
//!
//! - [`SwizzleRegistry`] - installs and restores substitute dispatch
//! - [`Swizzlable`] - the contract interceptable objects implement
//! - [`DispatchTable`] - the per-instance operation routing table
//! - [`Invocation`] / [`Value`] - captured arguments and the return slot
//! - [`CallOriginal`] - when the original implementation still runs
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use testkit_swizzle::fixture::{ops, GenericTestObject};
//! use testkit_swizzle::swizzle::{CallOriginal, SwizzleRegistry, Value};
//!
//! let registry = SwizzleRegistry::new();
//! let object = Arc::new(GenericTestObject::new());
//!
//! // Replace the operation entirely: the substitute owns the return slot.
//! registry
//!     .swizzle(
//!         ops::INTEGER_RETURNING_METHOD_WITH_INTEGER,
//!         &object,
//!         CallOriginal::Never,
//!         |invocation| invocation.set_return_value(Value::Integer(42)),
//!     )
//!     .unwrap();
//! assert_eq!(object.integer_returning_method_with_integer(5), 42);
//!
//! // Restore the original dispatch.
//! registry.undo(ops::INTEGER_RETURNING_METHOD_WITH_INTEGER, &object);
//! assert_eq!(object.integer_returning_method_with_integer(5), 5);
//! ```

mod dispatch;
mod invocation;
mod registry;

pub use dispatch::{DispatchTable, Swizzlable};
pub use invocation::{AffineTransform, Invocation, ObjectRef, Operation, Rect, Value};
pub use registry::{CallOriginal, SwizzleRegistry};

pub(crate) use registry::ObjectKey;

//! A passive fixture object for exercising the interception engine.
//!
//! [`GenericTestObject`] exposes operations spanning every calling
//! convention the engine must handle: no arguments, object arguments,
//! mixed primitives, geometry structs, and each return-value category. Each
//! operation records that it was called and the ordered arguments it
//! received, then echoes its argument back where a return value is
//! expected.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use testkit_swizzle::fixture::GenericTestObject;
//! use testkit_swizzle::swizzle::Value;
//!
//! let object = Arc::new(GenericTestObject::new());
//! assert!(!object.was_called());
//!
//! assert_eq!(object.integer_returning_method_with_integer(5), 5);
//! assert!(object.was_called());
//! assert_eq!(object.params(), vec![Value::Integer(5)]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::swizzle::{
    AffineTransform, DispatchTable, Invocation, ObjectRef, Operation, Rect, Swizzlable, Value,
};

/// Operation identifiers for every method [`GenericTestObject`] exposes.
pub mod ops {
    use crate::swizzle::Operation;

    /// Zero-argument void operation.
    pub const VOID_METHOD_WITHOUT_PARAMS: Operation = Operation::new("void_method_without_params");
    /// Single-object-argument void operation.
    pub const VOID_METHOD_WITH_ONE_OBJECT_PARAM: Operation =
        Operation::new("void_method_with_one_object_param");
    /// Three-object-argument void operation.
    pub const VOID_METHOD_WITH_THREE_OBJECT_PARAMS: Operation =
        Operation::new("void_method_with_three_object_params");
    /// Mixed-primitive-argument void operation (integer, float, duration).
    pub const VOID_METHOD_WITH_PRIMITIVE_PARAMS: Operation =
        Operation::new("void_method_with_primitive_params");
    /// Geometry-struct-argument void operation (rect + affine transform).
    pub const VOID_METHOD_WITH_RECT_AND_TRANSFORM: Operation =
        Operation::new("void_method_with_rect_and_transform");
    /// Object-returning operation; echoes its argument.
    pub const OBJECT_RETURNING_METHOD_WITH_OBJECT: Operation =
        Operation::new("object_returning_method_with_object");
    /// Integer-returning operation; echoes its argument.
    pub const INTEGER_RETURNING_METHOD_WITH_INTEGER: Operation =
        Operation::new("integer_returning_method_with_integer");
    /// Rect-returning operation; echoes its argument.
    pub const RECT_RETURNING_METHOD_WITH_RECT: Operation =
        Operation::new("rect_returning_method_with_rect");
}

/// A passive probe object: every operation records the call and its
/// arguments, and value-returning operations echo their argument back.
#[derive(Debug, Default)]
pub struct GenericTestObject {
    dispatch: DispatchTable,
    called: AtomicBool,
    params: Mutex<Vec<Value>>,
}

impl GenericTestObject {
    /// Every operation this fixture responds to.
    pub const OPERATIONS: [Operation; 8] = [
        ops::VOID_METHOD_WITHOUT_PARAMS,
        ops::VOID_METHOD_WITH_ONE_OBJECT_PARAM,
        ops::VOID_METHOD_WITH_THREE_OBJECT_PARAMS,
        ops::VOID_METHOD_WITH_PRIMITIVE_PARAMS,
        ops::VOID_METHOD_WITH_RECT_AND_TRANSFORM,
        ops::OBJECT_RETURNING_METHOD_WITH_OBJECT,
        ops::INTEGER_RETURNING_METHOD_WITH_INTEGER,
        ops::RECT_RETURNING_METHOD_WITH_RECT,
    ];

    /// Creates a fresh fixture with no recorded calls.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if any original operation body has run.
    #[must_use]
    pub fn was_called(&self) -> bool {
        self.called.load(Ordering::SeqCst)
    }

    /// The ordered argument values received by the most recent call.
    #[must_use]
    pub fn params(&self) -> Vec<Value> {
        self.params.lock().clone()
    }

    /// Clears the recorded call state.
    pub fn reset(&self) {
        self.called.store(false, Ordering::SeqCst);
        self.params.lock().clear();
    }

    fn note_call(&self, invocation: &Invocation) {
        self.called.store(true, Ordering::SeqCst);
        *self.params.lock() = invocation.args().to_vec();
    }

    /// Zero-argument void operation.
    pub fn void_method_without_params(&self) {
        let mut invocation = Invocation::new(ops::VOID_METHOD_WITHOUT_PARAMS, Vec::new());
        self.dispatch(&mut invocation);
    }

    /// Single-object-argument void operation.
    pub fn void_method_with_one_object_param(&self, param: ObjectRef) {
        let mut invocation = Invocation::new(
            ops::VOID_METHOD_WITH_ONE_OBJECT_PARAM,
            vec![Value::Object(param)],
        );
        self.dispatch(&mut invocation);
    }

    /// Three-object-argument void operation.
    pub fn void_method_with_three_object_params(
        &self,
        first: ObjectRef,
        second: ObjectRef,
        third: ObjectRef,
    ) {
        let mut invocation = Invocation::new(
            ops::VOID_METHOD_WITH_THREE_OBJECT_PARAMS,
            vec![
                Value::Object(first),
                Value::Object(second),
                Value::Object(third),
            ],
        );
        self.dispatch(&mut invocation);
    }

    /// Mixed-primitive-argument void operation.
    pub fn void_method_with_primitive_params(&self, integer: i64, float: f64, interval: Duration) {
        let mut invocation = Invocation::new(
            ops::VOID_METHOD_WITH_PRIMITIVE_PARAMS,
            vec![
                Value::Integer(integer),
                Value::Float(float),
                Value::Duration(interval),
            ],
        );
        self.dispatch(&mut invocation);
    }

    /// Geometry-struct-argument void operation.
    pub fn void_method_with_rect_and_transform(&self, rect: Rect, transform: AffineTransform) {
        let mut invocation = Invocation::new(
            ops::VOID_METHOD_WITH_RECT_AND_TRANSFORM,
            vec![Value::Rect(rect), Value::Transform(transform)],
        );
        self.dispatch(&mut invocation);
    }

    /// Object-returning operation; the original echoes its argument.
    ///
    /// Returns `None` if an interception left the return slot unset.
    pub fn object_returning_method_with_object(&self, param: ObjectRef) -> Option<ObjectRef> {
        let mut invocation = Invocation::new(
            ops::OBJECT_RETURNING_METHOD_WITH_OBJECT,
            vec![Value::Object(param)],
        );
        self.dispatch(&mut invocation);
        invocation.return_value().as_object()
    }

    /// Integer-returning operation; the original echoes its argument.
    #[must_use]
    pub fn integer_returning_method_with_integer(&self, param: i64) -> i64 {
        let mut invocation = Invocation::new(
            ops::INTEGER_RETURNING_METHOD_WITH_INTEGER,
            vec![Value::Integer(param)],
        );
        self.dispatch(&mut invocation);
        invocation.return_value().as_integer().unwrap_or_default()
    }

    /// Rect-returning operation; the original echoes its argument.
    #[must_use]
    pub fn rect_returning_method_with_rect(&self, param: Rect) -> Rect {
        let mut invocation =
            Invocation::new(ops::RECT_RETURNING_METHOD_WITH_RECT, vec![Value::Rect(param)]);
        self.dispatch(&mut invocation);
        invocation.return_value().as_rect().unwrap_or_default()
    }
}

impl Swizzlable for GenericTestObject {
    fn dispatch_table(&self) -> &DispatchTable {
        &self.dispatch
    }

    fn operations(&self) -> &'static [Operation] {
        &Self::OPERATIONS
    }

    fn call_original(&self, invocation: &mut Invocation) {
        self.note_call(invocation);
        let operation = invocation.operation();
        if operation == ops::OBJECT_RETURNING_METHOD_WITH_OBJECT {
            if let Some(object) = invocation.arg(0).and_then(Value::as_object) {
                invocation.set_return_value(Value::Object(object));
            }
        } else if operation == ops::INTEGER_RETURNING_METHOD_WITH_INTEGER {
            let param = invocation.arg(0).and_then(Value::as_integer).unwrap_or_default();
            invocation.set_return_value(Value::Integer(param));
        } else if operation == ops::RECT_RETURNING_METHOD_WITH_RECT {
            let param = invocation.arg(0).and_then(Value::as_rect).unwrap_or_default();
            invocation.set_return_value(Value::Rect(param));
        }
        // Void operations only record.
    }
}

//! Invocation contexts: operation identifiers, argument values, and the
//! writable return slot handed to substitute behaviors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Identifies a named operation (method) on a target object.
///
/// Operations are compared by name; targets declare the operations they
/// expose via [`Swizzlable::operations`](crate::swizzle::Swizzlable::operations).
///
/// # Example
///
/// ```rust
/// use testkit_swizzle::swizzle::Operation;
///
/// const PING: Operation = Operation::new("ping");
/// assert_eq!(PING.name(), "ping");
/// assert_eq!(PING, Operation::new("ping"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Operation(&'static str);

impl Operation {
    /// Creates an operation identifier from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A shared, dynamically-typed object reference passed as an argument or
/// returned from an intercepted operation.
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

/// A rectangle, used to exercise compound-struct calling conventions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Horizontal origin.
    pub x: f64,
    /// Vertical origin.
    pub y: f64,
    /// Width of the rectangle.
    pub width: f64,
    /// Height of the rectangle.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from origin and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A 2D affine transform, used to exercise compound-struct calling
/// conventions alongside [`Rect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    /// Matrix entry `a`.
    pub a: f64,
    /// Matrix entry `b`.
    pub b: f64,
    /// Matrix entry `c`.
    pub c: f64,
    /// Matrix entry `d`.
    pub d: f64,
    /// Horizontal translation.
    pub tx: f64,
    /// Vertical translation.
    pub ty: f64,
}

impl AffineTransform {
    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// A single argument or return value flowing through an [`Invocation`].
///
/// The variants cover every calling convention the crate is exercised
/// against: no value, primitives, durations, geometry structs, and shared
/// object references.
#[derive(Clone)]
pub enum Value {
    /// No value; the default contents of a fresh return slot.
    Unit,
    /// A signed integer.
    Integer(i64),
    /// A floating-point number.
    Float(f64),
    /// A time interval.
    Duration(Duration),
    /// A rectangle.
    Rect(Rect),
    /// An affine transform.
    Transform(AffineTransform),
    /// A shared object reference.
    Object(ObjectRef),
}

impl Value {
    /// Returns the integer payload, if any.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the float payload, if any.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the duration payload, if any.
    #[must_use]
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the rectangle payload, if any.
    #[must_use]
    pub fn as_rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the transform payload, if any.
    #[must_use]
    pub fn as_transform(&self) -> Option<AffineTransform> {
        match self {
            Self::Transform(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns a clone of the object payload, if any.
    #[must_use]
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Returns `true` if this is the unit value.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unit, Self::Unit) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (Self::Rect(a), Self::Rect(b)) => a == b,
            (Self::Transform(a), Self::Transform(b)) => a == b,
            // Object references compare by identity, not contents.
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("Unit"),
            Self::Integer(value) => f.debug_tuple("Integer").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::Duration(value) => f.debug_tuple("Duration").field(value).finish(),
            Self::Rect(value) => f.debug_tuple("Rect").field(value).finish(),
            Self::Transform(value) => f.debug_tuple("Transform").field(value).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// The context for one intercepted call: the operation, its ordered
/// arguments, and a writable return slot.
///
/// The return slot starts out as [`Value::Unit`]. Substitute behaviors may
/// overwrite it with [`set_return_value`](Self::set_return_value); whether
/// that write survives depends on the calling policy
/// (see [`CallOriginal`](crate::swizzle::CallOriginal)).
///
/// # Example
///
/// ```rust
/// use testkit_swizzle::swizzle::{Invocation, Operation, Value};
///
/// let mut invocation = Invocation::new(Operation::new("echo"), vec![Value::Integer(5)]);
/// assert_eq!(invocation.arg(0), Some(&Value::Integer(5)));
/// assert!(invocation.return_value().is_unit());
///
/// invocation.set_return_value(Value::Integer(42));
/// assert_eq!(invocation.return_value(), &Value::Integer(42));
/// ```
#[derive(Clone, Debug)]
pub struct Invocation {
    operation: Operation,
    args: Vec<Value>,
    return_value: Value,
}

impl Invocation {
    /// Creates an invocation for `operation` with the given arguments and a
    /// unit return slot.
    #[must_use]
    pub fn new(operation: Operation, args: Vec<Value>) -> Self {
        Self {
            operation,
            args,
            return_value: Value::Unit,
        }
    }

    /// The operation being invoked.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The ordered argument values of the call.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The argument at `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// The current contents of the return slot.
    #[must_use]
    pub fn return_value(&self) -> &Value {
        &self.return_value
    }

    /// Overwrites the return slot.
    pub fn set_return_value(&mut self, value: Value) {
        self.return_value = value;
    }

    /// Consumes the invocation, yielding the final return slot contents.
    #[must_use]
    pub fn into_return_value(self) -> Value {
        self.return_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_identity() {
        const A: Operation = Operation::new("alpha");
        assert_eq!(A, Operation::new("alpha"));
        assert_ne!(A, Operation::new("beta"));
        assert_eq!(A.to_string(), "alpha");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::Integer(7).as_float(), None);
        assert_eq!(Value::Float(1.5).as_float(), Some(1.5));
        assert_eq!(
            Value::Duration(Duration::from_millis(30)).as_duration(),
            Some(Duration::from_millis(30))
        );
        assert_eq!(
            Value::Rect(Rect::new(1.0, 2.0, 3.0, 4.0)).as_rect(),
            Some(Rect::new(1.0, 2.0, 3.0, 4.0))
        );
        assert!(Value::Unit.is_unit());
        assert!(!Value::Integer(0).is_unit());
    }

    #[test]
    fn test_object_values_compare_by_identity() {
        let first: ObjectRef = Arc::new(String::from("payload"));
        let second: ObjectRef = Arc::new(String::from("payload"));

        assert_eq!(
            Value::Object(Arc::clone(&first)),
            Value::Object(Arc::clone(&first))
        );
        assert_ne!(Value::Object(first), Value::Object(second));
    }

    #[test]
    fn test_object_downcast() {
        let object: ObjectRef = Arc::new(41_i32);
        let value = Value::Object(object);

        let payload = value.as_object().unwrap().downcast::<i32>().unwrap();
        assert_eq!(*payload, 41);
    }

    #[test]
    fn test_invocation_return_slot_defaults_to_unit() {
        let invocation = Invocation::new(Operation::new("noop"), Vec::new());
        assert!(invocation.return_value().is_unit());
        assert!(invocation.args().is_empty());
        assert!(invocation.arg(0).is_none());
    }

    #[test]
    fn test_invocation_set_return_value() {
        let mut invocation = Invocation::new(Operation::new("echo"), vec![Value::Integer(5)]);
        invocation.set_return_value(Value::Integer(42));
        assert_eq!(invocation.into_return_value(), Value::Integer(42));
    }

    #[test]
    fn test_transform_default_is_identity() {
        assert_eq!(AffineTransform::default(), AffineTransform::identity());
    }
}

//! Observable Data
//!
//! Plain data enters the runtime as a [`serde_json::Value`] and leaves
//! [`observe`] as an [`Observed`] tree:
//!
//! - objects become [`ReactiveObject`]s, with one Dep per property;
//! - arrays become [`ReactiveArray`]s, whose mutating operations notify the
//!   array's container Dep;
//! - everything else stays a plain primitive.
//!
//! Every observed container carries exactly one [`Observer`], which owns
//! the container Dep. The observer is part of the handle, not of the data,
//! so it never shows up among an object's keys.
//!
//! Reads go through `get`, writes through `set` and the array operations.
//! Mutating a value obtained through [`Observed::to_value`] does not notify
//! anyone; it is a snapshot.

mod array;
mod object;

use std::fmt;

use serde_json::Value;

use super::dep::Dep;

pub use array::ReactiveArray;
pub use object::ReactiveObject;

/// The back-reference every observed container carries.
#[derive(Clone)]
pub struct Observer {
    dep: Dep,
}

impl Observer {
    pub(crate) fn new() -> Self {
        Self { dep: Dep::new() }
    }

    /// The container Dep, notified on whole-container changes.
    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    /// Whether both handles belong to the same container.
    pub fn ptr_eq(&self, other: &Observer) -> bool {
        self.dep.ptr_eq(&other.dep)
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("dep", &self.dep.id()).finish()
    }
}

/// A value reachable from observed data.
#[derive(Clone, Debug)]
pub enum Observed {
    /// A primitive (null, bool, number or string). Not tracked by itself;
    /// the property holding it is.
    Primitive(Value),
    /// An observed object.
    Object(ReactiveObject),
    /// An observed array.
    Array(ReactiveArray),
}

/// Convert plain data into observed data.
///
/// Objects and arrays are wrapped recursively. Passing an already observed
/// value returns it unchanged, with the same [`Observer`]. Primitives pass
/// through and have no observer.
pub fn observe(value: impl Into<Observed>) -> Observed {
    value.into()
}

impl Observed {
    /// The container's observer. `None` for primitives.
    pub fn observer(&self) -> Option<&Observer> {
        match self {
            Observed::Primitive(_) => None,
            Observed::Object(object) => Some(object.observer()),
            Observed::Array(array) => Some(array.observer()),
        }
    }

    /// Reference/primitive identity: primitives compare by value,
    /// containers by handle.
    pub fn same(&self, other: &Observed) -> bool {
        match (self, other) {
            (Observed::Primitive(a), Observed::Primitive(b)) => a == b,
            (Observed::Object(a), Observed::Object(b)) => a.ptr_eq(b),
            (Observed::Array(a), Observed::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn as_object(&self) -> Option<&ReactiveObject> {
        match self {
            Observed::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ReactiveArray> {
        match self {
            Observed::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Value> {
        match self {
            Observed::Primitive(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_primitive().and_then(Value::as_i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_primitive().and_then(Value::as_bool)
    }

    /// Deep, untracked snapshot as plain data.
    pub fn to_value(&self) -> Value {
        match self {
            Observed::Primitive(value) => value.clone(),
            Observed::Object(object) => object.to_value(),
            Observed::Array(array) => array.to_value(),
        }
    }
}

impl PartialEq for Observed {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl From<Value> for Observed {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Observed::Object(ReactiveObject::from_map(map)),
            Value::Array(items) => Observed::Array(ReactiveArray::from_values(items)),
            primitive => Observed::Primitive(primitive),
        }
    }
}

impl From<ReactiveObject> for Observed {
    fn from(object: ReactiveObject) -> Self {
        Observed::Object(object)
    }
}

impl From<ReactiveArray> for Observed {
    fn from(array: ReactiveArray) -> Self {
        Observed::Array(array)
    }
}

macro_rules! primitive_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Observed {
                fn from(value: $ty) -> Self {
                    Observed::Primitive(Value::from(value))
                }
            }
        )*
    };
}

primitive_from!(bool, i32, i64, u32, u64, f64, &str, String);

/// Register the container Dep of every array nested in `array`, at any
/// depth, with the current target.
pub(crate) fn depend_array(array: &ReactiveArray) {
    for item in array.items_untracked() {
        if let Some(observer) = item.observer() {
            observer.dep().depend();
        }
        if let Observed::Array(nested) = &item {
            depend_array(nested);
        }
    }
}

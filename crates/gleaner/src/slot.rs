//! Value coercion into typed fields.
//!
//! Every bindable field type implements [`Slot`], the mutable handle the
//! binder writes extracted [`Value`]s through. The implementations here define
//! the coercion policy:
//!
//! - Numeric conversions check range. A value that does not fit fails with
//!   [`CoercionError::Overflow`], a negative value into an unsigned field
//!   fails with [`CoercionError::Sign`], and a float with a fractional part
//!   into an integer fails with [`CoercionError::Fractional`].
//! - Numbers convert to `bool` as `n > 0`.
//! - Text is parsed into numbers and booleans; empty text leaves the zero value.
//! - Sequences convert element by element; the first failure carries its index.
//! - A sequence into a scalar takes its first element, a scalar into a
//!   sequence becomes a one-element sequence.
//! - `Option<T>` allocates its inner value on first write.
//! - [`Value::Null`] resets any destination to its zero value.
//!
//! ```
//! use gleaner::{CoercionError, Slot, Value};
//!
//! let mut small: i8 = 0;
//! assert!(matches!(small.assign(Value::Int(1000)), Err(CoercionError::Overflow { .. })));
//!
//! let mut count: u32 = 0;
//! assert!(matches!(count.assign(Value::Int(-1)), Err(CoercionError::Sign { .. })));
//!
//! let mut ratio: f64 = 0.0;
//! ratio.assign(Value::Int(42)).unwrap();
//! assert_eq!(ratio, 42.0);
//!
//! let mut ids: Vec<u16> = Vec::new();
//! ids.assign(Value::from(vec!["1".to_string(), "2".to_string()])).unwrap();
//! assert_eq!(ids, vec![1, 2]);
//! ```

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::IntErrorKind;

use indexmap::IndexMap;

use crate::error::CoercionError;
use crate::value::{Opaque, Value};

/// Shape of a destination, as seen by the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Text.
    Text,
    /// Boolean.
    Bool,
    /// Signed or unsigned integer.
    Integer,
    /// Floating point number.
    Float,
    /// Ordered sequence.
    Sequence,
    /// Keyed map.
    Map,
    /// Record with named fields.
    Record,
    /// Dynamic sink accepting any [`Value`].
    Any,
    /// Typed sink for an opaque source payload.
    Payload,
}

impl SlotKind {
    /// Returns true for shapes the binder can decode a body into without
    /// field resolution.
    #[must_use]
    pub fn is_collection(self) -> bool {
        matches!(self, Self::Sequence | Self::Map | Self::Any)
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Bool => write!(f, "bool"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Sequence => write!(f, "sequence"),
            Self::Map => write!(f, "map"),
            Self::Record => write!(f, "record"),
            Self::Any => write!(f, "any"),
            Self::Payload => write!(f, "payload"),
        }
    }
}

/// A mutable handle to one bindable value.
///
/// `Slot` is object safe; the binder, transforms and record merging all work
/// through `&mut dyn Slot`. Implement it for a custom field type to make that
/// type bindable.
///
/// # Example
///
/// ```
/// use gleaner::{CoercionError, Slot, SlotKind, Value};
///
/// #[derive(Default)]
/// struct Celsius(f64);
///
/// impl Slot for Celsius {
///     fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
///         self.0.assign(value)
///     }
///     fn to_value(&self) -> Value {
///         self.0.to_value()
///     }
///     fn is_zero(&self) -> bool {
///         self.0.is_zero()
///     }
///     fn reset(&mut self) {
///         self.0 = 0.0;
///     }
///     fn kind(&self) -> SlotKind {
///         SlotKind::Float
///     }
/// }
///
/// let mut t = Celsius::default();
/// t.assign(Value::from("21.5")).unwrap();
/// assert_eq!(t.0, 21.5);
/// ```
pub trait Slot {
    /// Coerces `value` into this destination and stores it.
    fn assign(&mut self, value: Value) -> Result<(), CoercionError>;

    /// Returns the current contents as a [`Value`].
    fn to_value(&self) -> Value;

    /// Returns true if this holds its zero value.
    fn is_zero(&self) -> bool;

    /// Resets to the zero value, keeping allocations where possible.
    fn reset(&mut self);

    /// Returns the destination's shape.
    fn kind(&self) -> SlotKind;
}

const TRUE_WORDS: [&str; 5] = ["1", "t", "true", "yes", "on"];
const FALSE_WORDS: [&str; 5] = ["0", "f", "false", "no", "off"];

fn parse_bool(text: &str) -> Option<bool> {
    if TRUE_WORDS.iter().any(|w| text.eq_ignore_ascii_case(w)) {
        Some(true)
    } else if FALSE_WORDS.iter().any(|w| text.eq_ignore_ascii_case(w)) {
        Some(false)
    } else {
        None
    }
}

/// Reduces a sequence to its first element and an opaque payload to its text.
///
/// Returns `None` when nothing is left to convert.
fn scalar(value: Value, target: &'static str) -> Result<Option<Value>, CoercionError> {
    match value {
        Value::Null => Ok(None),
        Value::List(items) => match items.into_iter().next() {
            Some(first) => scalar(first, target),
            None => Ok(None),
        },
        Value::Opaque(payload) => match payload.text() {
            Some(text) => Ok(Some(Value::Text(text.to_string()))),
            None => Err(CoercionError::unsupported("opaque payload", target)),
        },
        Value::Map(_) => Err(CoercionError::unsupported("map", target)),
        other => Ok(Some(other)),
    }
}

fn integer(value: Value, target: &'static str) -> Result<Option<i128>, CoercionError> {
    let Some(value) = scalar(value, target)? else {
        return Ok(None);
    };
    match value {
        Value::Bool(b) => Ok(Some(i128::from(b))),
        Value::Int(n) => Ok(Some(i128::from(n))),
        Value::Uint(n) => Ok(Some(i128::from(n))),
        Value::Float(f) => {
            if !f.is_finite() || f < -9.3e18 || f > 1.9e19 {
                Err(CoercionError::Overflow {
                    value: f.to_string(),
                    target,
                })
            } else if f.fract() != 0.0 {
                Err(CoercionError::Fractional {
                    value: f.to_string(),
                    target,
                })
            } else {
                Ok(Some(f as i128))
            }
        }
        Value::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            match text.parse::<i128>() {
                Ok(n) => Ok(Some(n)),
                Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                    Err(CoercionError::Overflow {
                        value: text.to_string(),
                        target,
                    })
                }
                Err(_) => Err(CoercionError::Parse {
                    input: text.to_string(),
                    target,
                }),
            }
        }
        other => Err(CoercionError::unsupported(other.kind(), target)),
    }
}

fn narrow<T: TryFrom<i128>>(n: i128, target: &'static str, unsigned: bool) -> Result<T, CoercionError> {
    T::try_from(n).map_err(|_| {
        if unsigned && n < 0 {
            CoercionError::Sign {
                value: n.to_string(),
                target,
            }
        } else {
            CoercionError::Overflow {
                value: n.to_string(),
                target,
            }
        }
    })
}

fn float(value: Value, target: &'static str) -> Result<Option<f64>, CoercionError> {
    let Some(value) = scalar(value, target)? else {
        return Ok(None);
    };
    match value {
        Value::Bool(b) => Ok(Some(if b { 1.0 } else { 0.0 })),
        Value::Int(n) => Ok(Some(n as f64)),
        Value::Uint(n) => Ok(Some(n as f64)),
        Value::Float(f) => Ok(Some(f)),
        Value::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>().map(Some).map_err(|_| CoercionError::Parse {
                input: text.to_string(),
                target,
            })
        }
        other => Err(CoercionError::unsupported(other.kind(), target)),
    }
}

macro_rules! impl_integer_slot {
    ($unsigned:literal, $variant:ident, $wide:ty; $($ty:ty),*) => {
        $(
            impl Slot for $ty {
                fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
                    let target = stringify!($ty);
                    *self = match integer(value, target)? {
                        Some(n) => narrow(n, target, $unsigned)?,
                        None => 0,
                    };
                    Ok(())
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self as $wide)
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }

                fn reset(&mut self) {
                    *self = 0;
                }

                fn kind(&self) -> SlotKind {
                    SlotKind::Integer
                }
            }
        )*
    };
}

impl_integer_slot!(false, Int, i64; i8, i16, i32, i64, isize);
impl_integer_slot!(true, Uint, u64; u8, u16, u32, u64, usize);

impl Slot for f64 {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        *self = float(value, "f64")?.unwrap_or(0.0);
        Ok(())
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn reset(&mut self) {
        *self = 0.0;
    }

    fn kind(&self) -> SlotKind {
        SlotKind::Float
    }
}

impl Slot for f32 {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        let wide = float(value, "f32")?.unwrap_or(0.0);
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(CoercionError::Overflow {
                value: wide.to_string(),
                target: "f32",
            });
        }
        *self = wide as f32;
        Ok(())
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }

    fn reset(&mut self) {
        *self = 0.0;
    }

    fn kind(&self) -> SlotKind {
        SlotKind::Float
    }
}

impl Slot for bool {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        let Some(value) = scalar(value, "bool")? else {
            *self = false;
            return Ok(());
        };
        *self = match value {
            Value::Bool(b) => b,
            Value::Int(n) => n > 0,
            Value::Uint(n) => n > 0,
            Value::Float(f) => f > 0.0,
            Value::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    false
                } else {
                    parse_bool(text).ok_or_else(|| CoercionError::Parse {
                        input: text.to_string(),
                        target: "bool",
                    })?
                }
            }
            other => return Err(CoercionError::unsupported(other.kind(), "bool")),
        };
        Ok(())
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn is_zero(&self) -> bool {
        !*self
    }

    fn reset(&mut self) {
        *self = false;
    }

    fn kind(&self) -> SlotKind {
        SlotKind::Bool
    }
}

impl Slot for String {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        let Some(value) = scalar(value, "String")? else {
            self.clear();
            return Ok(());
        };
        match value {
            Value::Text(text) => *self = text,
            Value::Bool(b) => *self = b.to_string(),
            Value::Int(n) => *self = n.to_string(),
            Value::Uint(n) => *self = n.to_string(),
            Value::Float(f) => *self = f.to_string(),
            other => return Err(CoercionError::unsupported(other.kind(), "String")),
        }
        Ok(())
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn kind(&self) -> SlotKind {
        SlotKind::Text
    }
}

impl<T: Slot + Default> Slot for Vec<T> {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        self.clear();
        let items = match value {
            Value::Null => return Ok(()),
            Value::List(items) => items,
            Value::Map(_) => return Err(CoercionError::unsupported("map", "sequence")),
            single => vec![single],
        };
        self.reserve(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let mut element = T::default();
            if let Err(e) = element.assign(item) {
                self.clear();
                return Err(CoercionError::element(index, e));
            }
            self.push(element);
        }
        Ok(())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Slot::to_value).collect())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn kind(&self) -> SlotKind {
        SlotKind::Sequence
    }
}

impl<T: Slot + Default> Slot for Option<T> {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        match self {
            Some(inner) => inner.assign(value),
            None => {
                let mut inner = T::default();
                inner.assign(value)?;
                *self = Some(inner);
                Ok(())
            }
        }
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Slot::to_value)
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }

    fn reset(&mut self) {
        *self = None;
    }

    fn kind(&self) -> SlotKind {
        match self {
            Some(inner) => inner.kind(),
            None => T::default().kind(),
        }
    }
}

impl<T: Slot + ?Sized> Slot for Box<T> {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        (**self).assign(value)
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn kind(&self) -> SlotKind {
        (**self).kind()
    }
}

macro_rules! impl_map_slot {
    ($($map:ident),*) => {
        $(
            impl<T: Slot + Default> Slot for $map<String, T> {
                fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
                    self.clear();
                    let entries = match value {
                        Value::Null => return Ok(()),
                        Value::Map(entries) => entries,
                        other => return Err(CoercionError::unsupported(other.kind(), "map")),
                    };
                    for (key, item) in entries {
                        let mut element = T::default();
                        if let Err(e) = element.assign(item) {
                            self.clear();
                            return Err(CoercionError::entry(key, e));
                        }
                        self.insert(key, element);
                    }
                    Ok(())
                }

                fn to_value(&self) -> Value {
                    Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
                }

                fn is_zero(&self) -> bool {
                    self.is_empty()
                }

                fn reset(&mut self) {
                    self.clear();
                }

                fn kind(&self) -> SlotKind {
                    SlotKind::Map
                }
            }
        )*
    };
}

impl_map_slot!(HashMap, BTreeMap, IndexMap);

impl Slot for Value {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        *self = value;
        Ok(())
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn is_zero(&self) -> bool {
        self.is_null()
    }

    fn reset(&mut self) {
        *self = Value::Null;
    }

    fn kind(&self) -> SlotKind {
        SlotKind::Any
    }
}

/// Field type receiving an opaque payload of type `T`.
///
/// Sources that produce richer values than text (an uploaded file, a parsed
/// certificate) wrap them in an [`Opaque`]; a `Payload<T>` field accepts the
/// payload when its type matches.
///
/// ```
/// use gleaner::{Opaque, Payload, Slot, Value};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Upload { size: usize }
///
/// let mut field: Payload<Upload> = Payload::default();
/// field.assign(Value::Opaque(Opaque::new(Upload { size: 3 }))).unwrap();
/// assert_eq!(field.get(), Some(&Upload { size: 3 }));
///
/// assert!(field.assign(Value::from("text")).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Payload<T>(pub Option<T>);

impl<T> Payload<T> {
    /// Returns the payload, if one was bound.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    /// Consumes the wrapper and returns the payload.
    #[must_use]
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<T> Default for Payload<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T: Any + Clone + Send + Sync> Slot for Payload<T> {
    fn assign(&mut self, value: Value) -> Result<(), CoercionError> {
        let target = std::any::type_name::<T>();
        match value {
            Value::Null => {
                self.0 = None;
                Ok(())
            }
            Value::Opaque(payload) => match payload.downcast_ref::<T>() {
                Some(inner) => {
                    self.0 = Some(inner.clone());
                    Ok(())
                }
                None => Err(CoercionError::unsupported(payload.type_name(), target)),
            },
            other => Err(CoercionError::unsupported(other.kind(), target)),
        }
    }

    fn to_value(&self) -> Value {
        self.0
            .as_ref()
            .map_or(Value::Null, |inner| Value::Opaque(Opaque::new(inner.clone())))
    }

    fn is_zero(&self) -> bool {
        self.0.is_none()
    }

    fn reset(&mut self) {
        self.0 = None;
    }

    fn kind(&self) -> SlotKind {
        SlotKind::Payload
    }
}

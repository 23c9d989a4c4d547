//! Dynamically typed values produced by extraction sources and body decoders.
//!
//! [`Value`] is a closed set of variants so the coercion rules in
//! [`slot`](crate::slot) can match on it exhaustively.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A value extracted from a request, before coercion into a field.
///
/// # Example
///
/// ```
/// use gleaner::Value;
///
/// let single = Value::from("42");
/// assert_eq!(single.as_text(), Some("42"));
///
/// let repeated = Value::from(vec!["a".to_string(), "b".to_string()]);
/// assert_eq!(repeated.kind(), "sequence");
///
/// let json = Value::from(serde_json::json!({"age": 30}));
/// assert_eq!(json.get("age"), Some(&Value::Int(30)));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer too large for `Int`, or produced as unsigned.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Keyed document, insertion ordered.
    Map(IndexMap<String, Value>),
    /// Source-specific payload.
    Opaque(Opaque),
}

impl Value {
    /// Returns a short name for the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Uint(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "sequence",
            Self::Map(_) => "map",
            Self::Opaque(_) => "opaque payload",
        }
    }

    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text if this is a [`Value::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a key in a [`Value::Map`].
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Builds a value from the values of one repeated key.
    ///
    /// No values is [`Value::Null`], one value is [`Value::Text`] and more
    /// than one is a [`Value::List`] of text.
    #[must_use]
    pub fn from_repeated<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<Value> = values.into_iter().map(|v| Value::Text(v.into())).collect();
        match items.len() {
            0 => Self::Null,
            1 => items.swap_remove(0),
            _ => Self::List(items),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(items) => write!(f, "[{} items]", items.len()),
            Self::Map(map) => write!(f, "{{{} entries}}", map.len()),
            Self::Opaque(payload) => write!(f, "<{}>", payload.type_name()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Self::List(values.into_iter().map(Value::Text).collect())
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<Opaque> for Value {
    fn from(value: Opaque) -> Self {
        Self::Opaque(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Uint(u64::from(value))
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Uint(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::Text(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Uint(n) => serializer.serialize_u64(*n),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Opaque(payload) => match payload.text() {
                Some(text) => serializer.serialize_str(text),
                None => serializer.serialize_unit(),
            },
        }
    }
}

/// A source-specific payload carried through coercion untouched.
///
/// Payloads are reference counted, so cloning a [`Value`] holding one is
/// cheap. A payload built with [`Opaque::displayable`] can also be coerced
/// into text destinations.
///
/// # Example
///
/// ```
/// use gleaner::Opaque;
///
/// #[derive(Debug, PartialEq)]
/// struct Upload { name: String }
///
/// let payload = Opaque::new(Upload { name: "a.png".into() });
/// assert_eq!(payload.downcast_ref::<Upload>().map(|u| u.name.as_str()), Some("a.png"));
/// assert_eq!(payload.text(), None);
///
/// let addr = Opaque::displayable(std::net::Ipv4Addr::LOCALHOST);
/// assert_eq!(addr.text(), Some("127.0.0.1"));
/// ```
#[derive(Clone)]
pub struct Opaque {
    payload: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    text: Option<Arc<str>>,
}

impl Opaque {
    /// Wraps a payload with no textual rendering.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            payload: Arc::new(payload),
            type_name: std::any::type_name::<T>(),
            text: None,
        }
    }

    /// Wraps a payload that renders as text through [`fmt::Display`].
    pub fn displayable<T: Any + Send + Sync + fmt::Display>(payload: T) -> Self {
        let text = Arc::from(payload.to_string());
        Self {
            payload: Arc::new(payload),
            type_name: std::any::type_name::<T>(),
            text: Some(text),
        }
    }

    /// Returns the payload's type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the textual rendering, if the payload has one.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the payload if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Returns true if the payload is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

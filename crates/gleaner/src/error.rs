//! Error types for binding.
//!
//! [`BindError`] is returned by every [`Binder`](crate::Binder) entry point.
//! [`CoercionError`] describes why a single [`Value`](crate::Value) could not
//! be stored in a field, and [`ConfigError`] covers binder construction and
//! option loading.
//!
//! The binder has no notion of transport-level responses. Callers map
//! [`BindError::kind`] to whatever status or log level they need:
//!
//! ```
//! use gleaner::{BindError, BindErrorKind};
//!
//! fn status_for(err: &BindError) -> u16 {
//!     match err.kind() {
//!         BindErrorKind::Decode | BindErrorKind::Coercion | BindErrorKind::Transform => 400,
//!         BindErrorKind::Hook => 422,
//!         _ => 500,
//!     }
//! }
//!
//! let err = BindError::NilArgument("request");
//! assert_eq!(status_for(&err), 500);
//! ```

use std::fmt;

use thiserror::Error;

use crate::slot::SlotKind;

/// Boxed error type returned by extraction sources, decoders, transforms and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias using [`BindError`].
pub type BindResult<T> = Result<T, BindError>;

/// Coarse classification of a [`BindError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindErrorKind {
    /// A required argument was absent.
    NilArgument,
    /// The destination is neither a record nor a collection.
    UnsupportedDestination,
    /// The body could not be read or decoded.
    Decode,
    /// An extracted value could not be stored in a field.
    Coercion,
    /// A declared default literal could not be stored in its field.
    DefaultValue,
    /// A transform rejected a field value.
    Transform,
    /// The post-bind hook failed.
    Hook,
}

impl fmt::Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NilArgument => write!(f, "nil_argument"),
            Self::UnsupportedDestination => write!(f, "unsupported_destination"),
            Self::Decode => write!(f, "decode"),
            Self::Coercion => write!(f, "coercion"),
            Self::DefaultValue => write!(f, "default_value"),
            Self::Transform => write!(f, "transform"),
            Self::Hook => write!(f, "hook"),
        }
    }
}

/// Error returned by a bind call.
///
/// The first field-level or decode-level failure aborts the call; there is no
/// partial success.
#[derive(Error, Debug)]
pub enum BindError {
    /// A required argument was not supplied.
    #[error("nil {0} passed to bind")]
    NilArgument(&'static str),

    /// The destination cannot be bound.
    #[error("cannot bind into {type_name}: expected a record or collection, found {kind}")]
    UnsupportedDestination {
        /// Destination type name.
        type_name: &'static str,
        /// Kind of the destination.
        kind: SlotKind,
    },

    /// Reading or decoding the request body failed.
    #[error("failed to decode {content_type} body into {type_name}")]
    Decode {
        /// Content type the decoder was selected for.
        content_type: String,
        /// Destination type name.
        type_name: &'static str,
        /// Underlying decoder, reader or merge error.
        #[source]
        source: BoxError,
    },

    /// A value produced by an extraction source could not be coerced.
    #[error("cannot bind field `{field}` of {type_name} from `{source_tag}`")]
    Coercion {
        /// Destination type name.
        type_name: &'static str,
        /// Field name.
        field: &'static str,
        /// Tag of the extraction source that produced the value.
        source_tag: String,
        /// Coercion failure.
        #[source]
        source: CoercionError,
    },

    /// A declared default literal failed to coerce.
    #[error("invalid default {literal:?} for field `{field}` of {type_name}")]
    DefaultValue {
        /// Destination type name.
        type_name: &'static str,
        /// Field name.
        field: &'static str,
        /// Declared default literal.
        literal: &'static str,
        /// Coercion failure.
        #[source]
        source: CoercionError,
    },

    /// A transform rejected the field value.
    #[error("transform `{tag}` rejected field `{field}` of {type_name}")]
    Transform {
        /// Destination type name.
        type_name: &'static str,
        /// Field name.
        field: &'static str,
        /// Transform tag.
        tag: String,
        /// Transform failure.
        #[source]
        source: BoxError,
    },

    /// The destination's post-bind hook failed.
    #[error("post-bind hook of {type_name} failed")]
    Hook {
        /// Destination type name.
        type_name: &'static str,
        /// Hook failure.
        #[source]
        source: BoxError,
    },
}

impl BindError {
    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> BindErrorKind {
        match self {
            Self::NilArgument(_) => BindErrorKind::NilArgument,
            Self::UnsupportedDestination { .. } => BindErrorKind::UnsupportedDestination,
            Self::Decode { .. } => BindErrorKind::Decode,
            Self::Coercion { .. } => BindErrorKind::Coercion,
            Self::DefaultValue { .. } => BindErrorKind::DefaultValue,
            Self::Transform { .. } => BindErrorKind::Transform,
            Self::Hook { .. } => BindErrorKind::Hook,
        }
    }

    /// Returns the offending field name, if the failure is field-level.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Coercion { field, .. }
            | Self::DefaultValue { field, .. }
            | Self::Transform { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Returns the destination type name, if known.
    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::NilArgument(_) => None,
            Self::UnsupportedDestination { type_name, .. }
            | Self::Decode { type_name, .. }
            | Self::Coercion { type_name, .. }
            | Self::DefaultValue { type_name, .. }
            | Self::Transform { type_name, .. }
            | Self::Hook { type_name, .. } => Some(type_name),
        }
    }

    /// Returns the coercion failure for `Coercion` and `DefaultValue` errors.
    #[must_use]
    pub fn coercion(&self) -> Option<&CoercionError> {
        match self {
            Self::Coercion { source, .. } | Self::DefaultValue { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure to store a [`Value`](crate::Value) in a destination.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// The value does not fit the destination's range.
    #[error("value {value} overflows {target}")]
    Overflow {
        /// Rendered source value.
        value: String,
        /// Destination type.
        target: &'static str,
    },

    /// A negative value was written to an unsigned destination.
    #[error("negative value {value} cannot be stored in unsigned {target}")]
    Sign {
        /// Rendered source value.
        value: String,
        /// Destination type.
        target: &'static str,
    },

    /// A float with a fractional part was written to an integer destination.
    #[error("fractional value {value} cannot be stored in integer {target}")]
    Fractional {
        /// Rendered source value.
        value: String,
        /// Destination type.
        target: &'static str,
    },

    /// Text could not be parsed as the destination type.
    #[error("cannot parse {input:?} as {target}")]
    Parse {
        /// Source text.
        input: String,
        /// Destination type.
        target: &'static str,
    },

    /// The value's kind cannot be stored in the destination.
    #[error("cannot store {found} in {target}")]
    Unsupported {
        /// Kind of the source value.
        found: &'static str,
        /// Destination type.
        target: &'static str,
    },

    /// A sequence element failed to convert.
    #[error("element {index}: {source}")]
    Element {
        /// Position of the failing element.
        index: usize,
        /// Element failure.
        source: Box<CoercionError>,
    },

    /// A map entry failed to convert.
    #[error("entry {key:?}: {source}")]
    Entry {
        /// Key of the failing entry.
        key: String,
        /// Entry failure.
        source: Box<CoercionError>,
    },

    /// A nested record field failed to convert.
    #[error("field `{name}`: {source}")]
    Field {
        /// Field name.
        name: &'static str,
        /// Field failure.
        source: Box<CoercionError>,
    },
}

impl CoercionError {
    pub(crate) fn unsupported(found: &'static str, target: &'static str) -> Self {
        Self::Unsupported { found, target }
    }

    pub(crate) fn element(index: usize, source: Self) -> Self {
        Self::Element {
            index,
            source: Box::new(source),
        }
    }

    pub(crate) fn entry(key: impl Into<String>, source: Self) -> Self {
        Self::Entry {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Wraps a failure of the nested record field `name`.
    ///
    /// Used by `#[derive(Record)]` when merging a document into a record.
    #[must_use]
    pub fn field(name: &'static str, source: Self) -> Self {
        Self::Field {
            name,
            source: Box::new(source),
        }
    }

    /// Returns the innermost failure, skipping element/entry/field wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Element { source, .. } | Self::Entry { source, .. } | Self::Field { source, .. } => {
                source.root()
            }
            other => other,
        }
    }
}

/// Error building a binder or loading its options.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two plug-ins were registered under the same tag.
    #[error("tag `{0}` is registered more than once")]
    DuplicateTag(String),

    /// A plug-in was registered under a reserved annotation key.
    #[error("tag `{0}` is reserved")]
    ReservedTag(String),

    /// A plug-in was registered under an empty tag or content type.
    #[error("plug-in registered with an empty tag")]
    EmptyTag,

    /// Reading an options file failed.
    #[error("failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing TOML options failed.
    #[error("failed to parse options: {0}")]
    Toml(#[from] toml::de::Error),

    /// Parsing JSON options failed.
    #[error("failed to parse options: {0}")]
    Json(#[from] serde_json::Error),

    /// An options file or string used a format other than TOML or JSON.
    #[error("unsupported options format: {0}")]
    UnsupportedFormat(String),

    /// An environment override held an invalid value.
    #[error("invalid value {value:?} for environment variable {name}")]
    Env {
        /// Variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_accessors() {
        let err = BindError::Coercion {
            type_name: "Signup",
            field: "age",
            source_tag: "query".to_string(),
            source: CoercionError::Overflow {
                value: "1000".to_string(),
                target: "i8",
            },
        };

        assert_eq!(err.kind(), BindErrorKind::Coercion);
        assert_eq!(err.field(), Some("age"));
        assert_eq!(err.type_name(), Some("Signup"));
        assert!(err.to_string().contains("age"));
        assert!(err.to_string().contains("query"));
        assert!(matches!(err.coercion(), Some(CoercionError::Overflow { .. })));
    }

    #[test]
    fn test_nil_argument() {
        let err = BindError::NilArgument("destination");
        assert_eq!(err.kind(), BindErrorKind::NilArgument);
        assert_eq!(err.field(), None);
        assert_eq!(err.type_name(), None);
        assert_eq!(err.to_string(), "nil destination passed to bind");
    }

    #[test]
    fn test_decode_error_keeps_source() {
        let err = BindError::Decode {
            content_type: "application/json".to_string(),
            type_name: "Signup",
            source: "unexpected token".into(),
        };

        assert_eq!(err.kind(), BindErrorKind::Decode);
        assert!(err.to_string().contains("application/json"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("unexpected token"));
    }

    #[test]
    fn test_coercion_root() {
        let inner = CoercionError::Sign {
            value: "-1".to_string(),
            target: "u8",
        };
        let err = CoercionError::element(2, CoercionError::entry("a", inner.clone()));

        assert_eq!(err.root(), &inner);
        assert_eq!(
            err.to_string(),
            "element 2: entry \"a\": negative value -1 cannot be stored in unsigned u8"
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(BindErrorKind::DefaultValue.to_string(), "default_value");
        assert_eq!(BindErrorKind::UnsupportedDestination.to_string(), "unsupported_destination");
    }
}

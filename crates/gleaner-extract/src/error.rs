//! Errors raised by the reference decoders and transforms.
//!
//! The binder wraps these in `BindError::Decode` and `BindError::Transform`,
//! where they stay reachable through `std::error::Error::source`.

use gleaner::{CoercionError, SlotKind};
use thiserror::Error;

/// Failure inside a decoder or transform from this crate.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The body exceeds the decoder's size limit.
    #[error("body of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Body size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The body is not valid JSON.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// The body is not a valid URL-encoded form.
    #[error("invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    /// A transform was applied to a field it cannot handle.
    #[error("transform `{transform}` cannot be applied to a {kind} field")]
    UnsupportedField {
        /// Transform tag.
        transform: &'static str,
        /// Kind of the field.
        kind: SlotKind,
    },

    /// A transform was applied to a value it cannot handle.
    #[error("transform `{transform}` cannot be applied to {found}")]
    UnsupportedValue {
        /// Transform tag.
        transform: &'static str,
        /// Kind of the offending value.
        found: &'static str,
    },

    /// A field's annotation is not valid for the transform.
    #[error("invalid annotation {annotation:?} for transform `{transform}`")]
    InvalidAnnotation {
        /// Transform tag.
        transform: &'static str,
        /// The annotation as written.
        annotation: String,
    },

    /// Writing the transformed value back failed.
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

impl ExtractError {
    pub(crate) fn annotation(transform: &'static str, annotation: &str) -> Self {
        Self::InvalidAnnotation {
            transform,
            annotation: annotation.to_string(),
        }
    }
}

//! Plug-in contracts.
//!
//! The binder never reads a request part itself. It asks registered
//! [`ExtractionSource`]s for field values, a [`BodyDecoder`] for the body
//! document, and [`Transform`]s to post-process populated fields. Each trait is
//! also implemented for plain closures with the matching signature.

use crate::error::BoxError;
use crate::memo::Memo;
use crate::request::BindRequest;
use crate::slot::Slot;
use crate::value::Value;

/// Reads one part of a request into a field value.
///
/// `annotation` is the string the field declared for this source's tag, for
/// example the header name in `#[bind(header = "x-api-key")]`. Returning
/// `None` means the request has no value for this field and lets the next
/// source try.
///
/// # Example
///
/// ```
/// use gleaner::{BindRequest, ExtractionSource, Memo, Value};
///
/// struct Method;
///
/// impl ExtractionSource for Method {
///     fn extract(&self, request: &BindRequest, _annotation: &str, _memo: &mut Memo) -> Option<Value> {
///         Some(Value::from(request.method().as_str()))
///     }
/// }
///
/// let req = BindRequest::builder().build();
/// let value = Method.extract(&req, "", &mut Memo::new());
/// assert_eq!(value, Some(Value::from("GET")));
/// ```
pub trait ExtractionSource: Send + Sync {
    /// Extracts the value named by `annotation`, if the request has one.
    fn extract(&self, request: &BindRequest, annotation: &str, memo: &mut Memo) -> Option<Value>;
}

impl<F> ExtractionSource for F
where
    F: Fn(&BindRequest, &str, &mut Memo) -> Option<Value> + Send + Sync,
{
    fn extract(&self, request: &BindRequest, annotation: &str, memo: &mut Memo) -> Option<Value> {
        self(request, annotation, memo)
    }
}

/// Decodes a request body into a document.
///
/// The binder selects a decoder by the request's media type and merges the
/// returned document into the destination. Returning [`Value::Null`] leaves
/// the destination untouched.
pub trait BodyDecoder: Send + Sync {
    /// Decodes `body`, which was read from `request`.
    fn decode(&self, request: &BindRequest, body: &[u8]) -> Result<Value, BoxError>;

    /// Checks the declared `Content-Length` before the body is read.
    ///
    /// Rejecting here keeps an oversized reader body from being buffered.
    fn check_length(&self, _request: &BindRequest, _length: u64) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<F> BodyDecoder for F
where
    F: Fn(&BindRequest, &[u8]) -> Result<Value, BoxError> + Send + Sync,
{
    fn decode(&self, request: &BindRequest, body: &[u8]) -> Result<Value, BoxError> {
        self(request, body)
    }
}

/// Post-processes a populated field in place.
///
/// A transform may rewrite the value through the [`Slot`] handle or reject it;
/// rejection fails the bind call.
///
/// # Example
///
/// ```
/// use gleaner::{BoxError, Slot, Transform, Value};
///
/// struct Reverse;
///
/// impl Transform for Reverse {
///     fn apply(&self, _annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
///         let Some(text) = slot.to_value().as_text().map(|s| s.chars().rev().collect::<String>()) else {
///             return Err("reverse needs text".into());
///         };
///         slot.assign(Value::Text(text))?;
///         Ok(())
///     }
/// }
///
/// let mut name = String::from("abc");
/// Reverse.apply("", &mut name).unwrap();
/// assert_eq!(name, "cba");
/// ```
pub trait Transform: Send + Sync {
    /// Applies the transform to `slot`, configured by the field's annotation.
    fn apply(&self, annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError>;
}

impl<F> Transform for F
where
    F: Fn(&str, &mut dyn Slot) -> Result<(), BoxError> + Send + Sync,
{
    fn apply(&self, annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
        self(annotation, slot)
    }
}

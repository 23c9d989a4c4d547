//! Path parameter source.

use gleaner::{BindRequest, ExtractionSource, Memo, Value};

/// Reads path parameters captured by the router.
///
/// The annotation is the parameter name.
///
/// # Example
///
/// ```
/// use gleaner::{BindRequest, ExtractionSource, Memo, Value};
/// use gleaner_extract::PathSource;
///
/// let req = BindRequest::builder()
///     .uri("/users/42")
///     .path_param("id", "42")
///     .build();
///
/// assert_eq!(PathSource.extract(&req, "id", &mut Memo::new()), Some(Value::from("42")));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSource;

impl ExtractionSource for PathSource {
    fn extract(&self, request: &BindRequest, annotation: &str, _memo: &mut Memo) -> Option<Value> {
        request.path_params().get(annotation).map(Value::from)
    }
}

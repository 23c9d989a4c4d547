//! Header source.

use gleaner::{BindRequest, ExtractionSource, Memo, Value};

/// Reads request headers, case-insensitively.
///
/// The annotation is the header name. A header sent more than once produces
/// a sequence; values that are not visible ASCII are ignored.
///
/// # Example
///
/// ```
/// use gleaner::{BindRequest, ExtractionSource, Memo, Value};
/// use gleaner_extract::HeaderSource;
///
/// let req = BindRequest::builder().header("X-Api-Key", "secret").build();
///
/// assert_eq!(
///     HeaderSource.extract(&req, "x-api-key", &mut Memo::new()),
///     Some(Value::from("secret"))
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderSource;

impl ExtractionSource for HeaderSource {
    fn extract(&self, request: &BindRequest, annotation: &str, _memo: &mut Memo) -> Option<Value> {
        let value = Value::from_repeated(
            request
                .headers()
                .get_all(annotation)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );
        (!value.is_null()).then_some(value)
    }
}

//! Query string source.

use gleaner::{BindRequest, ExtractionSource, Memo, Value};

const MEMO_KEY: &str = "gleaner_extract::query";

type Pairs = Vec<(String, String)>;

/// Reads URL-decoded query parameters.
///
/// The annotation is the parameter name. A repeated parameter produces a
/// sequence. The query string is parsed once per bind call.
///
/// # Example
///
/// ```
/// use gleaner::{BindRequest, ExtractionSource, Memo, Value};
/// use gleaner_extract::QuerySource;
///
/// let req = BindRequest::builder().uri("/search?q=rust+lang&tag=a&tag=b").build();
/// let mut memo = Memo::new();
///
/// assert_eq!(QuerySource.extract(&req, "q", &mut memo), Some(Value::from("rust lang")));
/// assert_eq!(
///     QuerySource.extract(&req, "tag", &mut memo),
///     Some(Value::from(vec!["a".to_string(), "b".to_string()]))
/// );
/// assert_eq!(QuerySource.extract(&req, "page", &mut memo), None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct QuerySource;

impl ExtractionSource for QuerySource {
    fn extract(&self, request: &BindRequest, annotation: &str, memo: &mut Memo) -> Option<Value> {
        let pairs: &Pairs = memo.get_or_insert_with(MEMO_KEY, || parse(request.query_string()));
        let value = Value::from_repeated(
            pairs
                .iter()
                .filter(|(name, _)| name == annotation)
                .map(|(_, value)| value.as_str()),
        );
        (!value.is_null()).then_some(value)
    }
}

fn parse(query: Option<&str>) -> Pairs {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return Vec::new();
    };
    serde_urlencoded::from_str(query).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "ignoring malformed query string");
        Vec::new()
    })
}

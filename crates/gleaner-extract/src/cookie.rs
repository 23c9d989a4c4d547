//! Cookie source.

use gleaner::{BindRequest, ExtractionSource, Memo, Value};
use http::header;

const MEMO_KEY: &str = "gleaner_extract::cookie";

/// Cookies sent with a request, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    pairs: Vec<(String, String)>,
}

impl CookieJar {
    /// Parses every `Cookie` header of `request`.
    #[must_use]
    pub fn from_request(request: &BindRequest) -> Self {
        let mut jar = Self::default();
        for value in request.headers().get_all(header::COOKIE) {
            if let Ok(value) = value.to_str() {
                jar.parse(value);
            }
        }
        jar
    }

    fn parse(&mut self, header_value: &str) {
        for cookie in header_value.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let value = value.trim().trim_matches('"');
                self.pairs.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Returns the first cookie named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no cookie was sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Reads cookies by name.
///
/// The annotation is the cookie name; surrounding quotes are removed. The
/// `Cookie` headers are parsed once per bind call.
///
/// # Example
///
/// ```
/// use gleaner::{BindRequest, ExtractionSource, Memo, Value};
/// use gleaner_extract::CookieSource;
///
/// let req = BindRequest::builder()
///     .header("cookie", "session=abc123; theme=\"dark\"")
///     .build();
/// let mut memo = Memo::new();
///
/// assert_eq!(CookieSource.extract(&req, "theme", &mut memo), Some(Value::from("dark")));
/// assert_eq!(CookieSource.extract(&req, "lang", &mut memo), None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSource;

impl ExtractionSource for CookieSource {
    fn extract(&self, request: &BindRequest, annotation: &str, memo: &mut Memo) -> Option<Value> {
        memo.get_or_insert_with(MEMO_KEY, || CookieJar::from_request(request))
            .get(annotation)
            .map(Value::from)
    }
}

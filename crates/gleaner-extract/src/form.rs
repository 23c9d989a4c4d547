//! URL-encoded form body decoder.

use gleaner::{BindRequest, BodyDecoder, BoxError, Value};
use indexmap::IndexMap;

use crate::error::ExtractError;

/// Default maximum body size for form decoding (1 MB).
pub const DEFAULT_FORM_LIMIT: usize = 1024 * 1024;

/// Decodes `application/x-www-form-urlencoded` bodies into a [`Value::Map`].
///
/// Every value is text; a key sent more than once becomes a sequence, in
/// body order.
///
/// # Example
///
/// ```
/// use gleaner::{BindRequest, BodyDecoder, Value};
/// use gleaner_extract::FormDecoder;
///
/// let req = BindRequest::builder().build();
/// let doc = FormDecoder::new().decode(&req, b"user=ada&role=admin&role=ops").unwrap();
///
/// assert_eq!(doc.get("user"), Some(&Value::from("ada")));
/// assert_eq!(doc.get("role"), Some(&Value::from(vec!["admin".to_string(), "ops".to_string()])));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FormDecoder {
    limit: usize,
}

impl FormDecoder {
    /// Creates a decoder with the default 1 MB limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            limit: DEFAULT_FORM_LIMIT,
        }
    }

    /// Sets the maximum accepted body size in bytes.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns the configured limit.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    fn check_size(&self, size: usize) -> Result<(), ExtractError> {
        if size > self.limit {
            return Err(ExtractError::PayloadTooLarge {
                size,
                limit: self.limit,
            });
        }
        Ok(())
    }

    fn decode_bytes(&self, body: &[u8]) -> Result<Value, ExtractError> {
        self.check_size(body.len())?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;

        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for (key, value) in pairs {
            grouped.entry(key).or_default().push(value);
        }
        Ok(Value::Map(
            grouped
                .into_iter()
                .map(|(key, values)| (key, Value::from_repeated(values)))
                .collect(),
        ))
    }
}

impl Default for FormDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyDecoder for FormDecoder {
    fn decode(&self, _request: &BindRequest, body: &[u8]) -> Result<Value, BoxError> {
        Ok(self.decode_bytes(body)?)
    }

    fn check_length(&self, _request: &BindRequest, length: u64) -> Result<(), BoxError> {
        Ok(self.check_size(usize::try_from(length).unwrap_or(usize::MAX))?)
    }
}

//! JSON body decoder.

use gleaner::{BindRequest, BodyDecoder, BoxError, Value};

use crate::error::ExtractError;

/// Default maximum body size for JSON decoding (1 MB).
pub const DEFAULT_JSON_LIMIT: usize = 1024 * 1024;

/// Decodes `application/json` bodies into a [`Value`] document.
///
/// An empty or whitespace-only body decodes to [`Value::Null`], which leaves
/// the destination untouched.
///
/// # Example
///
/// ```
/// use gleaner::{BindRequest, BodyDecoder, Value};
/// use gleaner_extract::JsonDecoder;
///
/// let req = BindRequest::builder().build();
/// let doc = JsonDecoder::new().decode(&req, br#"{"name":"Ada","age":36}"#).unwrap();
///
/// assert_eq!(doc.get("name"), Some(&Value::from("Ada")));
/// assert_eq!(doc.get("age"), Some(&Value::Int(36)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JsonDecoder {
    limit: usize,
}

impl JsonDecoder {
    /// Creates a decoder with the default 1 MB limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            limit: DEFAULT_JSON_LIMIT,
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
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        let doc: serde_json::Value = serde_json::from_slice(body)?;
        Ok(Value::from(doc))
    }
}

impl Default for JsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyDecoder for JsonDecoder {
    fn decode(&self, _request: &BindRequest, body: &[u8]) -> Result<Value, BoxError> {
        Ok(self.decode_bytes(body)?)
    }

    fn check_length(&self, _request: &BindRequest, length: u64) -> Result<(), BoxError> {
        Ok(self.check_size(usize::try_from(length).unwrap_or(usize::MAX))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_null() {
        let decoder = JsonDecoder::new();
        assert_eq!(decoder.decode_bytes(b"").unwrap(), Value::Null);
        assert_eq!(decoder.decode_bytes(b" \n\t").unwrap(), Value::Null);
    }

    #[test]
    fn test_invalid_json() {
        let err = JsonDecoder::new().decode_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, ExtractError::Json(_)));
    }

    #[test]
    fn test_limit() {
        let decoder = JsonDecoder::new().with_limit(8);
        let err = decoder.decode_bytes(br#"{"name":"too long"}"#).unwrap_err();

        assert!(matches!(err, ExtractError::PayloadTooLarge { limit: 8, .. }));
        assert!(decoder.decode_bytes(b"[1,2]").is_ok());
    }

    #[test]
    fn test_declared_length_checked_before_read() {
        let decoder = JsonDecoder::new().with_limit(16);
        let req = BindRequest::builder().build();

        let err = decoder.check_length(&req, 17).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::PayloadTooLarge { size: 17, limit: 16 })
        ));
        assert!(decoder.check_length(&req, 16).is_ok());
    }

    #[test]
    fn test_nested_document() {
        let doc = JsonDecoder::new()
            .decode_bytes(br#"{"tags":["a","b"],"owner":{"id":7}}"#)
            .unwrap();

        assert_eq!(
            doc.get("tags"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(doc.get("owner").and_then(|o| o.get("id")), Some(&Value::Int(7)));
    }

    #[test]
    fn test_error_is_boxed_for_binder() {
        let req = BindRequest::builder().build();
        let err = JsonDecoder::new().decode(&req, b"[").unwrap_err();
        assert!(err.downcast_ref::<ExtractError>().is_some());
    }
}

//! The request abstraction the binder reads from.
//!
//! [`BindRequest`] holds an already-parsed request: method, URI, headers,
//! router path parameters and a body. The body may be an in-memory buffer or
//! a one-shot reader. An in-memory buffer can be read any number of times; a
//! reader is consumed by the first read unless it has been preserved with
//! [`BindRequest::preserve_body`].

use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, Uri};
use parking_lot::Mutex;

use crate::params::Params;

enum BodyState {
    Empty,
    Buffered(Bytes),
    Stream(Box<dyn Read + Send>),
    Preserved(Bytes),
    Consumed,
}

impl fmt::Debug for BodyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Buffered(b) => write!(f, "Buffered({} bytes)", b.len()),
            Self::Stream(_) => write!(f, "Stream"),
            Self::Preserved(b) => write!(f, "Preserved({} bytes)", b.len()),
            Self::Consumed => write!(f, "Consumed"),
        }
    }
}

/// An inbound request, ready for binding.
///
/// A `BindRequest` is `Sync`: several bind calls may read the same request
/// concurrently. Only the body needs coordination and it is guarded by a
/// mutex.
///
/// # Example
///
/// ```
/// use gleaner::BindRequest;
/// use http::Method;
///
/// let req = BindRequest::builder()
///     .method(Method::POST)
///     .uri("/users/42?verbose=1")
///     .header("content-type", "application/json; charset=utf-8")
///     .body(r#"{"name":"J"}"#)
///     .path_param("id", "42")
///     .build();
///
/// assert_eq!(req.query_string(), Some("verbose=1"));
/// assert_eq!(req.media_type().as_deref(), Some("application/json"));
/// assert_eq!(req.path_params().get("id"), Some("42"));
/// assert!(req.declares_body());
/// ```
#[derive(Debug)]
pub struct BindRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: Params,
    body: Mutex<BodyState>,
}

impl BindRequest {
    /// Creates a request with an in-memory body.
    #[must_use]
    pub fn new(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: impl Into<Bytes>,
        path_params: Params,
    ) -> Self {
        let body: Bytes = body.into();
        let state = if body.is_empty() {
            BodyState::Empty
        } else {
            BodyState::Buffered(body)
        };
        Self {
            method,
            uri,
            headers,
            path_params,
            body: Mutex::new(state),
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> BindRequestBuilder {
        BindRequestBuilder::default()
    }

    /// Creates a request from an `http::Request` and the router's captures.
    pub fn from_http<B: Into<Bytes>>(request: http::Request<B>, path_params: Params) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body, path_params)
    }

    /// Replaces the body with a one-shot reader.
    #[must_use]
    pub fn with_reader(self, reader: impl Read + Send + 'static) -> Self {
        *self.body.lock() = BodyState::Stream(Box::new(reader));
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path portion of the URI.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string, if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as text, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the router path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Returns the raw `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the `Content-Length` header, if it parses.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.header(header::CONTENT_LENGTH.as_str())
            .and_then(|v| v.trim().parse().ok())
    }

    /// Returns the content type without parameters, lower-cased.
    ///
    /// `application/json; charset=utf-8` becomes `application/json`.
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        self.content_type()
            .map(essence)
            .filter(|media| !media.is_empty())
    }

    /// Returns true for methods that carry no body.
    #[must_use]
    pub fn is_bodyless_method(&self) -> bool {
        matches!(
            self.method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
        )
    }

    /// Returns true if the request carries a body that has not been read.
    ///
    /// A `Content-Length: 0` header always means no body.
    #[must_use]
    pub fn declares_body(&self) -> bool {
        if self.content_length() == Some(0) {
            return false;
        }
        match &*self.body.lock() {
            BodyState::Empty | BodyState::Consumed => false,
            BodyState::Buffered(bytes) | BodyState::Preserved(bytes) => !bytes.is_empty(),
            BodyState::Stream(_) => true,
        }
    }

    /// Reads the whole body.
    ///
    /// In-memory and preserved bodies can be read any number of times. A
    /// reader body is consumed and later reads return an empty buffer.
    pub fn read_body(&self) -> io::Result<Bytes> {
        let mut state = self.body.lock();
        match std::mem::replace(&mut *state, BodyState::Consumed) {
            BodyState::Preserved(bytes) => {
                *state = BodyState::Preserved(bytes.clone());
                Ok(bytes)
            }
            BodyState::Buffered(bytes) => {
                *state = BodyState::Buffered(bytes.clone());
                Ok(bytes)
            }
            BodyState::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
            BodyState::Empty | BodyState::Consumed => Ok(Bytes::new()),
        }
    }

    /// Buffers the body in memory so it stays readable.
    ///
    /// Returns the buffered bytes. Every later [`read_body`](Self::read_body)
    /// returns an independent handle to the same bytes.
    pub fn preserve_body(&self) -> io::Result<Bytes> {
        let mut state = self.body.lock();
        let bytes = match std::mem::replace(&mut *state, BodyState::Consumed) {
            BodyState::Preserved(bytes) | BodyState::Buffered(bytes) => bytes,
            BodyState::Stream(mut reader) => {
                let mut buf = Vec::new();
                if let Err(e) = reader.read_to_end(&mut buf) {
                    *state = BodyState::Preserved(Bytes::from(buf));
                    return Err(e);
                }
                Bytes::from(buf)
            }
            BodyState::Empty | BodyState::Consumed => Bytes::new(),
        };
        *state = BodyState::Preserved(bytes.clone());
        Ok(bytes)
    }

    /// Returns true if a reader body was read without being preserved.
    #[must_use]
    pub fn is_body_consumed(&self) -> bool {
        matches!(&*self.body.lock(), BodyState::Consumed)
    }

    /// Returns true if the body has been preserved.
    #[must_use]
    pub fn is_body_preserved(&self) -> bool {
        matches!(&*self.body.lock(), BodyState::Preserved(_))
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Normalises a content type the way [`BindRequest::media_type`] does.
#[must_use]
pub fn media_type_essence(content_type: &str) -> String {
    essence(content_type)
}

/// Builder for [`BindRequest`].
///
/// Method defaults to `GET` and URI to `/`.
#[derive(Debug, Default)]
pub struct BindRequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    reader: Option<ReaderBody>,
    path_params: Params,
}

struct ReaderBody(Box<dyn Read + Send>);

impl fmt::Debug for ReaderBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReaderBody")
    }
}

impl BindRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI. An unparsable URI leaves the current one in place.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(uri) = uri.parse() {
            self.uri = Some(uri);
        }
        self
    }

    /// Appends a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets an in-memory body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a one-shot reader as the body.
    #[must_use]
    pub fn reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.reader = Some(ReaderBody(Box::new(reader)));
        self
    }

    /// Adds a router path parameter.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> BindRequest {
        let request = BindRequest::new(
            self.method.unwrap_or(Method::GET),
            self.uri.unwrap_or_else(|| Uri::from_static("/")),
            self.headers,
            self.body,
            self.path_params,
        );
        match self.reader {
            Some(ReaderBody(reader)) => {
                *request.body.lock() = BodyState::Stream(reader);
                request
            }
            None => request,
        }
    }
}

//! # Gleaner Extract
//!
//! Reference plug-ins for the [`gleaner`] binder.
//!
//! ## Sources
//!
//! | Tag | Type | Reads |
//! |-----|------|-------|
//! | `path` | [`PathSource`] | Router path parameters |
//! | `query` | [`QuerySource`] | URL-decoded query parameters |
//! | `header` | [`HeaderSource`] | Request headers |
//! | `cookie` | [`CookieSource`] | `Cookie` header pairs |
//!
//! ## Decoders
//!
//! | Content type | Type |
//! |--------------|------|
//! | `application/json` | [`JsonDecoder`] |
//! | `application/x-www-form-urlencoded` | [`FormDecoder`] |
//!
//! ## Transforms
//!
//! | Tag | Type | Annotation |
//! |-----|------|------------|
//! | `trim` | [`Trim`] | `both` (default), `start`, `end` |
//! | `case` | [`Case`] | `lower`, `upper`, `title` |
//! | `clamp` | [`Clamp`] | `min,max`, either bound optional |
//! | `dedup` | [`Dedup`] | none |
//! | `sort` | [`Sort`] | `asc` (default), `desc` |
//!
//! ## Example
//!
//! ```rust
//! use gleaner::{BindRequest, Record};
//! use http::Method;
//!
//! #[derive(Debug, Default, Record)]
//! struct CreateComment {
//!     #[bind(path = "post_id")]
//!     post_id: u64,
//!     #[bind(header = "x-request-id")]
//!     request_id: String,
//!     #[bind(trim)]
//!     text: String,
//!     #[bind(query = "notify", default = "false")]
//!     notify: bool,
//! }
//!
//! let binder = gleaner_extract::standard().build().unwrap();
//!
//! let req = BindRequest::builder()
//!     .method(Method::POST)
//!     .uri("/posts/7/comments?notify=yes")
//!     .header("content-type", "application/json")
//!     .header("x-request-id", "req-1")
//!     .path_param("post_id", "7")
//!     .body(r#"{"text":"  nice post  "}"#)
//!     .build();
//!
//! let mut comment = CreateComment::default();
//! binder.bind(&req, &mut comment).unwrap();
//!
//! assert_eq!(comment.post_id, 7);
//! assert_eq!(comment.request_id, "req-1");
//! assert_eq!(comment.text, "nice post");
//! assert!(comment.notify);
//! ```

#![doc(html_root_url = "https://docs.rs/gleaner-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cookie;
mod error;
mod form;
mod header;
mod json;
mod path;
mod query;
mod transform;

pub use cookie::{CookieJar, CookieSource};
pub use error::ExtractError;
pub use form::{FormDecoder, DEFAULT_FORM_LIMIT};
pub use header::HeaderSource;
pub use json::{JsonDecoder, DEFAULT_JSON_LIMIT};
pub use path::PathSource;
pub use query::QuerySource;
pub use transform::{Case, Clamp, Dedup, Sort, Trim};

use gleaner::BinderBuilder;

/// Content type handled by [`JsonDecoder`].
pub const JSON: &str = "application/json";

/// Content type handled by [`FormDecoder`].
pub const FORM: &str = "application/x-www-form-urlencoded";

/// Returns a builder with every plug-in of this crate registered.
///
/// Sources are tried in the order `path`, `query`, `header`, `cookie`.
/// More plug-ins and options can be added before calling
/// [`BinderBuilder::build`].
#[must_use]
pub fn standard() -> BinderBuilder {
    BinderBuilder::new()
        .source("path", PathSource)
        .source("query", QuerySource)
        .source("header", HeaderSource)
        .source("cookie", CookieSource)
        .decoder(JSON, JsonDecoder::new())
        .decoder(FORM, FormDecoder::new())
        .transform("trim", Trim)
        .transform("case", Case)
        .transform("clamp", Clamp)
        .transform("dedup", Dedup)
        .transform("sort", Sort)
}

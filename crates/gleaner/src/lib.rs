//! # Gleaner
//!
//! **Declarative request binding.**
//!
//! Gleaner fills typed records from the parts of an inbound request: the
//! body, query string, headers, cookies and router path parameters. Each
//! field declares where its value comes from with a `#[bind(...)]`
//! attribute; the [`Binder`] resolves every field, coerces the extracted
//! value into the field's type with range checks, falls back to declared
//! defaults, and runs post-processing transforms.
//!
//! ## Quick Start
//!
//! ```
//! use gleaner::{BindRequest, Binder, BoxError, Memo, Record, Slot, Value};
//! use http::Method;
//!
//! #[derive(Debug, Default, Record)]
//! struct CreateUser {
//!     #[bind(path = "org")]
//!     org: String,
//!     name: String,
//!     #[bind(header = "x-request-priority", default = "3")]
//!     priority: u8,
//!     #[bind(header = "x-tags", lower)]
//!     tags: Vec<String>,
//! }
//!
//! fn lower(_: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
//!     if let Value::List(items) = slot.to_value() {
//!         let lowered: Vec<Value> = items
//!             .iter()
//!             .filter_map(Value::as_text)
//!             .map(|s| Value::from(s.to_lowercase()))
//!             .collect();
//!         slot.assign(Value::List(lowered))?;
//!     }
//!     Ok(())
//! }
//!
//! let binder = Binder::builder()
//!     .source("path", |req: &BindRequest, name: &str, _: &mut Memo| {
//!         req.path_params().get(name).map(Value::from)
//!     })
//!     .source("header", |req: &BindRequest, name: &str, _: &mut Memo| {
//!         req.header(name).map(Value::from)
//!     })
//!     .decoder("application/json", |_: &BindRequest, body: &[u8]| -> Result<Value, BoxError> {
//!         Ok(serde_json::from_slice::<serde_json::Value>(body)?.into())
//!     })
//!     .transform("lower", lower)
//!     .build()?;
//!
//! let request = BindRequest::builder()
//!     .method(Method::POST)
//!     .uri("/orgs/acme/users")
//!     .path_param("org", "acme")
//!     .header("content-type", "application/json")
//!     .header("x-tags", "Admin")
//!     .body(r#"{"name": "Ada"}"#)
//!     .build();
//!
//! let mut user = CreateUser::default();
//! binder.bind(&request, &mut user)?;
//!
//! assert_eq!(user.org, "acme");
//! assert_eq!(user.name, "Ada");
//! assert_eq!(user.priority, 3);
//! assert_eq!(user.tags, vec!["admin"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! BindRequest ─► body decoder ─► merge by body key ─┐
//!                                                   ▼
//!        StructureCache ─► per field: sources ─► Slot::assign ─► default ─► transforms
//!                                                                               │
//!                                                       Record::after_bind ◄────┘
//! ```
//!
//! Concrete sources, decoders and transforms live in the `gleaner-extract`
//! crate; this crate only defines their contracts in [`plugin`].

#![doc(html_root_url = "https://docs.rs/gleaner/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Lets derive output name `::gleaner` from inside this crate.
extern crate self as gleaner;

pub mod binder;
pub mod cache;
pub mod error;
pub mod memo;
pub mod options;
pub mod params;
pub mod plugin;
pub mod pool;
pub mod record;
pub mod request;
pub mod slot;
pub mod value;

pub use binder::{Binder, BinderBuilder};
pub use cache::{FieldDescriptor, StructureCache, TagBinding};
pub use error::{BindError, BindErrorKind, BindResult, BoxError, CoercionError, ConfigError};
pub use memo::{Memo, MemoPool, DEFAULT_MEMO_POOL_SIZE};
pub use options::{BindOptions, OptionsLoader};
pub use params::Params;
pub use plugin::{BodyDecoder, ExtractionSource, Transform};
pub use pool::{InstancePool, Pooled, DEFAULT_INSTANCE_POOL_SIZE};
pub use record::{AfterBind, Annotation, FieldMeta, Record, RecordSchema};
pub use request::{media_type_essence, BindRequest, BindRequestBuilder};
pub use slot::{Payload, Slot, SlotKind};
pub use value::{Opaque, Value};

/// Derives [`Record`] and [`Slot`] for a struct with named fields.
#[cfg(feature = "derive")]
pub use gleaner_macros::Record;

/// Items used by `#[derive(Record)]` output. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use crate::record::{document_of, fields_are_zero, merge_document, reset_fields};
}

/// Prelude for handler modules.
///
/// ```
/// use gleaner::prelude::*;
///
/// let options = BindOptions::default();
/// assert!(options.skip_filled);
/// ```
pub mod prelude {
    pub use crate::{
        AfterBind, BindError, BindOptions, BindRequest, Binder, Record, Slot, Value,
    };
}

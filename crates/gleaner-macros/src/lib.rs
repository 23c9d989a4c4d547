//! Derive macro for gleaner records.
//!
//! `#[derive(Record)]` turns a struct with named fields into a bindable
//! record. It generates a static field table from the `#[bind(...)]`
//! attributes and index-based field access, so the binder never needs
//! runtime reflection.
//!
//! # Example
//!
//! ```rust,ignore
//! use gleaner::Record;
//!
//! #[derive(Default, Record)]
//! #[bind(after_bind)]
//! struct Search {
//!     #[bind(query = "q", trim)]
//!     term: String,
//!     #[bind(query = "page", default = "1")]
//!     page: u32,
//!     #[bind(body = "filters")]
//!     filter: Vec<String>,
//!     #[bind(skip)]
//!     scratch: String,
//! }
//! ```
//!
//! # Attribute grammar
//!
//! On fields:
//!
//! - `tag = "annotation"` declares that the source or transform registered
//!   under `tag` applies, with `annotation` as its argument.
//! - `tag` alone declares the tag with an empty annotation.
//! - `default = "literal"` is coerced into the field when no source
//!   produced a value.
//! - `body = "key"` renames the field in decoded body documents.
//! - `skip` excludes the field. It is reset with `Default::default()`.
//!
//! On the struct, `after_bind` routes the post-bind hook to the type's
//! `AfterBind` impl.

mod expand;
mod parse;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `gleaner::Record` and `gleaner::Slot`.
///
/// Every bound field type must implement `gleaner::Slot`; skipped fields
/// must implement `Default`. Enums, unions, tuple structs and generic
/// structs are rejected.
#[proc_macro_derive(Record, attributes(bind))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand::expand_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

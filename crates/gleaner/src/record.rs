//! Destination records and their static field tables.
//!
//! A record is a struct whose fields the binder fills. `#[derive(Record)]`
//! generates the [`Record`] impl: a static [`RecordSchema`] listing every
//! bound field with its annotations, and index-based access to each field as
//! a [`Slot`]. The binder never inspects a type any other way.

use std::any::TypeId;

use crate::error::{BoxError, CoercionError};
use crate::request::BindRequest;
use crate::slot::Slot;
use crate::value::Value;

/// One `key = "value"` pair from a field's `#[bind(...)]` attribute.
///
/// A bare key (`#[bind(trim)]`) has an empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    /// Source tag, transform tag, or reserved key.
    pub key: &'static str,
    /// Annotation string handed to the plug-in registered under `key`.
    pub value: &'static str,
}

/// Static description of one bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Position of the field among the record's bound fields.
    pub index: usize,
    /// Field name as declared.
    pub name: &'static str,
    /// Key of the field in a decoded body document.
    pub body_key: &'static str,
    /// Annotations in declaration order.
    pub annotations: &'static [Annotation],
}

impl FieldMeta {
    /// Returns the annotation string declared for `key`.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&'static str> {
        self.annotations
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value)
    }

    /// Returns the declared default literal.
    #[must_use]
    pub fn default_literal(&self) -> Option<&'static str> {
        self.annotation(DEFAULT_KEY)
    }
}

/// Annotation key holding a field's default literal.
pub const DEFAULT_KEY: &str = "default";

/// Annotation keys interpreted by the derive macro itself.
///
/// Plug-ins cannot be registered under these.
pub const RESERVED_KEYS: [&str; 4] = [DEFAULT_KEY, "body", "skip", "after_bind"];

/// Static description of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    /// Type name as declared.
    pub type_name: &'static str,
    /// Bound fields in declaration order.
    pub fields: &'static [FieldMeta],
}

/// A destination the binder can populate field by field.
///
/// Implement with `#[derive(Record)]`:
///
/// ```
/// use gleaner::{Record, Slot, Value};
///
/// #[derive(Debug, Default, Record)]
/// struct Search {
///     #[bind(query = "q")]
///     term: String,
///     #[bind(query = "page", default = "1")]
///     page: u32,
///     #[bind(skip)]
///     cache_hit: bool,
/// }
///
/// let schema = Search::describe();
/// assert_eq!(schema.type_name, "Search");
/// assert_eq!(schema.fields.len(), 2);
/// assert_eq!(schema.fields[1].default_literal(), Some("1"));
///
/// let mut search = Search::default();
/// search.field_mut(1).unwrap().assign(Value::from("3")).unwrap();
/// assert_eq!(search.page, 3);
/// ```
pub trait Record: Slot + Send + 'static {
    /// Returns the type's static schema.
    fn describe() -> &'static RecordSchema
    where
        Self: Sized;

    /// Returns the type's static schema through a trait object.
    fn schema(&self) -> &'static RecordSchema;

    /// Returns the concrete type's identity.
    fn record_type(&self) -> TypeId;

    /// Returns the bound field at `index`.
    fn field(&self, index: usize) -> Option<&dyn Slot>;

    /// Returns the bound field at `index`, mutably.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Slot>;

    /// Runs after every field resolved. Failure fails the bind call.
    fn after_bind(&mut self, request: &BindRequest) -> Result<(), BoxError> {
        let _ = request;
        Ok(())
    }
}

/// Post-bind hook, enabled with `#[bind(after_bind)]` on the record.
///
/// ```
/// use gleaner::{AfterBind, BindRequest, BoxError, Record};
///
/// #[derive(Default, Record)]
/// #[bind(after_bind)]
/// struct Range {
///     #[bind(query = "from")]
///     from: u32,
///     #[bind(query = "to")]
///     to: u32,
/// }
///
/// impl AfterBind for Range {
///     fn after_bind(&mut self, _request: &BindRequest) -> Result<(), BoxError> {
///         if self.from > self.to {
///             return Err("`from` exceeds `to`".into());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait AfterBind {
    /// Inspects or adjusts the bound record.
    fn after_bind(&mut self, request: &BindRequest) -> Result<(), BoxError>;
}

/// Merges a decoded document into `record`, field by body key.
///
/// Keys without a matching field are ignored and fields without a matching
/// key are left untouched.
#[doc(hidden)]
pub fn merge_document(record: &mut dyn Record, value: Value) -> Result<(), CoercionError> {
    let schema = record.schema();
    match value {
        Value::Null => {
            record.reset();
            Ok(())
        }
        Value::Map(mut entries) => {
            for meta in schema.fields {
                let Some(item) = entries.swap_remove(meta.body_key) else {
                    continue;
                };
                if let Some(slot) = record.field_mut(meta.index) {
                    slot.assign(item)
                        .map_err(|e| CoercionError::field(meta.name, e))?;
                }
            }
            Ok(())
        }
        other => Err(CoercionError::Unsupported {
            found: other.kind(),
            target: schema.type_name,
        }),
    }
}

/// Renders `record` as a map keyed by body key.
#[doc(hidden)]
pub fn document_of(record: &dyn Record) -> Value {
    let schema = record.schema();
    Value::Map(
        schema
            .fields
            .iter()
            .filter_map(|meta| {
                record
                    .field(meta.index)
                    .map(|slot| (meta.body_key.to_string(), slot.to_value()))
            })
            .collect(),
    )
}

/// Returns true if every bound field of `record` is zero.
#[doc(hidden)]
pub fn fields_are_zero(record: &dyn Record) -> bool {
    record
        .schema()
        .fields
        .iter()
        .all(|meta| record.field(meta.index).map_or(true, Slot::is_zero))
}

/// Resets every bound field of `record`.
#[doc(hidden)]
pub fn reset_fields(record: &mut dyn Record) {
    for meta in record.schema().fields {
        if let Some(slot) = record.field_mut(meta.index) {
            slot.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotKind;

    #[derive(Debug, Default, crate::Record)]
    struct Address {
        city: String,
        #[bind(body = "zip_code")]
        zip: u32,
    }

    #[derive(Debug, Default, crate::Record)]
    struct Profile {
        #[bind(header = "x-user", query = "user", trim)]
        name: String,
        address: Option<Address>,
        tags: Vec<String>,
        #[bind(skip)]
        scratch: Vec<u8>,
    }

    #[test]
    fn test_schema_lists_bound_fields() {
        let schema = Profile::describe();

        assert_eq!(schema.type_name, "Profile");
        let names: Vec<_> = schema.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["name", "address", "tags"]);

        let name = &schema.fields[0];
        assert_eq!(name.index, 0);
        assert_eq!(name.annotation("header"), Some("x-user"));
        assert_eq!(name.annotation("trim"), Some(""));
        assert_eq!(name.annotation("cookie"), None);
        assert_eq!(name.default_literal(), None);
    }

    #[test]
    fn test_merge_nested_document() {
        let mut profile = Profile::default();
        let doc = Value::from(serde_json::json!({
            "name": "Ada",
            "address": {"city": "London", "zip_code": "12345"},
            "tags": ["math"],
            "unknown": 1
        }));

        profile.assign(doc).unwrap();

        assert_eq!(profile.name, "Ada");
        let address = profile.address.as_ref().unwrap();
        assert_eq!(address.city, "London");
        assert_eq!(address.zip, 12345);
        assert_eq!(profile.tags, vec!["math"]);
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let mut profile = Profile {
            name: "kept".to_string(),
            ..Profile::default()
        };

        profile.assign(Value::from(serde_json::json!({"tags": ["a"]}))).unwrap();

        assert_eq!(profile.name, "kept");
        assert_eq!(profile.tags, vec!["a"]);
    }

    #[test]
    fn test_merge_error_names_nested_field() {
        let mut profile = Profile::default();
        let doc = Value::from(serde_json::json!({"address": {"zip_code": -1}}));

        let err = profile.assign(doc).unwrap_err();

        assert_eq!(
            err.to_string(),
            "field `address`: field `zip`: negative value -1 cannot be stored in unsigned u32"
        );
    }

    #[test]
    fn test_text_into_record_unsupported() {
        let mut address = Address::default();
        let err = address.assign(Value::from("London")).unwrap_err();
        assert_eq!(
            err,
            CoercionError::Unsupported {
                found: "text",
                target: "Address"
            }
        );
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut profile = Profile {
            name: "x".to_string(),
            address: Some(Address::default()),
            tags: vec!["t".to_string()],
            scratch: vec![1, 2, 3],
        };
        assert!(!profile.is_zero());

        profile.reset();

        assert!(profile.is_zero());
        assert!(profile.scratch.is_empty());
        assert_eq!(profile.kind(), SlotKind::Record);
    }

    #[test]
    fn test_to_value_uses_body_keys() {
        let address = Address {
            city: "Oslo".to_string(),
            zip: 150,
        };
        let value = address.to_value();

        assert_eq!(value.get("city"), Some(&Value::Text("Oslo".to_string())));
        assert_eq!(value.get("zip_code"), Some(&Value::Uint(150)));
    }
}

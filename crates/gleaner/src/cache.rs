//! Per-type field descriptor cache.
//!
//! The static [`RecordSchema`] generated by `#[derive(Record)]` lists every
//! annotation a field carries. A binder only cares about the annotations its
//! registered sources and transforms understand, ordered by registration. The
//! [`StructureCache`] computes that view once per record type and shares it
//! with every later bind call.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;

use crate::record::RecordSchema;

/// One registered plug-in that applies to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBinding {
    /// Tag the plug-in is registered under.
    pub tag: Arc<str>,
    /// Registration position, which is also the field's priority order.
    pub position: usize,
    /// The field's annotation string for this tag.
    pub annotation: &'static str,
}

/// Cached binding plan for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Position of the field in the record's schema.
    pub index: usize,
    /// Field name.
    pub name: &'static str,
    /// Declared default literal.
    pub default: Option<&'static str>,
    /// Applicable extraction sources, in registration order.
    pub sources: Vec<TagBinding>,
    /// Applicable transforms, in registration order.
    pub transforms: Vec<TagBinding>,
}

/// Thread-safe cache of [`FieldDescriptor`] lists keyed by record type.
///
/// Entries are built on first use under the map's entry lock, so concurrent
/// first users of a type build it once and all observe the same list. Entries
/// are never evicted.
///
/// # Example
///
/// ```
/// use std::any::TypeId;
/// use std::sync::Arc;
///
/// use gleaner::{Record, StructureCache};
///
/// #[derive(Default, Record)]
/// struct Login {
///     #[bind(header = "x-user", query = "user", trim)]
///     user: String,
///     #[bind(unknown = "ignored")]
///     other: String,
/// }
///
/// let cache = StructureCache::new(
///     vec![Arc::from("query"), Arc::from("header")],
///     vec![Arc::from("trim")],
/// );
/// let fields = cache.fields(TypeId::of::<Login>(), Login::describe());
///
/// assert_eq!(fields.len(), 1);
/// let tags: Vec<&str> = fields[0].sources.iter().map(|b| &*b.tag).collect();
/// assert_eq!(tags, ["query", "header"]);
/// assert_eq!(fields[0].transforms[0].annotation, "");
/// ```
#[derive(Debug)]
pub struct StructureCache {
    source_tags: Vec<Arc<str>>,
    transform_tags: Vec<Arc<str>>,
    entries: DashMap<TypeId, Arc<[FieldDescriptor]>>,
}

impl StructureCache {
    /// Creates an empty cache for the given registered tags.
    #[must_use]
    pub fn new(source_tags: Vec<Arc<str>>, transform_tags: Vec<Arc<str>>) -> Self {
        Self {
            source_tags,
            transform_tags,
            entries: DashMap::new(),
        }
    }

    /// Returns the descriptor list for `type_id`, building it from `schema`
    /// on first use.
    pub fn fields(&self, type_id: TypeId, schema: &'static RecordSchema) -> Arc<[FieldDescriptor]> {
        if let Some(entry) = self.entries.get(&type_id) {
            return Arc::clone(entry.value());
        }
        let entry = self.entries.entry(type_id).or_insert_with(|| {
            let fields = self.build(schema);
            tracing::debug!(
                record = schema.type_name,
                fields = fields.len(),
                "built field descriptors"
            );
            Arc::from(fields)
        });
        Arc::clone(entry.value())
    }

    /// Returns the number of cached record types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no record type has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn build(&self, schema: &RecordSchema) -> Vec<FieldDescriptor> {
        schema
            .fields
            .iter()
            .filter_map(|meta| {
                let sources = bindings(&self.source_tags, |tag| meta.annotation(tag));
                let transforms = bindings(&self.transform_tags, |tag| meta.annotation(tag));
                let default = meta.default_literal();
                if sources.is_empty() && transforms.is_empty() && default.is_none() {
                    return None;
                }
                Some(FieldDescriptor {
                    index: meta.index,
                    name: meta.name,
                    default,
                    sources,
                    transforms,
                })
            })
            .collect()
    }
}

fn bindings<F>(tags: &[Arc<str>], lookup: F) -> Vec<TagBinding>
where
    F: Fn(&str) -> Option<&'static str>,
{
    tags.iter()
        .enumerate()
        .filter_map(|(position, tag)| {
            lookup(tag).map(|annotation| TagBinding {
                tag: Arc::clone(tag),
                position,
                annotation,
            })
        })
        .collect()
}

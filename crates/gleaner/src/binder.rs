//! The binder: plug-in registry and resolution engine.
//!
//! A bind call runs in two phases. First the body, if the request declares
//! one and a decoder is registered for its media type, is decoded into a
//! document and merged into the destination. Then every cached field of the
//! destination is resolved:
//!
//! 1. A field already holding a non-zero value is left alone when
//!    [`BindOptions::skip_filled`] is set.
//! 2. Otherwise the field's sources are tried in registration order and the
//!    first value produced is coerced into the field.
//! 3. If nothing was produced and the field is still zero, its declared
//!    default literal is coerced into it.
//! 4. The field's transforms run in registration order.
//!
//! Finally the record's post-bind hook runs. The first failure aborts the
//! call.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::{FieldDescriptor, StructureCache};
use crate::error::{BindError, BindResult, ConfigError};
use crate::memo::{Memo, MemoPool, DEFAULT_MEMO_POOL_SIZE};
use crate::options::BindOptions;
use crate::plugin::{BodyDecoder, ExtractionSource, Transform};
use crate::pool::{InstancePool, DEFAULT_INSTANCE_POOL_SIZE};
use crate::record::{Record, RESERVED_KEYS};
use crate::request::{media_type_essence, BindRequest};
use crate::slot::{Slot, SlotKind};
use crate::value::Value;

type SourceEntry = (Arc<str>, Box<dyn ExtractionSource>);
type TransformEntry = (Arc<str>, Box<dyn Transform>);

/// Binds requests into records.
///
/// A `Binder` is built once with its plug-ins and shared by every request
/// handler; all entry points take `&self` and may run concurrently.
///
/// # Example
///
/// ```
/// use gleaner::{BindRequest, Binder, Memo, Record, Value};
///
/// #[derive(Debug, Default, Record)]
/// struct Page {
///     #[bind(header = "x-page", default = "1")]
///     number: u32,
///     #[bind(header = "x-size", default = "20")]
///     size: u8,
/// }
///
/// let binder = Binder::builder()
///     .source("header", |req: &BindRequest, name: &str, _memo: &mut Memo| {
///         req.header(name).map(Value::from)
///     })
///     .build()
///     .unwrap();
///
/// let req = BindRequest::builder().header("x-page", "4").build();
/// let mut page = Page::default();
/// binder.bind(&req, &mut page).unwrap();
///
/// assert_eq!(page.number, 4);
/// assert_eq!(page.size, 20);
/// ```
pub struct Binder {
    sources: Vec<SourceEntry>,
    decoders: HashMap<String, Box<dyn BodyDecoder>>,
    transforms: Vec<TransformEntry>,
    options: BindOptions,
    cache: StructureCache,
    memos: MemoPool,
    instance_pool_size: usize,
    instances: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("sources", &self.source_tags().collect::<Vec<_>>())
            .field("decoders", &self.decoders.keys().collect::<Vec<_>>())
            .field("transforms", &self.transform_tags().collect::<Vec<_>>())
            .field("options", &self.options)
            .field("cached_types", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Binder {
    /// Creates a builder with no plug-ins registered.
    #[must_use]
    pub fn builder() -> BinderBuilder {
        BinderBuilder::new()
    }

    /// Returns the options used by [`bind`](Self::bind).
    #[must_use]
    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    /// Iterates over source tags in priority order.
    pub fn source_tags(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|(tag, _)| &**tag)
    }

    /// Iterates over transform tags in registration order.
    pub fn transform_tags(&self) -> impl Iterator<Item = &str> {
        self.transforms.iter().map(|(tag, _)| &**tag)
    }

    /// Returns true if a decoder is registered for `content_type`.
    ///
    /// Parameters after `;` are ignored.
    #[must_use]
    pub fn has_decoder(&self, content_type: &str) -> bool {
        self.decoders.contains_key(&media_type_essence(content_type))
    }

    /// Returns the cached field plan for `T`, building it on first use.
    pub fn fields<T: Record>(&self) -> Arc<[FieldDescriptor]> {
        self.cache.fields(TypeId::of::<T>(), T::describe())
    }

    /// Binds `request` into `record` with the binder's default options.
    ///
    /// The same request may be bound into several destinations, including
    /// from several threads at once. In-memory bodies are decoded by every
    /// call; a reader body is consumed by the first call unless
    /// [`BindOptions::preserve_body`] is set, and later calls skip decoding
    /// with a warning.
    ///
    /// A source that returns a value counts as a match even when the value is
    /// empty text: `?page=` leaves a `u32` field at `0` and its declared
    /// default is not applied. Sources that treat empty input as absent
    /// should return `None`.
    ///
    /// # Errors
    ///
    /// Returns the first decode, coercion, default, transform or hook failure.
    pub fn bind<T: Record>(&self, request: &BindRequest, record: &mut T) -> BindResult<()> {
        self.bind_record(request, record, &self.options)
    }

    /// Binds `request` into `record` with explicit options.
    ///
    /// # Errors
    ///
    /// Same as [`bind`](Self::bind).
    pub fn bind_with<T: Record>(
        &self,
        request: &BindRequest,
        record: &mut T,
        options: &BindOptions,
    ) -> BindResult<()> {
        self.bind_record(request, record, options)
    }

    /// Type-erased entry point for callers holding optional references.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::NilArgument`] if either argument is missing,
    /// otherwise the same as [`bind`](Self::bind).
    pub fn bind_erased(
        &self,
        request: Option<&BindRequest>,
        record: Option<&mut dyn Record>,
        options: &BindOptions,
    ) -> BindResult<()> {
        let request = request.ok_or(BindError::NilArgument("request"))?;
        let record = record.ok_or(BindError::NilArgument("destination"))?;
        self.bind_record(request, record, options)
    }

    /// Decodes the body into a collection-shaped destination.
    ///
    /// No field resolution runs. The destination must be a sequence, a map, a
    /// [`Value`], or an `Option` of one of those.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::UnsupportedDestination`] for any other
    /// destination, or a decode failure.
    pub fn bind_body<C: Slot>(&self, request: &BindRequest, collection: &mut C) -> BindResult<()> {
        let type_name = std::any::type_name::<C>();
        let kind = collection.kind();
        if !kind.is_collection() {
            return Err(BindError::UnsupportedDestination { type_name, kind });
        }
        if let Some((content_type, document)) = self.decode(request, type_name, &self.options)? {
            collection
                .assign(document)
                .map_err(|e| BindError::Decode {
                    content_type,
                    type_name,
                    source: Box::new(e),
                })?;
        }
        Ok(())
    }

    /// Binds into a pooled instance of `T` and hands it to `f`.
    ///
    /// The instance is reset and returned to the pool when this returns,
    /// whether binding or `f` fails, so no value bound for one call is visible
    /// to a later one.
    ///
    /// # Errors
    ///
    /// Same as [`bind`](Self::bind); `f` is not called on failure.
    ///
    /// # Example
    ///
    /// ```
    /// use gleaner::{BindRequest, Binder, Memo, Record, Value};
    ///
    /// #[derive(Default, Record)]
    /// struct Token {
    ///     #[bind(header = "authorization")]
    ///     value: String,
    /// }
    ///
    /// let binder = Binder::builder()
    ///     .source("header", |req: &BindRequest, name: &str, _: &mut Memo| {
    ///         req.header(name).map(Value::from)
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// let req = BindRequest::builder().header("authorization", "Bearer x").build();
    /// let len = binder.bind_pooled(&req, |token: &mut Token| token.value.len()).unwrap();
    /// assert_eq!(len, 8);
    /// ```
    pub fn bind_pooled<T, R, F>(&self, request: &BindRequest, f: F) -> BindResult<R>
    where
        T: Record + Default,
        F: FnOnce(&mut T) -> R,
    {
        let pool = self.instance_pool::<T>();
        let mut instance = pool.acquire();
        self.bind_record(request, &mut *instance, &self.options)?;
        Ok(f(&mut instance))
    }

    fn instance_pool<T: Record + Default>(&self) -> Arc<InstancePool<T>> {
        let erased = Arc::clone(
            self.instances
                .entry(TypeId::of::<T>())
                .or_insert_with(|| {
                    Arc::new(InstancePool::<T>::new(self.instance_pool_size)) as Arc<dyn Any + Send + Sync>
                })
                .value(),
        );
        erased
            .downcast::<InstancePool<T>>()
            .unwrap_or_else(|_| Arc::new(InstancePool::new(self.instance_pool_size)))
    }

    fn bind_record(
        &self,
        request: &BindRequest,
        record: &mut dyn Record,
        options: &BindOptions,
    ) -> BindResult<()> {
        let schema = record.schema();
        let type_name = schema.type_name;
        let kind = record.kind();
        if kind != SlotKind::Record {
            return Err(BindError::UnsupportedDestination { type_name, kind });
        }

        if let Some((content_type, document)) = self.decode(request, type_name, options)? {
            record.assign(document).map_err(|e| BindError::Decode {
                content_type,
                type_name,
                source: Box::new(e),
            })?;
        }

        let fields = self.cache.fields(record.record_type(), schema);
        let mut memo = self.memos.acquire();
        let resolved = self.resolve_fields(request, record, type_name, &fields, &mut memo, options);
        self.memos.release(memo);
        resolved?;

        record.after_bind(request).map_err(|source| {
            tracing::debug!(record = type_name, error = %source, "post-bind hook failed");
            BindError::Hook { type_name, source }
        })
    }

    /// Reads and decodes the body, returning the media type and document.
    ///
    /// `None` means there was nothing to merge.
    fn decode(
        &self,
        request: &BindRequest,
        type_name: &'static str,
        options: &BindOptions,
    ) -> BindResult<Option<(String, Value)>> {
        if request.is_bodyless_method() {
            return Ok(None);
        }
        if !request.declares_body() {
            if request.is_body_consumed() {
                tracing::warn!(
                    record = type_name,
                    content_type = ?request.media_type(),
                    "request body was consumed by an earlier read, skipping decode"
                );
            }
            return Ok(None);
        }
        let Some(content_type) = request.media_type() else {
            tracing::warn!(record = type_name, "request body has no content type, skipping decode");
            return Ok(None);
        };
        let Some(decoder) = self.decoders.get(&content_type) else {
            tracing::warn!(
                record = type_name,
                content_type = %content_type,
                "no decoder registered, skipping body"
            );
            return Ok(None);
        };

        if let Some(length) = request.content_length() {
            if let Err(source) = decoder.check_length(request, length) {
                return Err(BindError::Decode {
                    content_type,
                    type_name,
                    source,
                });
            }
        }

        let body = if options.preserve_body {
            request.preserve_body()
        } else {
            request.read_body()
        };
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                return Err(BindError::Decode {
                    content_type,
                    type_name,
                    source: Box::new(e),
                })
            }
        };

        tracing::debug!(
            record = type_name,
            content_type = %content_type,
            bytes = body.len(),
            preserved = options.preserve_body,
            "decoding body"
        );
        match decoder.decode(request, &body) {
            Ok(Value::Null) => Ok(None),
            Ok(document) => Ok(Some((content_type, document))),
            Err(source) => Err(BindError::Decode {
                content_type,
                type_name,
                source,
            }),
        }
    }

    fn resolve_fields(
        &self,
        request: &BindRequest,
        record: &mut dyn Record,
        type_name: &'static str,
        fields: &[FieldDescriptor],
        memo: &mut Memo,
        options: &BindOptions,
    ) -> BindResult<()> {
        for field in fields {
            let Some(slot) = record.field_mut(field.index) else {
                continue;
            };

            if options.skip_filled && !slot.is_zero() {
                tracing::trace!(record = type_name, field = field.name, "skipping pre-filled field");
            } else {
                let mut extracted = false;
                for binding in &field.sources {
                    let Some((_, source)) = self.sources.get(binding.position) else {
                        continue;
                    };
                    let Some(value) = source.extract(request, binding.annotation, memo) else {
                        continue;
                    };
                    slot.assign(value).map_err(|source| BindError::Coercion {
                        type_name,
                        field: field.name,
                        source_tag: binding.tag.to_string(),
                        source,
                    })?;
                    tracing::trace!(
                        record = type_name,
                        field = field.name,
                        source = &*binding.tag,
                        "resolved field"
                    );
                    extracted = true;
                    break;
                }

                if let Some(literal) = field.default.filter(|_| !extracted && slot.is_zero()) {
                    slot.assign(Value::from(literal))
                        .map_err(|source| BindError::DefaultValue {
                            type_name,
                            field: field.name,
                            literal,
                            source,
                        })?;
                    tracing::trace!(record = type_name, field = field.name, "applied default");
                }
            }

            for binding in &field.transforms {
                let Some((_, transform)) = self.transforms.get(binding.position) else {
                    continue;
                };
                transform
                    .apply(binding.annotation, &mut *slot)
                    .map_err(|source| BindError::Transform {
                        type_name,
                        field: field.name,
                        tag: binding.tag.to_string(),
                        source,
                    })?;
            }
        }
        Ok(())
    }
}

/// Builder for [`Binder`].
///
/// Sources are tried in the order they are registered, whatever order a
/// field lists its tags in.
pub struct BinderBuilder {
    sources: Vec<(String, Box<dyn ExtractionSource>)>,
    decoders: Vec<(String, Box<dyn BodyDecoder>)>,
    transforms: Vec<(String, Box<dyn Transform>)>,
    options: BindOptions,
    memo_pool_size: usize,
    instance_pool_size: usize,
}

impl fmt::Debug for BinderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinderBuilder")
            .field("sources", &self.sources.iter().map(|(t, _)| t).collect::<Vec<_>>())
            .field("decoders", &self.decoders.iter().map(|(t, _)| t).collect::<Vec<_>>())
            .field("transforms", &self.transforms.iter().map(|(t, _)| t).collect::<Vec<_>>())
            .field("options", &self.options)
            .field("memo_pool_size", &self.memo_pool_size)
            .field("instance_pool_size", &self.instance_pool_size)
            .finish()
    }
}

impl Default for BinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BinderBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            decoders: Vec::new(),
            transforms: Vec::new(),
            options: BindOptions::default(),
            memo_pool_size: DEFAULT_MEMO_POOL_SIZE,
            instance_pool_size: DEFAULT_INSTANCE_POOL_SIZE,
        }
    }

    /// Registers an extraction source under `tag`.
    #[must_use]
    pub fn source(mut self, tag: impl Into<String>, source: impl ExtractionSource + 'static) -> Self {
        self.sources.push((tag.into(), Box::new(source)));
        self
    }

    /// Registers a body decoder for `content_type`.
    #[must_use]
    pub fn decoder(mut self, content_type: &str, decoder: impl BodyDecoder + 'static) -> Self {
        self.decoders
            .push((media_type_essence(content_type), Box::new(decoder)));
        self
    }

    /// Registers a transform under `tag`.
    #[must_use]
    pub fn transform(mut self, tag: impl Into<String>, transform: impl Transform + 'static) -> Self {
        self.transforms.push((tag.into(), Box::new(transform)));
        self
    }

    /// Sets the options used by [`Binder::bind`].
    #[must_use]
    pub fn options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets how many idle extraction memos are kept.
    #[must_use]
    pub fn memo_pool_size(mut self, size: usize) -> Self {
        self.memo_pool_size = size;
        self
    }

    /// Sets how many idle instances [`Binder::bind_pooled`] keeps per type.
    #[must_use]
    pub fn instance_pool_size(mut self, size: usize) -> Self {
        self.instance_pool_size = size;
        self
    }

    /// Validates the registrations and builds the binder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a tag or content type is empty, a tag is
    /// reserved, or a tag or content type is registered twice. Sources and
    /// transforms share one tag namespace.
    pub fn build(self) -> Result<Binder, ConfigError> {
        let mut seen: Vec<&str> = Vec::new();
        for tag in self
            .sources
            .iter()
            .map(|(t, _)| t)
            .chain(self.transforms.iter().map(|(t, _)| t))
        {
            if tag.is_empty() {
                return Err(ConfigError::EmptyTag);
            }
            if RESERVED_KEYS.contains(&tag.as_str()) {
                return Err(ConfigError::ReservedTag(tag.clone()));
            }
            if seen.contains(&tag.as_str()) {
                return Err(ConfigError::DuplicateTag(tag.clone()));
            }
            seen.push(tag);
        }

        let mut decoders = HashMap::with_capacity(self.decoders.len());
        for (content_type, decoder) in self.decoders {
            if content_type.is_empty() {
                return Err(ConfigError::EmptyTag);
            }
            if decoders.contains_key(&content_type) {
                return Err(ConfigError::DuplicateTag(content_type));
            }
            decoders.insert(content_type, decoder);
        }

        let sources: Vec<SourceEntry> = self
            .sources
            .into_iter()
            .map(|(tag, source)| (Arc::from(tag), source))
            .collect();
        let transforms: Vec<TransformEntry> = self
            .transforms
            .into_iter()
            .map(|(tag, transform)| (Arc::from(tag), transform))
            .collect();
        let cache = StructureCache::new(
            sources.iter().map(|(tag, _)| Arc::clone(tag)).collect(),
            transforms.iter().map(|(tag, _)| Arc::clone(tag)).collect(),
        );

        tracing::debug!(
            sources = sources.len(),
            decoders = decoders.len(),
            transforms = transforms.len(),
            "built binder"
        );

        Ok(Binder {
            sources,
            decoders,
            transforms,
            options: self.options,
            cache,
            memos: MemoPool::with_capacity(self.memo_pool_size),
            instance_pool_size: self.instance_pool_size,
            instances: DashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BindErrorKind, BoxError, CoercionError};
    use crate::record::AfterBind;
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn header_source(req: &BindRequest, name: &str, _memo: &mut Memo) -> Option<Value> {
        req.header(name).map(Value::from)
    }

    fn path_source(req: &BindRequest, name: &str, _memo: &mut Memo) -> Option<Value> {
        req.path_params().get(name).map(Value::from)
    }

    fn json_decoder(_req: &BindRequest, body: &[u8]) -> Result<Value, BoxError> {
        Ok(Value::from(serde_json::from_slice::<serde_json::Value>(body)?))
    }

    fn upper(_annotation: &str, slot: &mut dyn Slot) -> Result<(), BoxError> {
        if let Some(text) = slot.to_value().as_text() {
            let upper = text.to_uppercase();
            slot.assign(Value::Text(upper))?;
        }
        Ok(())
    }

    fn binder() -> Binder {
        Binder::builder()
            .source("path", path_source)
            .source("header", header_source)
            .decoder("application/json", json_decoder)
            .transform("upper", upper)
            .build()
            .unwrap()
    }

    #[derive(Debug, Default, crate::Record)]
    struct Account {
        #[bind(header = "x-id", path = "id")]
        id: u64,
        #[bind(header = "x-name", upper)]
        name: String,
        #[bind(header = "x-tier", default = "basic")]
        tier: String,
        #[bind(header = "x-level")]
        level: i8,
        note: String,
    }

    #[derive(Debug, Default, crate::Record)]
    #[bind(after_bind)]
    struct Window {
        #[bind(header = "x-from")]
        from: u32,
        #[bind(header = "x-to")]
        to: u32,
    }

    impl AfterBind for Window {
        fn after_bind(&mut self, _request: &BindRequest) -> Result<(), BoxError> {
            if self.from > self.to {
                return Err("window is inverted".into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_registration_order_decides_priority() {
        let req = BindRequest::builder()
            .header("x-id", "2")
            .path_param("id", "1")
            .build();
        let mut account = Account::default();

        binder().bind(&req, &mut account).unwrap();

        assert_eq!(account.id, 1);
    }

    #[test]
    fn test_later_source_tried_on_absence() {
        let req = BindRequest::builder().header("x-id", "2").build();
        let mut account = Account::default();

        binder().bind(&req, &mut account).unwrap();

        assert_eq!(account.id, 2);
    }

    #[test]
    fn test_first_success_stops_lookup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let binder = Binder::builder()
            .source("path", path_source)
            .source("header", move |req: &BindRequest, name: &str, memo: &mut Memo| {
                counted.fetch_add(1, Ordering::SeqCst);
                header_source(req, name, memo)
            })
            .build()
            .unwrap();
        let req = BindRequest::builder().path_param("id", "5").build();

        let mut account = Account::default();
        binder.bind(&req, &mut account).unwrap();

        assert_eq!(account.id, 5);
        // name, tier and level have no path tag
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_default_and_transform() {
        let req = BindRequest::builder().header("x-name", "ada").build();
        let mut account = Account::default();

        binder().bind(&req, &mut account).unwrap();

        assert_eq!(account.name, "ADA");
        assert_eq!(account.tier, "basic");
        assert_eq!(account.level, 0);
        assert!(account.note.is_empty());
    }

    #[test]
    fn test_skip_filled_still_transforms() {
        let req = BindRequest::builder()
            .header("x-name", "other")
            .header("x-tier", "gold")
            .build();
        let mut account = Account {
            name: "kept".to_string(),
            ..Account::default()
        };

        binder().bind(&req, &mut account).unwrap();

        assert_eq!(account.name, "KEPT");
        assert_eq!(account.tier, "gold");
    }

    #[test]
    fn test_skip_filled_disabled_overwrites() {
        let req = BindRequest::builder().header("x-name", "other").build();
        let mut account = Account {
            name: "kept".to_string(),
            ..Account::default()
        };

        binder()
            .bind_with(&req, &mut account, &BindOptions::default().skip_filled(false))
            .unwrap();

        assert_eq!(account.name, "OTHER");
    }

    #[test]
    fn test_coercion_error_names_field_and_source() {
        let req = BindRequest::builder().header("x-level", "1000").build();
        let mut account = Account::default();

        let err = binder().bind(&req, &mut account).unwrap_err();

        assert_eq!(err.kind(), BindErrorKind::Coercion);
        assert_eq!(err.field(), Some("level"));
        assert_eq!(err.type_name(), Some("Account"));
        match err {
            BindError::Coercion {
                source_tag, source, ..
            } => {
                assert_eq!(source_tag, "header");
                assert!(matches!(source, CoercionError::Overflow { target: "i8", .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_default_is_fatal() {
        #[derive(Debug, Default, crate::Record)]
        struct Broken {
            #[bind(default = "many")]
            count: u16,
        }

        let err = binder()
            .bind(&BindRequest::builder().build(), &mut Broken::default())
            .unwrap_err();

        assert_eq!(err.kind(), BindErrorKind::DefaultValue);
        assert_eq!(err.field(), Some("count"));
    }

    #[test]
    fn test_transform_rejection_is_fatal() {
        let binder = Binder::builder()
            .source("header", header_source)
            .transform("upper", |_: &str, _: &mut dyn Slot| -> Result<(), BoxError> {
                Err("rejected".into())
            })
            .build()
            .unwrap();

        let err = binder
            .bind(&BindRequest::builder().build(), &mut Account::default())
            .unwrap_err();

        assert_eq!(err.kind(), BindErrorKind::Transform);
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_body_then_fields() {
        let req = BindRequest::builder()
            .method(Method::POST)
            .header("content-type", "application/json; charset=utf-8")
            .header("x-name", "header")
            .body(r#"{"id": 9, "note": "from body", "tier": "pro"}"#)
            .build();
        let mut account = Account::default();

        binder().bind(&req, &mut account).unwrap();

        assert_eq!(account.id, 9);
        assert_eq!(account.note, "from body");
        assert_eq!(account.tier, "pro");
        assert_eq!(account.name, "HEADER");
    }

    #[test]
    fn test_bodyless_method_skips_decode() {
        let req = BindRequest::builder()
            .method(Method::GET)
            .header("content-type", "application/json")
            .body("not json")
            .build();

        binder().bind(&req, &mut Account::default()).unwrap();
        assert!(req.declares_body());
    }

    #[test]
    fn test_decode_failure_short_circuits() {
        let req = BindRequest::builder()
            .method(Method::POST)
            .header("content-type", "application/json")
            .header("x-name", "ada")
            .body("{")
            .build();
        let mut account = Account::default();

        let err = binder().bind(&req, &mut account).unwrap_err();

        assert_eq!(err.kind(), BindErrorKind::Decode);
        assert!(account.name.is_empty());
    }

    #[test]
    fn test_body_merge_failure_is_decode_error() {
        let req = BindRequest::builder()
            .method(Method::POST)
            .header("content-type", "application/json")
            .body(r#"{"level": 300}"#)
            .build();

        let err = binder().bind(&req, &mut Account::default()).unwrap_err();

        assert_eq!(err.kind(), BindErrorKind::Decode);
    }

    #[test]
    fn test_unregistered_content_type_skips_body() {
        let req = BindRequest::builder()
            .method(Method::POST)
            .header("content-type", "application/xml")
            .body("<account/>")
            .build();

        binder().bind(&req, &mut Account::default()).unwrap();
        assert!(req.declares_body());
    }

    #[test]
    fn test_hook_failure() {
        let req = BindRequest::builder()
            .header("x-from", "5")
            .header("x-to", "1")
            .build();

        let err = binder().bind(&req, &mut Window::default()).unwrap_err();
        assert_eq!(err.kind(), BindErrorKind::Hook);
        assert_eq!(err.type_name(), Some("Window"));

        let req = BindRequest::builder()
            .header("x-from", "1")
            .header("x-to", "5")
            .build();
        binder().bind(&req, &mut Window::default()).unwrap();
    }

    #[test]
    fn test_bind_erased_nil_arguments() {
        let binder = binder();
        let req = BindRequest::builder().build();
        let mut account = Account::default();
        let options = BindOptions::default();

        let err = binder.bind_erased(None, Some(&mut account), &options).unwrap_err();
        assert!(matches!(err, BindError::NilArgument("request")));

        let err = binder.bind_erased(Some(&req), None, &options).unwrap_err();
        assert!(matches!(err, BindError::NilArgument("destination")));

        binder.bind_erased(Some(&req), Some(&mut account), &options).unwrap();
    }

    #[test]
    fn test_bind_body_collections() {
        let req = BindRequest::builder()
            .method(Method::POST)
            .header("content-type", "application/json")
            .body("[1, 2, 3]")
            .build();
        let mut numbers: Vec<u8> = Vec::new();

        binder().bind_body(&req, &mut numbers).unwrap();

        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_bind_body_rejects_scalars() {
        let req = BindRequest::builder().build();
        let mut scalar = 0_u32;

        let err = binder().bind_body(&req, &mut scalar).unwrap_err();

        assert!(matches!(
            err,
            BindError::UnsupportedDestination {
                kind: SlotKind::Integer,
                ..
            }
        ));
    }

    #[test]
    fn test_pooled_instances_do_not_leak() {
        let binder = binder();
        let first = BindRequest::builder()
            .header("x-name", "x")
            .header("x-level", "30")
            .build();
        let second = BindRequest::builder().header("x-name", "y").build();

        let level = binder
            .bind_pooled(&first, |account: &mut Account| account.level)
            .unwrap();
        assert_eq!(level, 30);

        let (name, level) = binder
            .bind_pooled(&second, |account: &mut Account| (account.name.clone(), account.level))
            .unwrap();
        assert_eq!(name, "Y");
        assert_eq!(level, 0);
    }

    #[test]
    fn test_builder_rejects_bad_tags() {
        let err = Binder::builder()
            .source("header", header_source)
            .transform("header", upper)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTag(t) if t == "header"));

        let err = Binder::builder().source("default", header_source).build().unwrap_err();
        assert!(matches!(err, ConfigError::ReservedTag(t) if t == "default"));

        let err = Binder::builder().source("", header_source).build().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTag));

        let err = Binder::builder()
            .decoder("application/json", json_decoder)
            .decoder("Application/JSON; charset=utf-8", json_decoder)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTag(t) if t == "application/json"));
    }

    #[test]
    fn test_fields_plan() {
        let binder = binder();
        let fields = binder.fields::<Account>();

        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "name", "tier", "level"]);
        assert!(binder.has_decoder("application/json; charset=utf-8"));
        assert_eq!(binder.source_tags().collect::<Vec<_>>(), vec!["path", "header"]);
    }
}

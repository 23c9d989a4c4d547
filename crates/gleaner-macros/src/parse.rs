//! Parsing of `#[derive(Record)]` input and `#[bind(...)]` attributes.

use proc_macro2::Span;
use syn::{
    ext::IdentExt, punctuated::Punctuated, spanned::Spanned, Attribute, Data, DeriveInput, Expr,
    ExprLit, Fields, Ident, Lit, Meta, Token, Type,
};

/// Attribute namespace used on records and their fields.
const ATTR: &str = "bind";

/// A parsed record struct.
#[derive(Debug)]
pub struct RecordInput {
    /// The struct name.
    pub ident: Ident,
    /// Bound fields in declaration order.
    pub fields: Vec<BoundField>,
    /// Fields excluded with `#[bind(skip)]`.
    pub skipped: Vec<Ident>,
    /// Whether `#[bind(after_bind)]` routes the hook to `AfterBind`.
    pub after_bind: bool,
}

/// A field the binder can populate.
#[derive(Debug)]
pub struct BoundField {
    /// The field name.
    pub ident: Ident,
    /// The field type.
    pub ty: Type,
    /// Key of the field in a decoded body document.
    pub body_key: String,
    /// `(key, value)` annotation pairs in declaration order.
    pub annotations: Vec<(String, String)>,
}

/// What a field's `#[bind(...)]` attributes amount to.
#[derive(Debug, Default)]
struct FieldAttrs {
    skip: bool,
    body: Option<String>,
    annotations: Vec<(String, String)>,
}

impl RecordInput {
    /// Parses and validates the derive input.
    pub fn parse(input: &DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "Record cannot be derived for generic types",
            ));
        }

        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => named,
                _ => {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "Record can only be derived for structs with named fields",
                    ))
                }
            },
            Data::Enum(data) => {
                return Err(syn::Error::new(
                    data.enum_token.span,
                    "Record cannot be derived for enums",
                ))
            }
            Data::Union(data) => {
                return Err(syn::Error::new(
                    data.union_token.span,
                    "Record cannot be derived for unions",
                ))
            }
        };

        let after_bind = parse_container_attrs(&input.attrs)?;

        let mut fields = Vec::new();
        let mut skipped = Vec::new();
        for field in &named.named {
            let ident = field
                .ident
                .clone()
                .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;
            let attrs = parse_field_attrs(&field.attrs)?;
            if attrs.skip {
                skipped.push(ident);
                continue;
            }
            let body_key = attrs.body.unwrap_or_else(|| ident.unraw().to_string());
            fields.push(BoundField {
                ident,
                ty: field.ty.clone(),
                body_key,
                annotations: attrs.annotations,
            });
        }

        Ok(Self {
            ident: input.ident.clone(),
            fields,
            skipped,
            after_bind,
        })
    }
}

fn bind_metas(attrs: &[Attribute]) -> syn::Result<Vec<Meta>> {
    let mut metas = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident(ATTR)) {
        let list = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        metas.extend(list);
    }
    Ok(metas)
}

fn meta_key(meta: &Meta) -> syn::Result<String> {
    meta.path()
        .get_ident()
        .map(|ident| ident.unraw().to_string())
        .ok_or_else(|| syn::Error::new(meta.path().span(), "expected identifier"))
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut after_bind = false;
    for meta in bind_metas(attrs)? {
        match &meta {
            Meta::Path(_) if meta_key(&meta)? == "after_bind" => {
                if after_bind {
                    return Err(syn::Error::new(meta.span(), "duplicate `after_bind`"));
                }
                after_bind = true;
            }
            _ => {
                return Err(syn::Error::new(
                    meta.span(),
                    "unknown record attribute, expected `after_bind`",
                ))
            }
        }
    }
    Ok(after_bind)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    let mut seen: Vec<String> = Vec::new();

    for meta in bind_metas(attrs)? {
        let key = meta_key(&meta)?;
        if seen.contains(&key) {
            return Err(syn::Error::new(
                meta.path().span(),
                format!("duplicate key `{key}`"),
            ));
        }
        seen.push(key.clone());

        let value = match &meta {
            Meta::Path(_) => None,
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value()),
                _ => {
                    return Err(syn::Error::new(
                        nv.value.span(),
                        "expected string literal",
                    ))
                }
            },
            Meta::List(list) => {
                return Err(syn::Error::new(
                    list.span(),
                    "expected `key` or `key = \"value\"`",
                ))
            }
        };

        match (key.as_str(), value) {
            ("skip", None) => parsed.skip = true,
            ("body", Some(body)) => parsed.body = Some(body),
            ("skip", Some(_)) | ("body" | "default", None) => {
                return Err(syn::Error::new(
                    meta.span(),
                    format!("invalid form for `{key}`"),
                ))
            }
            ("after_bind", _) => {
                return Err(syn::Error::new(
                    meta.span(),
                    "`after_bind` belongs on the record, not a field",
                ))
            }
            (_, value) => parsed
                .annotations
                .push((key.clone(), value.unwrap_or_default())),
        }
    }

    if parsed.skip && seen.len() > 1 {
        return Err(syn::Error::new(
            Span::call_site(),
            "`skip` cannot be combined with other keys",
        ));
    }
    Ok(parsed)
}

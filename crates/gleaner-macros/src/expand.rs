//! Code generation for `#[derive(Record)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{ext::IdentExt, DeriveInput};

use crate::parse::{BoundField, RecordInput};

/// Expands the derive into `Record` and `Slot` impls.
pub fn expand_record(input: &DeriveInput) -> syn::Result<TokenStream> {
    let record = RecordInput::parse(input)?;
    let ident = &record.ident;
    let type_name = ident.unraw().to_string();
    let field_count = record.fields.len();

    let metas = record.fields.iter().enumerate().map(|(index, field)| field_meta(index, field));
    let (field_arms, field_mut_arms): (Vec<_>, Vec<_>) = record
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let name = &field.ident;
            (
                quote! { #index => ::core::option::Option::Some(&self.#name as &dyn ::gleaner::Slot) },
                quote! { #index => ::core::option::Option::Some(&mut self.#name as &mut dyn ::gleaner::Slot) },
            )
        })
        .unzip();

    let after_bind = record.after_bind.then(|| {
        quote! {
            fn after_bind(
                &mut self,
                request: &::gleaner::BindRequest,
            ) -> ::core::result::Result<(), ::gleaner::BoxError> {
                <Self as ::gleaner::AfterBind>::after_bind(self, request)
            }
        }
    });

    let skipped = &record.skipped;

    Ok(quote! {
        #[automatically_derived]
        impl ::gleaner::Record for #ident {
            fn describe() -> &'static ::gleaner::RecordSchema {
                static FIELDS: [::gleaner::FieldMeta; #field_count] = [#(#metas),*];
                static SCHEMA: ::gleaner::RecordSchema = ::gleaner::RecordSchema {
                    type_name: #type_name,
                    fields: &FIELDS,
                };
                &SCHEMA
            }

            fn schema(&self) -> &'static ::gleaner::RecordSchema {
                <Self as ::gleaner::Record>::describe()
            }

            fn record_type(&self) -> ::core::any::TypeId {
                ::core::any::TypeId::of::<Self>()
            }

            #[allow(clippy::match_single_binding)]
            fn field(&self, index: usize) -> ::core::option::Option<&dyn ::gleaner::Slot> {
                match index {
                    #(#field_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(clippy::match_single_binding)]
            fn field_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn ::gleaner::Slot> {
                match index {
                    #(#field_mut_arms,)*
                    _ => ::core::option::Option::None,
                }
            }

            #after_bind
        }

        #[automatically_derived]
        impl ::gleaner::Slot for #ident {
            fn assign(
                &mut self,
                value: ::gleaner::Value,
            ) -> ::core::result::Result<(), ::gleaner::CoercionError> {
                ::gleaner::__private::merge_document(self, value)
            }

            fn to_value(&self) -> ::gleaner::Value {
                ::gleaner::__private::document_of(self)
            }

            fn is_zero(&self) -> bool {
                ::gleaner::__private::fields_are_zero(self)
            }

            fn reset(&mut self) {
                ::gleaner::__private::reset_fields(self);
                #(self.#skipped = ::core::default::Default::default();)*
            }

            fn kind(&self) -> ::gleaner::SlotKind {
                ::gleaner::SlotKind::Record
            }
        }
    })
}

fn field_meta(index: usize, field: &BoundField) -> TokenStream {
    let name = field.ident.unraw().to_string();
    let body_key = &field.body_key;
    let annotations = field.annotations.iter().map(|(key, value)| {
        quote! { ::gleaner::Annotation { key: #key, value: #value } }
    });
    quote! {
        ::gleaner::FieldMeta {
            index: #index,
            name: #name,
            body_key: #body_key,
            annotations: &[#(#annotations),*],
        }
    }
}

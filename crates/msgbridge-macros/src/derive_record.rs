//! Implementation of the `#[derive(Record)]` macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

use crate::attrs::{RecordAttrs, RecordFieldAttrs};

pub fn derive_record_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_record_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct RecordField<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    name: String,
    number: u32,
}

fn collect_fields(input: &DeriveInput) -> syn::Result<Vec<RecordField<'_>>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Record can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &data.fields,
            "Record can only be derived for structs with named fields",
        ));
    };

    let mut fields: Vec<RecordField<'_>> = Vec::new();
    let mut next_number = 1u32;
    for field in &named.named {
        let attrs = RecordFieldAttrs::from_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = attrs.name.unwrap_or_else(|| ident.to_string());
        let number = attrs.number.unwrap_or(next_number);
        if number == 0 {
            return Err(syn::Error::new_spanned(field, "field numbers start at 1"));
        }
        if let Some(existing) = fields.iter().find(|f| f.number == number || f.name == name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("field '{}' reuses the name or number of '{}'", name, existing.name),
            ));
        }
        next_number = number + 1;
        fields.push(RecordField {
            ident,
            ty: &field.ty,
            name,
            number,
        });
    }
    Ok(fields)
}

fn derive_record_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic types",
        ));
    }

    let attrs = RecordAttrs::from_attrs(&input.attrs)?;
    let full_name = attrs.name.unwrap_or_else(|| name.to_string());
    let fields = collect_fields(input)?;

    let descriptor_fields = fields.iter().map(|f| {
        let field_name = &f.name;
        let number = f.number;
        let ty = f.ty;
        quote! {
            .with_field(
                ::msgbridge::FieldDescriptor::new(
                    #field_name,
                    #number,
                    <#ty as ::msgbridge::FieldType>::field_kind(),
                )
                .with_label(<#ty as ::msgbridge::FieldType>::field_label())
            )
        }
    });

    let get_arms = fields.iter().map(|f| {
        let field_name = &f.name;
        let ident = f.ident;
        quote! {
            #field_name => ::std::result::Result::Ok(::msgbridge::FieldType::to_field_value(&self.#ident)),
        }
    });

    let set_arms = fields.iter().map(|f| {
        let field_name = &f.name;
        let ident = f.ident;
        let ty = f.ty;
        quote! {
            #field_name => {
                self.#ident = <#ty as ::msgbridge::FieldType>::from_field_value(value, name)?;
                ::std::result::Result::Ok(())
            }
        }
    });

    Ok(quote! {
        impl #name {
            #[doc(hidden)]
            fn __msgbridge_descriptor() -> &'static ::msgbridge::RecordDescriptor {
                ::msgbridge::__private::lazy_static! {
                    static ref DESCRIPTOR: ::msgbridge::RecordDescriptor =
                        ::msgbridge::RecordDescriptor::new(#full_name)
                            #(#descriptor_fields)*;
                }
                &DESCRIPTOR
            }
        }

        impl ::msgbridge::Reflect for #name {
            fn descriptor(&self) -> &::msgbridge::RecordDescriptor {
                Self::__msgbridge_descriptor()
            }

            fn get_field(
                &self,
                name: &str,
            ) -> ::std::result::Result<::msgbridge::FieldValue, ::msgbridge::ReflectError> {
                match name {
                    #(#get_arms)*
                    _ => ::std::result::Result::Err(::msgbridge::ReflectError::UnknownField {
                        record: #full_name.to_owned(),
                        field: name.to_owned(),
                    }),
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: ::msgbridge::FieldValue,
            ) -> ::std::result::Result<(), ::msgbridge::ReflectError> {
                match name {
                    #(#set_arms)*
                    _ => ::std::result::Result::Err(::msgbridge::ReflectError::UnknownField {
                        record: #full_name.to_owned(),
                        field: name.to_owned(),
                    }),
                }
            }

            fn clear(&mut self) {
                *self = <Self as ::std::default::Default>::default();
            }
        }

        impl ::msgbridge::Record for #name {
            fn static_descriptor() -> ::std::option::Option<&'static ::msgbridge::RecordDescriptor> {
                ::std::option::Option::Some(Self::__msgbridge_descriptor())
            }
        }

        impl ::msgbridge::FieldType for #name {
            fn field_kind() -> ::msgbridge::FieldKind {
                ::msgbridge::FieldKind::Record(#full_name.to_owned())
            }

            fn to_field_value(&self) -> ::msgbridge::FieldValue {
                ::msgbridge::record::record_to_field_value(self)
            }

            fn from_field_value(
                value: ::msgbridge::FieldValue,
                field: &str,
            ) -> ::std::result::Result<Self, ::msgbridge::ReflectError> {
                ::msgbridge::record::record_from_field_value::<#name>(value, field)
            }
        }

        ::msgbridge::__impl_record_shapes!(#name);
    })
}

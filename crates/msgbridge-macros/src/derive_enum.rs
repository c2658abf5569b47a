//! Implementation of the `#[derive(RecordEnum)]` macro.
//!
//! Conversions between the enum and its `#[repr]` integer come from
//! `num_enum`'s `FromPrimitive` and `IntoPrimitive`, which must be derived
//! alongside.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

use crate::attrs::{EnumAttrs, VariantAttrs, repr_type};

pub fn derive_record_enum_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_record_enum_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_record_enum_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(name, "RecordEnum can only be derived for enums"));
    };

    let attrs = EnumAttrs::from_attrs(&input.attrs)?;
    let full_name = attrs.name.unwrap_or_else(|| name.to_string());
    let translate = attrs.translate;
    let repr = repr_type(&input.attrs)?.unwrap_or_else(|| format_ident!("i32"));

    // The catch-all variant carries a value and has no enumerator name.
    let mut values = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            continue;
        }
        let variant_attrs = VariantAttrs::from_attrs(&variant.attrs)?;
        let ident = &variant.ident;
        let enumerator = variant_attrs.name.unwrap_or_else(|| ident.to_string());
        values.push(quote! {
            .with_value(
                #enumerator,
                ::std::convert::Into::<i64>::into(<#repr as ::std::convert::From<#name>>::from(#name::#ident)),
            )
        });
    }

    Ok(quote! {
        impl ::msgbridge::RecordEnum for #name {
            type Repr = #repr;

            const TRANSLATE: bool = #translate;

            fn descriptor() -> &'static ::msgbridge::EnumDescriptor {
                ::msgbridge::__private::lazy_static! {
                    static ref DESCRIPTOR: ::msgbridge::EnumDescriptor =
                        ::msgbridge::EnumDescriptor::new(#full_name)
                            #(#values)*;
                }
                &DESCRIPTOR
            }

            fn from_repr(repr: #repr) -> Self {
                <Self as ::std::convert::From<#repr>>::from(repr)
            }

            fn to_repr(self) -> #repr {
                <#repr as ::std::convert::From<Self>>::from(self)
            }
        }

        ::msgbridge::__impl_enum_shapes!(#name);
    })
}

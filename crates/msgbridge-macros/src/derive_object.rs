//! Implementation of the `#[derive(NativeObject)]` macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

use crate::attrs::ObjectAttrs;

pub fn derive_native_object_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_native_object_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_native_object_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "NativeObject cannot be derived for generic types",
        ));
    }

    let attrs = ObjectAttrs::from_attrs(&input.attrs)?;
    let host_name = attrs.name.unwrap_or_else(|| name.to_string());

    Ok(quote! {
        impl ::msgbridge::NativeObject for #name {
            const NAME: &'static str = #host_name;
        }

        ::msgbridge::__impl_object_shapes!(#name);
    })
}

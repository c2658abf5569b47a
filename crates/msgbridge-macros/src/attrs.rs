//! Attribute parsing utilities for msgbridge macros.

use syn::{Attribute, LitBool, LitInt, LitStr};

/// Parsed `#[record(...)]` attributes on a struct.
#[derive(Debug, Default)]
pub struct RecordAttrs {
    /// Full record name (default: Rust struct name)
    pub name: Option<String>,
}

/// Parsed `#[record(...)]` attributes on a field.
#[derive(Debug, Default)]
pub struct RecordFieldAttrs {
    /// Override field name
    pub name: Option<String>,
    /// Explicit field number
    pub number: Option<u32>,
    /// Leave the field out of the descriptor
    pub skip: bool,
}

/// Parsed `#[record_enum(...)]` attributes on an enum.
#[derive(Debug)]
pub struct EnumAttrs {
    /// Full enum name (default: Rust enum name)
    pub name: Option<String>,
    /// Whether the enum translator handles this type
    pub translate: bool,
}

impl Default for EnumAttrs {
    fn default() -> Self {
        Self {
            name: None,
            translate: true,
        }
    }
}

/// Parsed `#[record_enum(...)]` attributes on a variant.
#[derive(Debug, Default)]
pub struct VariantAttrs {
    /// Override enumerator name
    pub name: Option<String>,
}

/// Parsed `#[native_object(...)]` attributes.
#[derive(Debug, Default)]
pub struct ObjectAttrs {
    /// Host type name (default: Rust type name)
    pub name: Option<String>,
}

fn unknown(meta: &syn::meta::ParseNestedMeta<'_>, attr: &str) -> syn::Error {
    meta.error(format!(
        "unknown {} attribute: {}",
        attr,
        meta.path.get_ident().map(|i| i.to_string()).unwrap_or_default()
    ))
}

impl RecordAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("record") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else {
                    return Err(unknown(&meta, "record"));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

impl RecordFieldAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("record") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else if meta.path.is_ident("number") {
                    let value: LitInt = meta.value()?.parse()?;
                    result.number = Some(value.base10_parse()?);
                } else if meta.path.is_ident("skip") {
                    result.skip = true;
                } else {
                    return Err(unknown(&meta, "record"));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

impl EnumAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("record_enum") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else if meta.path.is_ident("translate") {
                    let value: LitBool = meta.value()?.parse()?;
                    result.translate = value.value;
                } else {
                    return Err(unknown(&meta, "record_enum"));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

impl VariantAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("record_enum") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else {
                    return Err(unknown(&meta, "record_enum"));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

impl ObjectAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("native_object") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.name = Some(value.value());
                } else {
                    return Err(unknown(&meta, "native_object"));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

/// The integer type named by `#[repr(...)]`, if any.
pub fn repr_type(attrs: &[Attribute]) -> syn::Result<Option<syn::Ident>> {
    let mut repr = None;

    for attr in attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if let Some(ident) = meta.path.get_ident() {
                let name = ident.to_string();
                if matches!(
                    name.as_str(),
                    "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32"
                ) {
                    repr = Some(ident.clone());
                }
            }
            Ok(())
        })?;
    }

    Ok(repr)
}

//! Conversion traits for the scalar bridge.
//!
//! This module provides traits for converting between Rust values and
//! [`HostValue`]s:
//! - [`FromHost`]: Extract a Rust value from a host value
//! - [`IntoHost`]: Convert a Rust value into a host value
//!
//! ## Supported Types
//!
//! - Integers: `i8`, `i16`, `i32`, `i64`, `u8`, `u16`, `u32`, `u64`, `usize`.
//!   The host slot is an `i64`: negative values never reach an unsigned
//!   type, and unsigned values above `i64::MAX` saturate on the way out.
//! - Floats: `f32`, `f64`
//! - Boolean, `String`, `&str` (borrowed from the host slot), unit `()`
//! - Containers: `Vec<T>`, `Option<T>`
//!
//! Records, enums and native objects get their implementations from the
//! derive macros.
//!
//! ## Strict and convert passes
//!
//! Every conversion runs under a [`Conversion`] context. The strict pass
//! (`convert == false`) accepts only the exact host kind; the convert pass
//! also widens ints to floats, narrows integral floats to ints and resolves
//! enumerators by name.

use std::fmt;

use crate::dynamic::RecordFactory;
use crate::error::ConversionError;
use crate::host::HostValue;

/// Settings for one conversion pass.
#[derive(Clone, Copy, Default)]
pub struct Conversion<'f> {
    /// Allow implicit conversions between host kinds
    pub convert: bool,
    /// Allow enum lookup by enumerator name (convert pass only)
    pub enum_names: bool,
    /// Factory used to instantiate dynamic records by name
    pub factory: Option<&'f dyn RecordFactory>,
}

impl<'f> Conversion<'f> {
    /// Exact host kinds only.
    pub const STRICT: Conversion<'static> = Conversion {
        convert: false,
        enum_names: false,
        factory: None,
    };

    /// Implicit conversions allowed, including enum names.
    pub const IMPLICIT: Conversion<'static> = Conversion {
        convert: true,
        enum_names: true,
        factory: None,
    };

    pub fn with_factory<'g>(self, factory: &'g dyn RecordFactory) -> Conversion<'g> {
        Conversion {
            convert: self.convert,
            enum_names: self.enum_names,
            factory: Some(factory),
        }
    }

    /// True when enumerator names may stand in for enum values.
    pub fn allows_enum_names(&self) -> bool {
        self.convert && self.enum_names
    }
}

impl fmt::Debug for Conversion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion")
            .field("convert", &self.convert)
            .field("enum_names", &self.enum_names)
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

/// Extract a value from a host slot.
///
/// The slot is borrowed for `'w` so borrowing conversions (`&str`,
/// `Wrapped<R, ConstKind>`) can hand out references into it. Implementations
/// must not modify the slot: a failed overload leaves it for the next one.
pub trait FromHost<'w>: Sized {
    fn from_host(value: &'w mut HostValue, cx: &Conversion<'_>) -> Result<Self, ConversionError>;
}

/// Convert a value into a host value.
pub trait IntoHost {
    fn into_host(self) -> HostValue;
}

fn mismatch(expected: &'static str, value: &HostValue) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        actual: value.type_name(),
    }
}

/// Integral value of a float, if it has one and `convert` allows it.
pub(crate) fn integral(value: f64, target_type: &'static str) -> Result<i64, ConversionError> {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(ConversionError::FloatConversion { value, target_type })
    }
}

fn host_int(
    value: &HostValue,
    cx: &Conversion<'_>,
    target_type: &'static str,
) -> Result<i64, ConversionError> {
    match value {
        HostValue::Int(v) => Ok(*v),
        HostValue::Float(v) if cx.convert => integral(*v, target_type),
        _ => Err(mismatch("int", value)),
    }
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_host_int {
    ($($ty:ty),*) => {
        $(
            impl<'w> FromHost<'w> for $ty {
                fn from_host(
                    value: &'w mut HostValue,
                    cx: &Conversion<'_>,
                ) -> Result<Self, ConversionError> {
                    let v = host_int(value, cx, stringify!($ty))?;
                    <$ty>::try_from(v).map_err(|_| ConversionError::IntegerOverflow {
                        value: v,
                        target_type: stringify!($ty),
                    })
                }
            }

            // unsigned values above i64::MAX saturate
            impl IntoHost for $ty {
                fn into_host(self) -> HostValue {
                    HostValue::Int(i64::try_from(self).unwrap_or(i64::MAX))
                }
            }
        )*
    };
}

impl_host_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

// ============================================================================
// Float implementations
// ============================================================================

impl<'w> FromHost<'w> for f64 {
    fn from_host(value: &'w mut HostValue, cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        match value {
            HostValue::Float(v) => Ok(*v),
            HostValue::Int(v) if cx.convert => Ok(*v as f64),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl IntoHost for f64 {
    fn into_host(self) -> HostValue {
        HostValue::Float(self)
    }
}

impl<'w> FromHost<'w> for f32 {
    fn from_host(value: &'w mut HostValue, cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        let v = f64::from_host(value, cx)?;
        if v.is_finite() && (v > f32::MAX as f64 || v < f32::MIN as f64) {
            return Err(ConversionError::FloatConversion {
                value: v,
                target_type: "f32",
            });
        }
        Ok(v as f32)
    }
}

impl IntoHost for f32 {
    fn into_host(self) -> HostValue {
        HostValue::Float(self as f64)
    }
}

// ============================================================================
// Bool, strings, unit
// ============================================================================

impl<'w> FromHost<'w> for bool {
    fn from_host(value: &'w mut HostValue, _cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        match value {
            HostValue::Bool(v) => Ok(*v),
            _ => Err(mismatch("bool", value)),
        }
    }
}

impl IntoHost for bool {
    fn into_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

impl<'w> FromHost<'w> for String {
    fn from_host(value: &'w mut HostValue, _cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        match value {
            HostValue::Str(s) => Ok(s.clone()),
            _ => Err(mismatch("str", value)),
        }
    }
}

impl IntoHost for String {
    fn into_host(self) -> HostValue {
        HostValue::Str(self)
    }
}

impl<'w> FromHost<'w> for &'w str {
    fn from_host(value: &'w mut HostValue, _cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        match value {
            HostValue::Str(s) => Ok(s.as_str()),
            _ => Err(mismatch("str", value)),
        }
    }
}

impl IntoHost for &str {
    fn into_host(self) -> HostValue {
        HostValue::Str(self.to_owned())
    }
}

impl IntoHost for () {
    fn into_host(self) -> HostValue {
        HostValue::None
    }
}

impl IntoHost for HostValue {
    fn into_host(self) -> HostValue {
        self
    }
}

// ============================================================================
// Containers
// ============================================================================

impl<'w, T: FromHost<'w>> FromHost<'w> for Vec<T> {
    fn from_host(value: &'w mut HostValue, cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        match value {
            HostValue::List(items) => items.iter_mut().map(|item| T::from_host(item, cx)).collect(),
            _ => Err(mismatch("list", value)),
        }
    }
}

impl<T: IntoHost> IntoHost for Vec<T> {
    fn into_host(self) -> HostValue {
        HostValue::List(self.into_iter().map(IntoHost::into_host).collect())
    }
}

impl<'w, T: FromHost<'w>> FromHost<'w> for Option<T> {
    fn from_host(value: &'w mut HostValue, cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        if value.is_none() {
            return Ok(None);
        }
        T::from_host(value, cx).map(Some)
    }
}

impl<T: IntoHost> IntoHost for Option<T> {
    fn into_host(self) -> HostValue {
        match self {
            Some(value) => value.into_host(),
            None => HostValue::None,
        }
    }
}

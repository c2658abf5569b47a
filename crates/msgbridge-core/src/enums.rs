//! Enum translation.
//!
//! Enums cross as their underlying integer. Values are never checked against
//! the declared enumerators, so an enumerator added on one side after the
//! other was built still round-trips unchanged.
//!
//! An enum may opt out with `#[record_enum(translate = false)]`. It then
//! crosses as an opaque [`HostObject`] and neither integers nor names are
//! accepted for it.

use std::marker::PhantomData;

use crate::convert::{Conversion, integral};
use crate::descriptor::EnumDescriptor;
use crate::error::{ConversionError, ReflectError};
use crate::host::{HostObject, HostValue};
use crate::reflect::{FieldValue, kind_mismatch};

/// An enum that can cross the boundary.
///
/// Usually derived together with `num_enum`'s `FromPrimitive` and
/// `IntoPrimitive`, whose `#[num_enum(catch_all)]` variant keeps unknown
/// values intact.
pub trait RecordEnum: Copy + Send + Sync + 'static {
    /// The underlying integer type.
    type Repr: Copy + Into<i64> + TryFrom<i64>;

    /// Whether the enum translator handles this type.
    const TRANSLATE: bool = true;

    fn descriptor() -> &'static EnumDescriptor;

    /// Total: values with no named enumerator are preserved.
    fn from_repr(repr: Self::Repr) -> Self;

    fn to_repr(self) -> Self::Repr;
}

/// Integer translation for one enum type.
pub struct EnumTranslator<E>(PhantomData<E>);

impl<E: RecordEnum> EnumTranslator<E> {
    pub const fn is_enabled() -> bool {
        E::TRANSLATE
    }

    /// The raw underlying integer, unvalidated.
    pub fn to_host(value: E) -> HostValue {
        HostValue::Int(value.to_repr().into())
    }

    pub fn from_host(value: &HostValue, cx: &Conversion<'_>) -> Result<E, ConversionError> {
        match value {
            HostValue::Int(v) => Self::from_i64(*v),
            HostValue::Float(v) if cx.convert => Self::from_i64(integral(*v, std::any::type_name::<E::Repr>())?),
            HostValue::Str(name) if cx.allows_enum_names() => {
                let descriptor = E::descriptor();
                let v = descriptor
                    .value_of(name)
                    .ok_or_else(|| ConversionError::UnknownEnumerator {
                        enum_name: descriptor.full_name().to_owned(),
                        name: name.clone(),
                    })?;
                Self::from_i64(v)
            }
            other => Err(ConversionError::TypeMismatch {
                expected: "int",
                actual: other.type_name(),
            }),
        }
    }

    fn from_i64(value: i64) -> Result<E, ConversionError> {
        E::Repr::try_from(value)
            .map(E::from_repr)
            .map_err(|_| ConversionError::IntegerOverflow {
                value,
                target_type: std::any::type_name::<E::Repr>(),
            })
    }
}

/// Host form of an enum value: the translator's integer, or an opaque object
/// for opted-out types.
pub fn enum_into_host<E: RecordEnum>(value: E) -> HostValue {
    if EnumTranslator::<E>::is_enabled() {
        EnumTranslator::to_host(value)
    } else {
        HostValue::Object(HostObject::new(E::descriptor().full_name(), value))
    }
}

pub fn enum_from_host<E: RecordEnum>(value: &HostValue, cx: &Conversion<'_>) -> Result<E, ConversionError> {
    if EnumTranslator::<E>::is_enabled() {
        return EnumTranslator::from_host(value, cx);
    }
    let opaque = match value {
        HostValue::Object(object) => object.downcast_ref::<E>().copied(),
        _ => None,
    };
    opaque.ok_or_else(|| ConversionError::TypeMismatch {
        expected: E::descriptor().full_name(),
        actual: value.type_name(),
    })
}

pub fn enum_to_field_value<E: RecordEnum>(value: E) -> FieldValue {
    FieldValue::Enum(value.to_repr().into())
}

/// Enum fields store the integer; names are resolved for string values.
pub fn enum_from_field_value<E: RecordEnum>(value: FieldValue, field: &str) -> Result<E, ReflectError> {
    let v = match value {
        FieldValue::Enum(v) | FieldValue::Int(v) => v,
        FieldValue::Str(name) => E::descriptor().value_of(&name).ok_or_else(|| ReflectError::KindMismatch {
            field: field.to_owned(),
            expected: "enumerator name",
            actual: "str",
        })?,
        other => return Err(kind_mismatch(field, "enum", &other)),
    };
    E::Repr::try_from(v)
        .map(E::from_repr)
        .map_err(|_| ReflectError::OutOfRange {
            value: v,
            target_type: std::any::type_name::<E::Repr>(),
        })
}

/// Implements the boundary traits for one enum type. Emitted by
/// `#[derive(RecordEnum)]`.
#[macro_export]
#[doc(hidden)]
macro_rules! __impl_enum_shapes {
    ($ty:ty) => {
        impl $crate::category::Classify for $ty {
            const CATEGORY: $crate::category::Category = $crate::category::Category::Passthrough;
        }

        impl<'w> $crate::convert::FromHost<'w> for $ty {
            fn from_host(
                value: &'w mut $crate::host::HostValue,
                cx: &$crate::convert::Conversion<'_>,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                $crate::enums::enum_from_host::<$ty>(value, cx)
            }
        }

        impl $crate::convert::IntoHost for $ty {
            fn into_host(self) -> $crate::host::HostValue {
                $crate::enums::enum_into_host(self)
            }
        }

        impl<'w> $crate::adapt::AdaptParam<'w> for $ty {
            type Boundary = $ty;

            fn unwrap(
                boundary: &'w mut Self::Boundary,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                ::std::result::Result::Ok(*boundary)
            }
        }

        impl $crate::adapt::AdaptReturn for $ty {
            type Boundary = $ty;

            fn wrap(self) -> ::std::result::Result<Self::Boundary, $crate::error::NativeError> {
                ::std::result::Result::Ok(self)
            }
        }

        impl $crate::adapt::ContainerElement for $ty {}

        impl $crate::reflect::FieldType for $ty {
            fn field_kind() -> $crate::descriptor::FieldKind {
                $crate::descriptor::FieldKind::Enum(
                    <$ty as $crate::enums::RecordEnum>::descriptor().full_name().to_owned(),
                )
            }

            fn to_field_value(&self) -> $crate::reflect::FieldValue {
                $crate::enums::enum_to_field_value(*self)
            }

            fn from_field_value(
                value: $crate::reflect::FieldValue,
                field: &str,
            ) -> ::std::result::Result<Self, $crate::error::ReflectError> {
                $crate::enums::enum_from_field_value::<$ty>(value, field)
            }
        }
    };
}

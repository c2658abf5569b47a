//! Records and their host conversion.
//!
//! A record coming from the host arrives in one of three forms:
//! - a [`HostObject`](crate::host::HostObject) holding the same Rust type:
//!   cloned for `Value`, borrowed for `ConstRef`/`MutableRef`
//! - a `HostObject` holding some other record: copied through its
//!   reflection view if the target accepts that type name
//! - a [`HostRecord`](crate::host::HostRecord): copied field by field
//!
//! Going back, records are moved into a `HostObject`.

use crate::convert::Conversion;
use crate::descriptor::RecordDescriptor;
use crate::dynamic::DynamicRecord;
use crate::error::{ConversionError, ReflectError};
use crate::host::{HostRecord, HostValue};
use crate::reflect::{FieldValue, Reflect, RecordValue, kind_mismatch};

/// A structured record that can cross the boundary.
pub trait Record: Reflect + Clone + Default + Send + Sync + 'static {
    /// Schema shared by every instance, for statically known record types.
    fn static_descriptor() -> Option<&'static RecordDescriptor>;

    /// A default instance for the host type name `type_name`, or `None` if
    /// this Rust type cannot represent it.
    fn instantiate(type_name: &str, cx: &Conversion<'_>) -> Option<Self> {
        let _ = cx;
        Self::static_descriptor()
            .filter(|descriptor| descriptor.full_name() == type_name)
            .map(|_| Self::default())
    }

    /// A native copy of a record of possibly different Rust type.
    fn from_reflect(source: &dyn Reflect, cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        let mut native = instantiate::<Self>(source.descriptor().full_name(), cx)?;
        native.merge_record_value(&source.to_record_value())?;
        Ok(native)
    }

    /// Name used in error messages when a host value does not fit.
    fn expected_name() -> &'static str {
        Self::static_descriptor().map_or(std::any::type_name::<Self>(), RecordDescriptor::full_name)
    }
}

impl Record for DynamicRecord {
    fn static_descriptor() -> Option<&'static RecordDescriptor> {
        None
    }

    fn instantiate(type_name: &str, cx: &Conversion<'_>) -> Option<Self> {
        cx.factory?.new_record(type_name)
    }

    /// Takes any record, using the source's own descriptor.
    fn from_reflect(source: &dyn Reflect, _cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        Ok(DynamicRecord::copy_of(source)?)
    }

    fn expected_name() -> &'static str {
        "dynamic record"
    }
}

fn instantiate<R: Record>(type_name: &str, cx: &Conversion<'_>) -> Result<R, ConversionError> {
    match R::instantiate(type_name, cx) {
        Some(record) => Ok(record),
        None if R::static_descriptor().is_some() => Err(ConversionError::RecordMismatch {
            expected: R::expected_name().to_owned(),
            actual: type_name.to_owned(),
        }),
        None => Err(ConversionError::UnknownRecordType {
            type_name: type_name.to_owned(),
        }),
    }
}

/// Copy a host-built record into a fresh native instance.
pub fn record_from_host_record<R: Record>(
    record: &HostRecord,
    cx: &Conversion<'_>,
) -> Result<R, ConversionError> {
    let mut native = instantiate::<R>(record.type_name(), cx)?;
    native.merge_record_value(&RecordValue::from_host(record)?)?;
    Ok(native)
}

/// An owned native copy of whatever record the host passed.
pub fn record_from_host<R: Record>(value: &HostValue, cx: &Conversion<'_>) -> Result<R, ConversionError> {
    match value {
        HostValue::Object(object) => {
            if let Some(record) = object.downcast_ref::<R>() {
                return Ok(record.clone());
            }
            match object.reflect() {
                Some(view) => R::from_reflect(view, cx),
                None => Err(ConversionError::RecordMismatch {
                    expected: R::expected_name().to_owned(),
                    actual: object.type_name().to_owned(),
                }),
            }
        }
        HostValue::Record(record) => record_from_host_record::<R>(record, cx),
        HostValue::None => Err(ConversionError::NullHandle {
            target_type: R::expected_name(),
        }),
        other => Err(ConversionError::TypeMismatch {
            expected: "record",
            actual: other.type_name(),
        }),
    }
}

/// Nested record field value.
pub fn record_to_field_value<R: Record>(record: &R) -> FieldValue {
    FieldValue::Record(record.to_record_value())
}

/// Build a nested record from its field value.
pub fn record_from_field_value<R: Record>(value: FieldValue, field: &str) -> Result<R, ReflectError> {
    match value {
        FieldValue::Record(nested) => {
            let mut record = R::default();
            record.merge_record_value(&nested)?;
            Ok(record)
        }
        FieldValue::Unset => Ok(R::default()),
        other => Err(kind_mismatch(field, "record", &other)),
    }
}

/// Implements the boundary traits for one record type and its reference,
/// `Box` and `Arc` shapes. Emitted by `#[derive(Record)]`.
#[macro_export]
#[doc(hidden)]
macro_rules! __impl_record_shapes {
    ($ty:ty) => {
        impl $crate::category::Classify for $ty {
            const CATEGORY: $crate::category::Category = $crate::category::Category::Value;
        }

        impl<'a> $crate::category::Classify for &'a $ty {
            const CATEGORY: $crate::category::Category = $crate::category::Category::ConstRef;
        }

        impl<'a> $crate::category::Classify for &'a mut $ty {
            const CATEGORY: $crate::category::Category = $crate::category::Category::NotAdaptable;
        }

        impl $crate::category::Classify for ::std::boxed::Box<$ty> {
            const CATEGORY: $crate::category::Category = $crate::category::Category::Value;
        }

        impl $crate::category::Classify for ::std::sync::Arc<$ty> {
            const CATEGORY: $crate::category::Category = $crate::category::Category::Value;
        }

        impl<'w> $crate::convert::FromHost<'w> for $ty {
            fn from_host(
                value: &'w mut $crate::host::HostValue,
                cx: &$crate::convert::Conversion<'_>,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                $crate::record::record_from_host::<$ty>(value, cx)
            }
        }

        impl $crate::convert::IntoHost for $ty {
            fn into_host(self) -> $crate::host::HostValue {
                $crate::host::HostValue::record(self)
            }
        }

        impl<'w> $crate::adapt::AdaptParam<'w> for $ty {
            type Boundary = $crate::wrapped::Wrapped<'w, $ty, $crate::ownership::ValueKind>;

            fn unwrap(
                boundary: &'w mut Self::Boundary,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                ::std::result::Result::Ok(boundary.take())
            }
        }

        impl<'w> $crate::adapt::AdaptParam<'w> for &'w $ty {
            type Boundary = $crate::wrapped::Wrapped<'w, $ty, $crate::ownership::ConstKind>;

            fn unwrap(
                boundary: &'w mut Self::Boundary,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                let boundary: &'w Self::Boundary = boundary;
                boundary.get().ok_or($crate::error::ConversionError::NullHandle {
                    target_type: <$ty as $crate::record::Record>::expected_name(),
                })
            }
        }

        impl<'w> $crate::adapt::AdaptParam<'w> for ::std::boxed::Box<$ty> {
            type Boundary = $crate::wrapped::Wrapped<'w, $ty, $crate::ownership::ValueKind>;

            fn unwrap(
                boundary: &'w mut Self::Boundary,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                ::std::result::Result::Ok(::std::boxed::Box::new(boundary.take()))
            }
        }

        impl<'w> $crate::adapt::AdaptParam<'w> for ::std::sync::Arc<$ty> {
            type Boundary = $crate::wrapped::Wrapped<'w, $ty, $crate::ownership::ValueKind>;

            fn unwrap(
                boundary: &'w mut Self::Boundary,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                ::std::result::Result::Ok(::std::sync::Arc::new(boundary.take()))
            }
        }

        impl $crate::adapt::AdaptReturn for $ty {
            type Boundary = $crate::wrapped::Wrapped<'static, $ty, $crate::ownership::ValueKind>;

            fn wrap(self) -> ::std::result::Result<Self::Boundary, $crate::error::NativeError> {
                ::std::result::Result::Ok(
                    $crate::wrapped::Wrapped::<$ty, $crate::ownership::ValueKind>::new(self),
                )
            }
        }

        impl $crate::adapt::AdaptReturn for ::std::boxed::Box<$ty> {
            type Boundary = $crate::wrapped::Wrapped<'static, $ty, $crate::ownership::ValueKind>;

            fn wrap(self) -> ::std::result::Result<Self::Boundary, $crate::error::NativeError> {
                ::std::result::Result::Ok(
                    $crate::wrapped::Wrapped::<$ty, $crate::ownership::ValueKind>::new(*self),
                )
            }
        }

        // shared records are cloned out unless this is the last handle
        impl $crate::adapt::AdaptReturn for ::std::sync::Arc<$ty> {
            type Boundary = $crate::wrapped::Wrapped<'static, $ty, $crate::ownership::ValueKind>;

            fn wrap(self) -> ::std::result::Result<Self::Boundary, $crate::error::NativeError> {
                ::std::result::Result::Ok(
                    $crate::wrapped::Wrapped::<$ty, $crate::ownership::ValueKind>::new(
                        ::std::sync::Arc::unwrap_or_clone(self),
                    ),
                )
            }
        }

        impl $crate::adapt::ContainerElement for $ty {}

        impl $crate::adapt::ContainerElement for ::std::boxed::Box<$ty> {}

        impl $crate::adapt::ContainerElement for ::std::sync::Arc<$ty> {}
    };
}

crate::__impl_record_shapes!(DynamicRecord);

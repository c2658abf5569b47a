//! Native objects that are not records.
//!
//! A native object crosses as an opaque [`HostObject`] under its
//! [`NativeObject::NAME`]. It is returned by move, borrowed as `&T` when
//! passed back in, and can be the receiver of registered methods.

use std::any::Any;

use crate::error::ConversionError;
use crate::host::{HostObject, HostValue};

/// A native type the host holds by handle.
///
/// Implemented through `#[derive(NativeObject)]`:
///
/// ```ignore
/// #[derive(NativeObject)]
/// #[native_object(name = "Inventory")]
/// pub struct Inventory { /* ... */ }
/// ```
pub trait NativeObject: Any + Send + Sync {
    /// Host-visible type name.
    const NAME: &'static str;
}

pub fn object_into_host<T: NativeObject>(value: T) -> HostValue {
    HostValue::Object(HostObject::new(T::NAME, value))
}

/// Borrow a native object out of a host value.
pub fn object_ref<T: NativeObject>(value: &HostValue) -> Result<&T, ConversionError> {
    match value {
        HostValue::None => Err(ConversionError::NullHandle { target_type: T::NAME }),
        HostValue::Object(object) => object.downcast_ref::<T>().ok_or_else(|| ConversionError::RecordMismatch {
            expected: T::NAME.to_owned(),
            actual: object.type_name().to_owned(),
        }),
        other => Err(ConversionError::TypeMismatch {
            expected: T::NAME,
            actual: other.type_name(),
        }),
    }
}

/// Implements the boundary traits for one native object type. Emitted by
/// `#[derive(NativeObject)]`.
#[macro_export]
#[doc(hidden)]
macro_rules! __impl_object_shapes {
    ($ty:ty) => {
        impl $crate::category::Classify for $ty {
            const CATEGORY: $crate::category::Category = $crate::category::Category::Passthrough;
        }

        impl<'a> $crate::category::Classify for &'a $ty {
            const CATEGORY: $crate::category::Category = $crate::category::Category::Passthrough;
        }

        impl<'w> $crate::convert::FromHost<'w> for &'w $ty {
            fn from_host(
                value: &'w mut $crate::host::HostValue,
                _cx: &$crate::convert::Conversion<'_>,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                let value: &'w $crate::host::HostValue = value;
                $crate::object::object_ref::<$ty>(value)
            }
        }

        impl $crate::convert::IntoHost for $ty {
            fn into_host(self) -> $crate::host::HostValue {
                $crate::object::object_into_host(self)
            }
        }

        impl<'w> $crate::adapt::AdaptParam<'w> for &'w $ty {
            type Boundary = &'w $ty;

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
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapt::{AdaptReturn, wrap_return};
    use crate::category::{Category, Classify};
    use crate::convert::{Conversion, FromHost};

    #[derive(Debug, PartialEq)]
    struct Ledger {
        entries: u32,
    }

    impl NativeObject for Ledger {
        const NAME: &'static str = "Ledger";
    }

    crate::__impl_object_shapes!(Ledger);

    fn returned<T: AdaptReturn>(value: T) -> HostValue {
        match wrap_return(value) {
            Ok(host) => host,
            Err(err) => panic!("wrap failed: {err}"),
        }
    }

    #[test]
    fn objects_pass_through() {
        assert_eq!(<Ledger as Classify>::CATEGORY, Category::Passthrough);
        assert_eq!(<&Ledger as Classify>::CATEGORY, Category::Passthrough);
    }

    #[test]
    fn returned_objects_are_borrowed_back() {
        let mut host = returned(Ledger { entries: 3 });
        assert_eq!(host.as_object().map(HostObject::type_name), Some("Ledger"));
        let ledger = <&Ledger>::from_host(&mut host, &Conversion::STRICT);
        assert_eq!(ledger.ok(), Some(&Ledger { entries: 3 }));
    }

    #[test]
    fn wrong_objects_rejected() {
        assert!(matches!(
            object_ref::<Ledger>(&HostValue::None),
            Err(ConversionError::NullHandle { target_type: "Ledger" })
        ));
        assert!(matches!(
            object_ref::<Ledger>(&HostValue::object("Other", 1_u8)),
            Err(ConversionError::RecordMismatch { .. })
        ));
        assert!(matches!(
            object_ref::<Ledger>(&HostValue::Int(1)),
            Err(ConversionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn object_lists_are_returned_in_order() {
        let host = returned(vec![Ledger { entries: 1 }, Ledger { entries: 2 }]);
        let entries: Vec<u32> = host
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.downcast_ref::<Ledger>())
            .map(|l| l.entries)
            .collect();
        assert_eq!(entries, vec![1, 2]);
    }
}

//! Boundary forms of parameters and returns.
//!
//! The `adapt!` macro turns each parameter of a native callable into a
//! two-step crossing: the host slot is converted into the parameter's
//! [`AdaptParam::Boundary`] form (a [`Wrapped`] record, a container of them,
//! or the passthrough value itself), then unwrapped into the type the
//! callable declared. Returns go the other way through [`AdaptReturn`].
//!
//! A shape that cannot be made lifetime-safe has no implementation, so an
//! adapted signature that uses one does not compile.

use std::any::Any;
use std::error::Error as StdError;

use crate::category::Classify;
use crate::convert::{Conversion, FromHost, IntoHost};
use crate::error::{ConversionError, NativeError};
use crate::host::HostValue;
use crate::ownership::{OwnershipKind, ValueKind};
use crate::record::Record;
use crate::wrapped::Wrapped;

/// A type that may appear as a parameter of an adapted callable.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot cross the boundary as a parameter",
    label = "not boundary-safe as a parameter",
    note = "mutable borrows of records are never adapted; take `&R`, or build a `Wrapped<_, MutableKind>` by hand",
    note = "containers own their elements, so they cannot hold borrowed records"
)]
pub trait AdaptParam<'w>: Sized {
    /// The form the host argument is converted into first.
    type Boundary: FromHost<'w>;

    fn unwrap(boundary: &'w mut Self::Boundary) -> Result<Self, ConversionError>;
}

/// A type that may be returned by an adapted callable.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be returned across the boundary",
    label = "not boundary-safe as a return type",
    note = "a borrow cannot outlive the call; return records by value or in a `Box`"
)]
pub trait AdaptReturn {
    type Boundary: IntoHost;

    fn wrap(self) -> Result<Self::Boundary, NativeError>;
}

/// A type that may sit inside a container crossing the boundary. Only owned
/// records and passthrough types qualify.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be an element of a container crossing the boundary",
    label = "borrowed element",
    note = "containers own their elements; use records by value"
)]
pub trait ContainerElement {}

// ============================================================================
// Expansion helpers
// ============================================================================

/// Convert a host argument into the boundary form of parameter type `T`.
#[inline]
pub fn boundary<'w, T: AdaptParam<'w>>(
    slot: &'w mut HostValue,
    cx: &Conversion<'_>,
) -> Result<T::Boundary, ConversionError> {
    T::Boundary::from_host(slot, cx)
}

/// Unwrap a boundary form into parameter type `T`.
#[inline]
pub fn unwrap_arg<'w, T: AdaptParam<'w>>(boundary: &'w mut T::Boundary) -> Result<T, ConversionError> {
    T::unwrap(boundary)
}

/// Wrap a native return value and hand it to the host.
#[inline]
pub fn wrap_return<T: AdaptReturn>(value: T) -> Result<HostValue, NativeError> {
    value.wrap().map(IntoHost::into_host)
}

/// Post-monomorphization check that a parameter's category is adaptable.
#[doc(hidden)]
pub fn assert_param<T: Classify + ?Sized>() {
    const {
        assert!(
            T::CATEGORY.is_adaptable(),
            "parameter cannot cross the boundary: mutable record borrows and containers of borrows are rejected"
        )
    }
}

/// Post-monomorphization check that a return's category is `Value` or
/// passthrough.
#[doc(hidden)]
pub fn assert_return<T: Classify + ?Sized>() {
    const {
        assert!(
            T::CATEGORY.is_returnable(),
            "return type cannot cross the boundary: borrows cannot outlive the call"
        )
    }
}

fn receiver_error(slot: &HostValue) -> NativeError {
    match slot {
        HostValue::None => NativeError::invalid_this("receiver is null"),
        other => NativeError::invalid_this(format!("receiver is {}, not an object", other.type_name())),
    }
}

/// Borrow the method receiver held in `slot`.
pub fn receiver_ref<T: Any>(slot: &HostValue) -> Result<&T, NativeError> {
    let HostValue::Object(object) = slot else {
        return Err(receiver_error(slot));
    };
    object
        .downcast_ref::<T>()
        .ok_or_else(|| NativeError::ThisTypeMismatch {
            expected: std::any::type_name::<T>(),
            actual: object.type_name().to_owned(),
        })
}

/// Borrow the method receiver held in `slot` exclusively.
pub fn receiver_mut<T: Any>(slot: &mut HostValue) -> Result<&mut T, NativeError> {
    match &*slot {
        HostValue::Object(object) if !object.is::<T>() => {
            return Err(NativeError::ThisTypeMismatch {
                expected: std::any::type_name::<T>(),
                actual: object.type_name().to_owned(),
            });
        }
        HostValue::Object(_) => {}
        other => return Err(receiver_error(other)),
    }
    slot.as_object_mut()
        .and_then(|object| object.downcast_mut::<T>())
        .ok_or_else(|| NativeError::invalid_this("receiver changed type"))
}

// ============================================================================
// Passthrough types
// ============================================================================

macro_rules! impl_passthrough_adapt {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'w> AdaptParam<'w> for $ty {
                type Boundary = $ty;

                fn unwrap(boundary: &'w mut Self::Boundary) -> Result<Self, ConversionError> {
                    Ok(std::mem::take(boundary))
                }
            }

            impl AdaptReturn for $ty {
                type Boundary = $ty;

                fn wrap(self) -> Result<Self::Boundary, NativeError> {
                    Ok(self)
                }
            }

            impl ContainerElement for $ty {}
        )*
    };
}

impl_passthrough_adapt!(bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, String);

impl<'w> AdaptParam<'w> for &'w str {
    type Boundary = &'w str;

    fn unwrap(boundary: &'w mut Self::Boundary) -> Result<Self, ConversionError> {
        Ok(*boundary)
    }
}

impl ContainerElement for &str {}

impl AdaptReturn for () {
    type Boundary = ();

    fn wrap(self) -> Result<Self::Boundary, NativeError> {
        Ok(())
    }
}

impl AdaptReturn for HostValue {
    type Boundary = HostValue;

    fn wrap(self) -> Result<Self::Boundary, NativeError> {
        Ok(self)
    }
}

// ============================================================================
// Containers
// ============================================================================

impl<'w, T> AdaptParam<'w> for Vec<T>
where
    T: AdaptParam<'w> + ContainerElement,
{
    type Boundary = Vec<T::Boundary>;

    fn unwrap(boundary: &'w mut Self::Boundary) -> Result<Self, ConversionError> {
        boundary.iter_mut().map(T::unwrap).collect()
    }
}

impl<T: AdaptReturn + ContainerElement> AdaptReturn for Vec<T> {
    type Boundary = Vec<T::Boundary>;

    fn wrap(self) -> Result<Self::Boundary, NativeError> {
        self.into_iter().map(T::wrap).collect()
    }
}

impl<T: ContainerElement> ContainerElement for Vec<T> {}

/// Records by slice: the host list is copied once into owned records the
/// slice borrows from.
impl<'w, R> AdaptParam<'w> for &'w [R]
where
    R: Record + FromHost<'w>,
{
    type Boundary = Vec<R>;

    fn unwrap(boundary: &'w mut Self::Boundary) -> Result<Self, ConversionError> {
        Ok(boundary.as_slice())
    }
}

/// Absence passes through; a present value adapts as `T` would.
impl<'w, T: AdaptParam<'w>> AdaptParam<'w> for Option<T> {
    type Boundary = Option<T::Boundary>;

    fn unwrap(boundary: &'w mut Self::Boundary) -> Result<Self, ConversionError> {
        match boundary {
            Some(inner) => T::unwrap(inner).map(Some),
            None => Ok(None),
        }
    }
}

impl<T: AdaptReturn> AdaptReturn for Option<T> {
    type Boundary = Option<T::Boundary>;

    fn wrap(self) -> Result<Self::Boundary, NativeError> {
        self.map(T::wrap).transpose()
    }
}

impl<T: ContainerElement> ContainerElement for Option<T> {}

/// Only the success payload is adapted; the error is surfaced as
/// [`NativeError::Raised`]. Error types keep their identity for
/// [`NativeError::raised`]; a `String` or `&str` error keeps its message.
impl<T, E> AdaptReturn for Result<T, E>
where
    T: AdaptReturn,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    type Boundary = T::Boundary;

    fn wrap(self) -> Result<Self::Boundary, NativeError> {
        match self {
            Ok(value) => value.wrap(),
            Err(err) => Err(NativeError::Raised(err.into())),
        }
    }
}

// ============================================================================
// Hand-built wrappers
// ============================================================================

impl<'w, R, K> AdaptParam<'w> for Wrapped<'w, R, K>
where
    R: Record,
    K: OwnershipKind,
    Wrapped<'w, R, K>: FromHost<'w>,
{
    type Boundary = Wrapped<'w, R, K>;

    fn unwrap(boundary: &'w mut Self::Boundary) -> Result<Self, ConversionError> {
        Ok(boundary.vacate())
    }
}

impl<R: Record> AdaptReturn for Wrapped<'_, R, ValueKind> {
    type Boundary = Self;

    fn wrap(self) -> Result<Self::Boundary, NativeError> {
        Ok(self)
    }
}

impl<R: Record> ContainerElement for Wrapped<'_, R, ValueKind> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::DynamicRecord;
    use crate::host::HostObject;
    use crate::ownership::ConstKind;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("out of stock")]
    struct OutOfStock;

    struct Counter {
        hits: u32,
    }

    fn cross<'w, T: AdaptParam<'w>>(
        slot: &'w mut HostValue,
        boundary_slot: &'w mut Option<T::Boundary>,
    ) -> Result<T, ConversionError> {
        let converted = boundary::<T>(slot, &Conversion::STRICT)?;
        let stored = boundary_slot.insert(converted);
        unwrap_arg::<T>(stored)
    }

    #[test]
    fn scalar_params_pass_through() {
        let mut slot = HostValue::Int(12);
        let mut held = None;
        assert_eq!(cross::<u16>(&mut slot, &mut held).ok(), Some(12));
    }

    #[test]
    fn str_params_borrow_from_slot() {
        let mut slot = HostValue::from("borrowed");
        let mut held = None;
        assert_eq!(cross::<&str>(&mut slot, &mut held).ok(), Some("borrowed"));
    }

    #[test]
    fn vec_params_keep_order() {
        let mut slot = HostValue::List(vec![3.into(), 1.into(), 2.into()]);
        let mut held = None;
        assert_eq!(cross::<Vec<i64>>(&mut slot, &mut held).ok(), Some(vec![3, 1, 2]));
    }

    #[test]
    fn const_ref_record_borrows_host_object() {
        let mut slot = HostValue::Object(HostObject::record(DynamicRecord::default()));
        let address = slot.downcast_ref::<DynamicRecord>().map(|r| r as *const DynamicRecord);
        let mut held = None;
        let borrowed = cross::<&DynamicRecord>(&mut slot, &mut held);
        assert_eq!(borrowed.ok().map(|r| r as *const DynamicRecord), address);
    }

    #[test]
    fn const_ref_record_rejects_null() {
        let mut slot = HostValue::None;
        let mut held = None;
        assert!(matches!(
            cross::<&DynamicRecord>(&mut slot, &mut held),
            Err(ConversionError::NullHandle { .. })
        ));
    }

    #[test]
    fn nullable_const_ref_accepts_null() {
        let mut slot = HostValue::None;
        let mut held = None;
        assert!(matches!(cross::<Option<&DynamicRecord>>(&mut slot, &mut held), Ok(None)));
    }

    #[test]
    fn manual_wrapper_params_keep_empty_state() {
        let mut slot = HostValue::None;
        let mut held = None;
        let wrapped = cross::<Wrapped<'_, DynamicRecord, ConstKind>>(&mut slot, &mut held);
        assert!(wrapped.is_ok_and(|w| w.is_empty()));
    }

    #[test]
    fn result_errors_are_raised_unchanged() {
        let failed: Result<i32, OutOfStock> = Err(OutOfStock);
        let err = wrap_return(failed).err();
        assert!(err.as_ref().and_then(NativeError::raised::<OutOfStock>).is_some());

        let ok: Result<i32, OutOfStock> = Ok(4);
        assert_eq!(wrap_return(ok).ok().and_then(|v| v.as_int()), Some(4));
    }

    #[test]
    fn record_returns_become_objects() {
        let value = wrap_return(DynamicRecord::default());
        assert!(value.is_ok_and(|v| v.downcast_ref::<DynamicRecord>().is_some()));
    }

    #[test]
    fn empty_option_return_is_none() {
        let value = wrap_return(None::<DynamicRecord>);
        assert!(value.is_ok_and(|v| v.is_none()));
    }

    #[test]
    fn receivers() {
        let mut slot = HostValue::object("Counter", Counter { hits: 1 });
        if let Ok(counter) = receiver_mut::<Counter>(&mut slot) {
            counter.hits += 1;
        }
        assert_eq!(receiver_ref::<Counter>(&slot).ok().map(|c| c.hits), Some(2));
        assert!(matches!(
            receiver_ref::<String>(&slot),
            Err(NativeError::ThisTypeMismatch { actual, .. }) if actual == "Counter"
        ));
        assert!(matches!(
            receiver_ref::<Counter>(&HostValue::None),
            Err(NativeError::InvalidThis { .. })
        ));
        assert!(matches!(
            receiver_mut::<String>(&mut slot),
            Err(NativeError::ThisTypeMismatch { actual, .. }) if actual == "Counter"
        ));
        assert!(matches!(
            receiver_mut::<Counter>(&mut HostValue::Int(1)),
            Err(NativeError::InvalidThis { .. })
        ));
    }
}

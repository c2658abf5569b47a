//! Records tagged with their ownership category.
//!
//! A [`Wrapped`] is built in exactly two places: when an adapted call
//! converts a host argument into a parameter, and when a record return value
//! is handed back to the host. Borrowing wrappers carry the lifetime of the
//! call that produced them, so they cannot be stored past it.
//!
//! # Examples
//!
//! ```
//! use msgbridge_core::{ConstKind, Ownership, ValueKind, Wrapped};
//!
//! let owned = Wrapped::<_, ValueKind>::new(String::from("payload"));
//! assert_eq!(owned.ownership(), Ownership::Value);
//! assert_eq!(owned.extract(), "payload");
//!
//! let original = 7_i32;
//! let borrowed = Wrapped::<_, ConstKind>::new(&original);
//! assert!(std::ptr::eq(borrowed.get().unwrap(), &original));
//!
//! let null = Wrapped::<i32, ConstKind>::from_ptr(None);
//! assert!(null.is_empty());
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::convert::{Conversion, FromHost, IntoHost};
use crate::error::ConversionError;
use crate::host::{HostObject, HostValue};
use crate::ownership::{ConstKind, MutableKind, Ownership, OwnershipKind, ValueKind};
use crate::record::{Record, record_from_host};

enum Slot<'a, R> {
    Owned(R),
    Borrowed(&'a R),
    BorrowedMut(&'a mut R),
    Empty,
}

/// A record crossing the boundary under ownership category `K`.
pub struct Wrapped<'a, R, K: OwnershipKind> {
    slot: Slot<'a, R>,
    _kind: PhantomData<K>,
}

impl<'a, R, K: OwnershipKind> Wrapped<'a, R, K> {
    fn from_slot(slot: Slot<'a, R>) -> Self {
        Self {
            slot,
            _kind: PhantomData,
        }
    }

    /// The ownership category, fixed by `K`.
    pub fn ownership(&self) -> Ownership {
        K::OWNERSHIP
    }

    /// True for a borrow built from a null source, or a value already
    /// extracted. An empty wrapper must not be read.
    pub fn is_empty(&self) -> bool {
        matches!(self.slot, Slot::Empty)
    }

    /// The wrapped record, or `None` when empty.
    pub fn get(&self) -> Option<&R> {
        match &self.slot {
            Slot::Owned(record) => Some(record),
            Slot::Borrowed(record) => Some(*record),
            Slot::BorrowedMut(record) => Some(&**record),
            Slot::Empty => None,
        }
    }

    /// Move the wrapper out, leaving an empty one behind.
    #[doc(hidden)]
    pub fn vacate(&mut self) -> Self {
        Self::from_slot(std::mem::replace(&mut self.slot, Slot::Empty))
    }

    fn get_mut_inner(&mut self) -> Option<&mut R> {
        match &mut self.slot {
            Slot::Owned(record) => Some(record),
            Slot::BorrowedMut(record) => Some(&mut **record),
            Slot::Borrowed(_) | Slot::Empty => None,
        }
    }
}

impl<'a, R> Wrapped<'a, R, ValueKind> {
    /// Take ownership of a record. Never fails.
    pub fn new(record: R) -> Self {
        Self::from_slot(Slot::Owned(record))
    }

    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.get_mut_inner()
    }

    /// Move the record out, consuming the wrapper.
    pub fn extract(mut self) -> R
    where
        R: Default,
    {
        self.take()
    }

    /// Move the record out in place. Taking twice is a caller bug: it asserts
    /// in debug builds and yields a default record otherwise.
    pub fn take(&mut self) -> R
    where
        R: Default,
    {
        match std::mem::replace(&mut self.slot, Slot::Empty) {
            Slot::Owned(record) => record,
            _ => {
                debug_assert!(false, "record taken twice from a Value wrapper");
                R::default()
            }
        }
    }
}

impl<'a, R> Wrapped<'a, R, ConstKind> {
    /// Borrow a record read-only.
    pub fn new(record: &'a R) -> Self {
        Self::from_slot(Slot::Borrowed(record))
    }

    /// Borrow from a nullable source; `None` gives an empty wrapper.
    pub fn from_ptr(record: Option<&'a R>) -> Self {
        Self::from_slot(record.map_or(Slot::Empty, Slot::Borrowed))
    }

    /// A read-only view of a temporary copy. Used when the host's record is
    /// not backed by a native instance.
    pub(crate) fn temporary(record: R) -> Self {
        Self::from_slot(Slot::Owned(record))
    }
}

impl<'a, R> Wrapped<'a, R, MutableKind> {
    /// Borrow a record exclusively.
    pub fn new(record: &'a mut R) -> Self {
        Self::from_slot(Slot::BorrowedMut(record))
    }

    /// Borrow from a nullable source; `None` gives an empty wrapper.
    pub fn from_ptr(record: Option<&'a mut R>) -> Self {
        Self::from_slot(record.map_or(Slot::Empty, Slot::BorrowedMut))
    }

    pub fn get_mut(&mut self) -> Option<&mut R> {
        self.get_mut_inner()
    }

    /// Mutations of a temporary are not written back to the host.
    pub(crate) fn temporary(record: R) -> Self {
        Self::from_slot(Slot::Owned(record))
    }
}

impl<R: fmt::Debug, K: OwnershipKind> fmt::Debug for Wrapped<'_, R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("ownership", &K::OWNERSHIP)
            .field("record", &self.get())
            .finish()
    }
}

// ============================================================================
// Host conversion
// ============================================================================

fn holds_native<R: Record>(value: &HostValue) -> bool {
    matches!(value, HostValue::Object(object) if object.is::<R>())
}

impl<'w, R: Record> FromHost<'w> for Wrapped<'w, R, ValueKind> {
    fn from_host(value: &'w mut HostValue, cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        record_from_host::<R>(value, cx).map(Wrapped::<R, ValueKind>::new)
    }
}

impl<'w, R: Record> FromHost<'w> for Wrapped<'w, R, ConstKind> {
    fn from_host(value: &'w mut HostValue, cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        if value.is_none() {
            return Ok(Wrapped::<R, ConstKind>::from_ptr(None));
        }
        // decided before borrowing for 'w, so the fallback keeps `value`
        if !holds_native::<R>(value) {
            return record_from_host::<R>(value, cx).map(Wrapped::<R, ConstKind>::temporary);
        }
        let value: &'w HostValue = value;
        Ok(Wrapped::<R, ConstKind>::from_ptr(value.downcast_ref::<R>()))
    }
}

impl<'w, R: Record> FromHost<'w> for Wrapped<'w, R, MutableKind> {
    fn from_host(value: &'w mut HostValue, cx: &Conversion<'_>) -> Result<Self, ConversionError> {
        if value.is_none() {
            return Ok(Wrapped::<R, MutableKind>::from_ptr(None));
        }
        if !holds_native::<R>(value) {
            return record_from_host::<R>(value, cx).map(Wrapped::<R, MutableKind>::temporary);
        }
        Ok(Wrapped::<R, MutableKind>::from_ptr(
            value.as_object_mut().and_then(|object| object.downcast_mut::<R>()),
        ))
    }
}

/// Owned records go back to the host by move.
impl<R: Record> IntoHost for Wrapped<'_, R, ValueKind> {
    fn into_host(self) -> HostValue {
        match self.slot {
            Slot::Owned(record) => HostValue::Object(HostObject::record(record)),
            _ => HostValue::None,
        }
    }
}

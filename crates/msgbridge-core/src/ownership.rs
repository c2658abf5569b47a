//! Ownership categories of a record crossing the boundary.
//!
//! [`Ownership`] is the runtime tag; the marker kinds carry the same tag at
//! the type level so a [`Wrapped`](crate::wrapped::Wrapped) fixes its
//! category when it is declared, never at runtime.

use std::fmt;

/// How a record crossing the boundary is owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// The boundary owns an independent copy
    Value,
    /// Temporary read-only access; the native side keeps ownership
    ConstRef,
    /// Temporary exclusive access; the native side keeps ownership
    MutableRef,
}

impl Ownership {
    pub const fn is_borrow(self) -> bool {
        matches!(self, Ownership::ConstRef | Ownership::MutableRef)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ownership::Value => "value",
            Ownership::ConstRef => "const ref",
            Ownership::MutableRef => "mutable ref",
        })
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Type-level ownership tag. Implemented only by the three marker kinds.
pub trait OwnershipKind: sealed::Sealed + Send + Sync + 'static {
    const OWNERSHIP: Ownership;
}

/// Marker for [`Ownership::Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {}

/// Marker for [`Ownership::ConstRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {}

/// Marker for [`Ownership::MutableRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutableKind {}

impl sealed::Sealed for ValueKind {}
impl sealed::Sealed for ConstKind {}
impl sealed::Sealed for MutableKind {}

impl OwnershipKind for ValueKind {
    const OWNERSHIP: Ownership = Ownership::Value;
}

impl OwnershipKind for ConstKind {
    const OWNERSHIP: Ownership = Ownership::ConstRef;
}

impl OwnershipKind for MutableKind {
    const OWNERSHIP: Ownership = Ownership::MutableRef;
}

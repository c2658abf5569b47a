//! Deterministic hash-based identity for record types, enums and functions.
//!
//! Descriptor pools and module function tables are keyed by [`TypeHash`]
//! rather than by `String`, so a lookup is a single map probe on a `u64`.
//!
//! # Examples
//!
//! ```
//! use msgbridge_core::TypeHash;
//!
//! let a = TypeHash::from_name("bridge.test.IntMessage");
//! let b = TypeHash::from_name("bridge.test.IntMessage");
//! assert_eq!(a, b);
//! assert_ne!(a, TypeHash::from_function("bridge.test.IntMessage"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
///
/// A record type and a function sharing a name must not collide.
pub mod hash_constants {
    /// Domain marker for record and enum type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for function hashes
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for method hashes
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;
}

/// A deterministic 64-bit hash identifying a type or function name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a fully-qualified record or enum name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a function hash from the name it is registered under.
    ///
    /// Overloads share a name and therefore a hash; they are told apart by
    /// registration order, not by identity.
    #[inline]
    pub fn from_function(name: &str) -> Self {
        TypeHash(hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a method hash from the receiver type name and method name.
    #[inline]
    pub fn from_method(owner: &str, name: &str) -> Self {
        let owner_hash = xxh64(owner.as_bytes(), 0);
        TypeHash(hash_constants::METHOD ^ owner_hash.rotate_left(17) ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

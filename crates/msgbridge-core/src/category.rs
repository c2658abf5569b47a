//! Category inference for parameter and return types.
//!
//! Every type that can appear in an adapted signature has exactly one
//! [`Category`], resolved per type at compile time through [`Classify`].
//!
//! | shape                     | category                          |
//! |---------------------------|-----------------------------------|
//! | `R`, `Box<R>`, `Arc<R>`   | `Value`                           |
//! | `&R`, `Option<&R>`        | `ConstRef`                        |
//! | `&mut R`, `Option<&mut R>`| `NotAdaptable`                    |
//! | `Vec<T>`, `&[T]`, `Result<T, E>` | `T`'s category if `Value`/`Passthrough`, else `NotAdaptable` |
//! | `Option<T>`               | `T`'s category                    |
//! | `Wrapped<R, K>`           | `K`'s tag                         |
//! | scalars, strings, enums, native objects | `Passthrough`       |
//!
//! Record shapes get their impls from `#[derive(Record)]`.

use std::fmt;

use crate::host::HostValue;
use crate::ownership::{Ownership, OwnershipKind};
use crate::wrapped::Wrapped;

/// Outcome of classifying one parameter or return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Value,
    ConstRef,
    MutableRef,
    /// A record shape the boundary cannot make lifetime-safe
    NotAdaptable,
    /// Not a record; crosses through the scalar bridge unchanged
    Passthrough,
}

impl Category {
    pub const fn from_ownership(ownership: Ownership) -> Category {
        match ownership {
            Ownership::Value => Category::Value,
            Ownership::ConstRef => Category::ConstRef,
            Ownership::MutableRef => Category::MutableRef,
        }
    }

    /// Ownership tag of a record crossing; `None` for passthrough and
    /// rejected shapes.
    pub const fn ownership(self) -> Option<Ownership> {
        match self {
            Category::Value => Some(Ownership::Value),
            Category::ConstRef => Some(Ownership::ConstRef),
            Category::MutableRef => Some(Ownership::MutableRef),
            Category::NotAdaptable | Category::Passthrough => None,
        }
    }

    pub const fn is_adaptable(self) -> bool {
        !matches!(self, Category::NotAdaptable)
    }

    /// Only owned values and passthrough types may be returned.
    pub const fn is_returnable(self) -> bool {
        matches!(self, Category::Value | Category::Passthrough)
    }

    /// Category of a container whose elements have this category.
    /// Containers own their elements, so borrows are rejected.
    pub const fn in_container(self) -> Category {
        match self {
            Category::Value => Category::Value,
            Category::Passthrough => Category::Passthrough,
            _ => Category::NotAdaptable,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Value => "value",
            Category::ConstRef => "const ref",
            Category::MutableRef => "mutable ref",
            Category::NotAdaptable => "not adaptable",
            Category::Passthrough => "passthrough",
        })
    }
}

/// Static category of a type.
pub trait Classify {
    const CATEGORY: Category;
}

macro_rules! impl_passthrough {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Classify for $ty {
                const CATEGORY: Category = Category::Passthrough;
            }
        )*
    };
}

impl_passthrough!(
    (),
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    HostValue,
);

impl Classify for &str {
    const CATEGORY: Category = Category::Passthrough;
}

impl<T: Classify> Classify for Vec<T> {
    const CATEGORY: Category = T::CATEGORY.in_container();
}

impl<T: Classify> Classify for &[T] {
    const CATEGORY: Category = T::CATEGORY.in_container();
}

/// `Option<&R>` is the nullable const pointer, so the element category is
/// kept as is rather than passed through `in_container`.
impl<T: Classify> Classify for Option<T> {
    const CATEGORY: Category = T::CATEGORY;
}

impl<T: Classify, E> Classify for Result<T, E> {
    const CATEGORY: Category = T::CATEGORY.in_container();
}

impl<R, K: OwnershipKind> Classify for Wrapped<'_, R, K> {
    const CATEGORY: Category = Category::from_ownership(K::OWNERSHIP);
}

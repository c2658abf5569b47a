//! msgbridge - ownership-aware marshaling of structured records between a
//! host runtime and native Rust functions.
//!
//! Every record crossing the boundary is tagged with an ownership category:
//! it is either handed over by value, lent read-only, or lent mutably. The
//! category of each parameter and return type of an adapted function is
//! inferred from its Rust type, and signatures whose lifetimes cannot be
//! made safe are rejected when the crate using them is compiled.
//!
//! # Example
//!
//! ```
//! use msgbridge::{adapt, HostRecord, HostValue, Module, Record};
//!
//! #[derive(Debug, Clone, Default, Record)]
//! #[record(name = "shop.Item")]
//! pub struct Item {
//!     pub sku: String,
//!     pub count: u32,
//! }
//!
//! let mut module = Module::new("shop");
//! module
//!     .function("restock", adapt!(|item: &Item, extra: u32| -> Item {
//!         Item { count: item.count + extra, ..item.clone() }
//!     }))
//!     .unwrap();
//!
//! let item = HostRecord::new("shop.Item").with("sku", "A-1").with("count", 2);
//! let result = module
//!     .call("restock", vec![HostValue::Record(item), HostValue::Int(3)])
//!     .unwrap();
//! assert_eq!(result.downcast_ref::<Item>().map(|item| item.count), Some(5));
//! ```
//!
//! # Rejected signatures
//!
//! These shapes have no boundary implementation, so `adapt!` fails to
//! compile with a diagnostic naming the offending type:
//!
//! - `&mut R` and `Option<&mut R>` parameters. A mutable borrow is never
//!   inferred; take one through an explicit [`Wrapped`] parameter with
//!   [`MutableKind`].
//! - `&R` returns, which would outlive the call.
//! - Containers of borrows such as `Vec<&R>`. Containers own their elements.
//! - Returned wrappers other than `Wrapped<_, ValueKind>`.
//!
//! `tests/compile_fail` pins the diagnostic for each of them.

pub use msgbridge_core::*;
pub use msgbridge_macros::{NativeObject, Record, RecordEnum, adapt};

#[doc(hidden)]
pub use msgbridge_core::{__impl_enum_shapes, __impl_object_shapes, __impl_record_shapes};

/// The `num_enum` release `#[derive(RecordEnum)]` builds on.
pub use num_enum;

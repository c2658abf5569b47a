//! msgbridge Proc Macros
//!
//! This crate provides the procedural macros of the msgbridge boundary layer.
//!
//! # Macros
//!
//! - `#[derive(Record)]` - Make a struct a record that can cross the boundary
//! - `#[derive(RecordEnum)]` - Enum translation, on top of `num_enum`
//! - `#[derive(NativeObject)]` - Opaque native objects held by the host
//! - `adapt!` - Adapt a native callable into a `NativeFn`
//!
//! # Example
//!
//! ```ignore
//! use msgbridge::{adapt, Record};
//!
//! #[derive(Debug, Clone, Default, Record)]
//! #[record(name = "shop.Item")]
//! pub struct Item {
//!     pub sku: String,
//!     #[record(number = 4)]
//!     pub count: u32,
//! }
//!
//! let restock = adapt!(|item: &Item, extra: u32| -> Item {
//!     Item { count: item.count + extra, ..item.clone() }
//! });
//! ```

use proc_macro::TokenStream;

mod adapt;
mod attrs;
mod derive_enum;
mod derive_object;
mod derive_record;

/// Derive the record traits for a struct with named fields.
///
/// Generates `Reflect`, `Record` and `FieldType`, plus the boundary shapes of
/// `R`, `&R`, `Box<R>` and `Arc<R>`. The struct must also implement `Clone` and
/// `Default`, and every field type must implement `FieldType`.
///
/// # Attributes
///
/// - `#[record(name = "...")]` - Full record name (default: struct name)
///
/// # Field Attributes
///
/// - `#[record(name = "...")]` - Override field name
/// - `#[record(number = N)]` - Field number (default: previous + 1)
/// - `#[record(skip)]` - Leave the field out of the schema
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    derive_record::derive_record_impl(input)
}

/// Derive `RecordEnum` for an enum.
///
/// Requires `num_enum::FromPrimitive` and `num_enum::IntoPrimitive` on the
/// same enum; give it a `#[num_enum(catch_all)]` variant so unknown values
/// survive a round trip.
///
/// # Attributes
///
/// - `#[record_enum(name = "...")]` - Full enum name (default: enum name)
/// - `#[record_enum(translate = false)]` - Opt out of integer translation;
///   the enum then crosses as an opaque object
///
/// # Variant Attributes
///
/// - `#[record_enum(name = "...")]` - Override enumerator name
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, IntoPrimitive, RecordEnum)]
/// #[repr(i32)]
/// #[record_enum(name = "shop.Status")]
/// pub enum Status {
///     #[record_enum(name = "ACTIVE")]
///     Active = 0,
///     #[record_enum(name = "RETIRED")]
///     Retired = 1,
///     #[num_enum(catch_all)]
///     Unknown(i32),
/// }
/// ```
#[proc_macro_derive(RecordEnum, attributes(record_enum))]
pub fn derive_record_enum(input: TokenStream) -> TokenStream {
    derive_enum::derive_record_enum_impl(input)
}

/// Derive `NativeObject` for a type the host holds by handle.
///
/// # Attributes
///
/// - `#[native_object(name = "...")]` - Host type name (default: type name)
#[proc_macro_derive(NativeObject, attributes(native_object))]
pub fn derive_native_object(input: TokenStream) -> TokenStream {
    derive_object::derive_native_object_impl(input)
}

/// Adapt a native callable into a `NativeFn`.
///
/// Every parameter and the return type are classified at compile time.
/// Record parameters cross as `Value` (`R`, `Box<R>`, `Vec<R>`, `&[R]`) or
/// `ConstRef` (`&R`, `Option<&R>`); scalars, strings, enums and native
/// objects pass through. A signature with a mutable record borrow, a
/// container of borrows, or a borrowed return does not compile.
///
/// A returned `Result<T, E>` adapts `T`; the error is raised as
/// `NativeError::Raised` for any `E` that converts into
/// `Box<dyn Error + Send + Sync>`, which covers error types, `String` and
/// `&'static str`. An `Arc<R>` return is cloned out unless it holds the last
/// handle.
///
/// # Forms
///
/// ```ignore
/// // closures, optionally `move`; the return type defaults to `()`
/// adapt!(|item: &Item, extra: u32| -> Item { ... })
///
/// // any callable with an explicit signature
/// adapt!(restock as fn(&Item, u32) -> Item)
///
/// // methods; the receiver is the native object the method is called on
/// adapt!(method Inventory::add as fn(&mut Inventory, Item) -> usize)
/// ```
#[proc_macro]
pub fn adapt(input: TokenStream) -> TokenStream {
    adapt::adapt_impl(input)
}

//! Core types for the msgbridge host/native boundary.
//!
//! This crate contains everything needed to move structured records between
//! a host runtime and native Rust code with an explicit ownership category:
//!
//! - [`Ownership`] and [`Wrapped`] - records tagged as owned, borrowed, or
//!   mutably borrowed
//! - [`Category`] and [`Classify`] - compile-time classification of parameter
//!   and return types
//! - [`AdaptParam`] / [`AdaptReturn`] - the boundary forms the `adapt!` macro
//!   builds on; unsafe shapes have no implementation and fail to compile
//! - [`EnumTranslator`] - integer translation of enums, with a per-type
//!   opt-out
//! - [`DescriptorPool`], [`DynamicRecord`] - runtime schemas and records
//! - [`Module`] - registration and overload dispatch
//!
//! Most users depend on the `msgbridge` facade crate, which re-exports this
//! crate together with the derive macros.

pub mod adapt;
pub mod category;
pub mod convert;
pub mod descriptor;
pub mod dynamic;
pub mod enums;
pub mod error;
pub mod host;
pub mod module;
pub mod native_fn;
pub mod object;
pub mod ownership;
pub mod record;
pub mod reflect;
pub mod type_hash;
pub mod wrapped;

pub use adapt::{AdaptParam, AdaptReturn, ContainerElement};
pub use category::{Category, Classify};
pub use convert::{Conversion, FromHost, IntoHost};
pub use descriptor::{DescriptorPool, EnumDescriptor, FieldDescriptor, FieldKind, Label, RecordDescriptor};
pub use dynamic::{DynamicRecord, RecordFactory};
pub use enums::{EnumTranslator, RecordEnum};
pub use error::{CallError, ConversionError, NativeError, PoolError, ReflectError};
pub use host::{HostObject, HostRecord, HostValue};
pub use module::{Module, ModuleConfig};
pub use native_fn::{CallContext, NativeCallable, NativeFn, ParamInfo, Signature};
pub use object::NativeObject;
pub use ownership::{ConstKind, MutableKind, Ownership, OwnershipKind, ValueKind};
pub use record::Record;
pub use reflect::{FieldType, FieldValue, RecordValue, Reflect};
pub use type_hash::TypeHash;
pub use wrapped::Wrapped;

#[doc(hidden)]
pub mod __private {
    pub use lazy_static::lazy_static;
    pub use tracing;
}

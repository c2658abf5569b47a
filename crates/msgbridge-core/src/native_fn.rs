//! Native function storage and call context.
//!
//! An adapted callable is stored type-erased as a [`NativeFn`] together with
//! the [`Signature`] it was adapted from. The host calls it through a
//! [`CallContext`] holding the argument slots and the return slot.

use std::fmt;
use std::sync::Arc;

use crate::category::{Category, Classify};
use crate::convert::Conversion;
use crate::error::NativeError;
use crate::host::HostValue;
use crate::type_hash::TypeHash;

/// Type-erased native function.
///
/// The inner callable is wrapped in `Arc` so overload tables can be cloned
/// cheaply.
pub struct NativeFn {
    /// Identity assigned at registration (`TypeHash::EMPTY` until then)
    pub id: TypeHash,
    signature: Signature,
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Create a raw NativeFn. The callable does its own argument handling.
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self::adapted(Signature::default(), f)
    }

    /// Create a NativeFn from an adapted callable. Used by `adapt!`.
    pub fn adapted<F>(signature: Signature, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        tracing::debug!(%signature, "adapted native function");
        Self {
            id: TypeHash::EMPTY,
            signature,
            inner: Arc::new(f),
        }
    }

    pub fn with_id(mut self, id: TypeHash) -> Self {
        self.id = id;
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Call this native function with the given context.
    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        self.inner.call(ctx)
    }
}

impl Clone for NativeFn {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            signature: self.signature.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Trait for callable native functions.
pub trait NativeCallable {
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<(), NativeError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        (self)(ctx)
    }
}

/// Declared type and category of one parameter or return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamInfo {
    pub type_name: &'static str,
    pub category: Category,
}

impl ParamInfo {
    pub fn of<T: Classify + ?Sized>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            category: T::CATEGORY,
        }
    }
}

impl fmt::Display for ParamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.type_name, self.category)
    }
}

/// The classified signature an adapted callable was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ParamInfo>,
    pub returns: ParamInfo,
    /// Receiver type name for methods
    pub receiver: Option<&'static str>,
}

impl Signature {
    pub fn new(params: Vec<ParamInfo>, returns: ParamInfo) -> Self {
        Self {
            params,
            returns,
            receiver: None,
        }
    }

    pub fn with_receiver(mut self, receiver: &'static str) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new(Vec::new(), ParamInfo::of::<()>())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(receiver) = self.receiver {
            write!(f, "{}::", receiver)?;
        }
        f.write_str("fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") -> {}", self.returns)
    }
}

/// Context for one native call.
///
/// For methods slot 0 holds the receiver and arguments start at slot 1.
pub struct CallContext<'a> {
    slots: &'a mut [HostValue],
    arg_offset: usize,
    return_slot: &'a mut HostValue,
    conversion: Conversion<'a>,
}

impl<'a> CallContext<'a> {
    /// Context for a free function call.
    pub fn new(slots: &'a mut [HostValue], return_slot: &'a mut HostValue, conversion: Conversion<'a>) -> Self {
        Self {
            slots,
            arg_offset: 0,
            return_slot,
            conversion,
        }
    }

    /// Context for a method call; `slots[0]` is the receiver.
    pub fn method(slots: &'a mut [HostValue], return_slot: &'a mut HostValue, conversion: Conversion<'a>) -> Self {
        Self {
            slots,
            arg_offset: 1,
            return_slot,
            conversion,
        }
    }

    /// Number of arguments, excluding the receiver.
    pub fn arg_count(&self) -> usize {
        self.slots.len().saturating_sub(self.arg_offset)
    }

    pub fn check_arity(&self, expected: usize) -> Result<(), NativeError> {
        let actual = self.arg_count();
        if actual == expected && self.slots.len() >= self.arg_offset {
            Ok(())
        } else {
            Err(NativeError::ArgumentCount { expected, actual })
        }
    }

    pub fn conversion(&self) -> Conversion<'a> {
        self.conversion
    }

    pub fn args_mut(&mut self) -> &mut [HostValue] {
        let offset = self.arg_offset.min(self.slots.len());
        &mut self.slots[offset..]
    }

    /// Split the slots into the receiver and the arguments.
    pub fn receiver_and_args(&mut self) -> Result<(&mut HostValue, &mut [HostValue]), NativeError> {
        if self.arg_offset == 0 {
            return Err(NativeError::invalid_this("not a method call"));
        }
        match self.slots.split_first_mut() {
            Some((receiver, args)) => Ok((receiver, args)),
            None => Err(NativeError::invalid_this("missing receiver")),
        }
    }

    pub fn set_return(&mut self, value: HostValue) {
        *self.return_slot = value;
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("arg_count", &self.arg_count())
            .field("arg_offset", &self.arg_offset)
            .field("conversion", &self.conversion)
            .finish()
    }
}

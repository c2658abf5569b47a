//! Registration surface.
//!
//! A [`Module`] publishes adapted callables under names and dispatches host
//! calls to them.
//!
//! # Example
//!
//! ```ignore
//! use msgbridge::{adapt, Module};
//!
//! let mut module = Module::new("inventory");
//! module.function("restock", adapt!(|item: &Item, count: u32| -> Item { item.restocked(count) }))?;
//!
//! let restocked = module.call("restock", vec![item, 5.into()])?;
//! ```
//!
//! # Overloads
//!
//! Overloads registered under one name are tried in registration order,
//! first with exact host kinds only, then (if
//! [`ModuleConfig::implicit_conversion`] is set) again with implicit
//! conversions. An overload whose arguments do not convert is skipped; any
//! other failure ends the call.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::convert::Conversion;
use crate::dynamic::RecordFactory;
use crate::error::{CallError, NativeError};
use crate::host::{HostObject, HostValue};
use crate::native_fn::{CallContext, NativeFn};
use crate::type_hash::TypeHash;

/// Dispatch settings for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Retry overloads with implicit conversions when no exact match exists
    pub implicit_conversion: bool,
    /// Accept enumerator names for enum parameters during the implicit pass
    pub enum_names: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            implicit_conversion: true,
            enum_names: true,
        }
    }
}

impl ModuleConfig {
    pub fn with_implicit_conversion(mut self, enabled: bool) -> Self {
        self.implicit_conversion = enabled;
        self
    }

    pub fn with_enum_names(mut self, enabled: bool) -> Self {
        self.enum_names = enabled;
        self
    }
}

#[derive(Debug)]
struct FunctionEntry {
    name: String,
    overloads: Vec<NativeFn>,
}

/// A named collection of native functions and methods.
pub struct Module {
    name: String,
    config: ModuleConfig,
    functions: FxHashMap<TypeHash, FunctionEntry>,
    methods: FxHashMap<TypeHash, FunctionEntry>,
    factory: Option<Arc<dyn RecordFactory>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ModuleConfig::default(),
            functions: FxHashMap::default(),
            methods: FxHashMap::default(),
            factory: None,
        }
    }

    pub fn with_config(mut self, config: ModuleConfig) -> Self {
        self.config = config;
        self
    }

    /// Factory used to build dynamic record parameters from host records.
    pub fn with_factory(mut self, factory: Arc<dyn RecordFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> ModuleConfig {
        self.config
    }

    /// Register a function overload under `name`.
    pub fn function(&mut self, name: &str, f: NativeFn) -> Result<&mut Self, CallError> {
        validate_name(name)?;
        let id = TypeHash::from_function(name);
        tracing::debug!(module = %self.name, function = name, signature = %f.signature(), "registered function");
        register(&mut self.functions, id, name, f);
        Ok(self)
    }

    /// Register a method overload on native objects named `owner`.
    pub fn method(&mut self, owner: &str, name: &str, f: NativeFn) -> Result<&mut Self, CallError> {
        validate_name(owner)?;
        validate_name(name)?;
        let id = TypeHash::from_method(owner, name);
        tracing::debug!(module = %self.name, owner, method = name, signature = %f.signature(), "registered method");
        register(&mut self.methods, id, name, f);
        Ok(self)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&TypeHash::from_function(name))
    }

    /// Registered overloads of `name`, in registration order.
    pub fn overloads(&self, name: &str) -> &[NativeFn] {
        self.functions
            .get(&TypeHash::from_function(name))
            .map_or(&[], |entry| entry.overloads.as_slice())
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Call the function `name` with host arguments.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(&self, name: &str, mut args: Vec<HostValue>) -> Result<HostValue, CallError> {
        let entry = self
            .functions
            .get(&TypeHash::from_function(name))
            .ok_or_else(|| CallError::UnknownFunction {
                module: self.name.clone(),
                name: name.to_owned(),
            })?;
        self.dispatch(entry, &mut args, false)
    }

    /// Call the method `name` on `receiver`, a native object. The receiver is
    /// handed back in place once the call returns, with any mutations made
    /// through a `&mut` receiver.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call_method(
        &self,
        name: &str,
        receiver: &mut HostValue,
        args: Vec<HostValue>,
    ) -> Result<HostValue, CallError> {
        let owner = match receiver {
            HostValue::Object(object) => HostObject::type_name(object),
            other => {
                return Err(NativeError::invalid_this(format!("receiver is {}", other.type_name())).into());
            }
        };
        let entry = self
            .methods
            .get(&TypeHash::from_method(owner, name))
            .ok_or_else(|| CallError::UnknownFunction {
                module: self.name.clone(),
                name: format!("{}::{}", owner, name),
            })?;

        let mut slots = Vec::with_capacity(args.len() + 1);
        slots.push(std::mem::take(receiver));
        slots.extend(args);
        let result = self.dispatch(entry, &mut slots, true);
        if let Some(first) = slots.first_mut() {
            *receiver = std::mem::take(first);
        }
        result
    }

    fn dispatch(&self, entry: &FunctionEntry, slots: &mut [HostValue], method: bool) -> Result<HostValue, CallError> {
        let passes = std::iter::once(false).chain(self.config.implicit_conversion.then_some(true));
        let mut attempts = Vec::new();

        for convert in passes {
            attempts.clear();
            let cx = Conversion {
                convert,
                enum_names: self.config.enum_names,
                factory: self.factory.as_deref(),
            };
            for (index, overload) in entry.overloads.iter().enumerate() {
                tracing::trace!(function = %entry.name, overload = index, convert, "trying overload");
                let mut ret = HostValue::None;
                let mut ctx = if method {
                    CallContext::method(slots, &mut ret, cx)
                } else {
                    CallContext::new(slots, &mut ret, cx)
                };
                match overload.call(&mut ctx) {
                    Ok(()) => return Ok(ret),
                    Err(err) if err.is_argument_mismatch() => {
                        tracing::debug!(function = %entry.name, overload = index, convert, error = %err, "overload rejected");
                        attempts.push(err);
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        Err(CallError::NoMatchingOverload {
            name: entry.name.clone(),
            attempts,
        })
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("functions", &self.functions.len())
            .field("methods", &self.methods.len())
            .field("factory", &self.factory.is_some())
            .finish()
    }
}

fn register(table: &mut FxHashMap<TypeHash, FunctionEntry>, id: TypeHash, name: &str, f: NativeFn) {
    table
        .entry(id)
        .or_insert_with(|| FunctionEntry {
            name: name.to_owned(),
            overloads: Vec::new(),
        })
        .overloads
        .push(f.with_id(id));
}

fn validate_name(name: &str) -> Result<(), CallError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(CallError::InvalidName(name.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::FromHost;
    use crate::error::ConversionError;

    fn int_fn(tag: i64) -> NativeFn {
        NativeFn::new(move |ctx: &mut CallContext<'_>| {
            ctx.check_arity(1)?;
            let cx = ctx.conversion();
            let value = i64::from_host(&mut ctx.args_mut()[0], &cx).map_err(|e| NativeError::argument(0, e))?;
            ctx.set_return(HostValue::Int(value + tag));
            Ok(())
        })
    }

    fn float_fn() -> NativeFn {
        NativeFn::new(|ctx: &mut CallContext<'_>| {
            ctx.check_arity(1)?;
            let cx = ctx.conversion();
            let value = f64::from_host(&mut ctx.args_mut()[0], &cx).map_err(|e| NativeError::argument(0, e))?;
            ctx.set_return(HostValue::Float(value * 2.0));
            Ok(())
        })
    }

    fn failing_fn() -> NativeFn {
        NativeFn::new(|_: &mut CallContext<'_>| Err(NativeError::other("boom")))
    }

    #[test]
    fn call_registered_function() {
        let mut module = Module::new("test");
        assert!(module.function("add_one", int_fn(1)).is_ok());
        assert!(module.has_function("add_one"));
        let result = module.call("add_one", vec![HostValue::Int(1)]);
        assert_eq!(result.ok().and_then(|v| v.as_int()), Some(2));
    }

    #[test]
    fn unknown_and_invalid_names() {
        let mut module = Module::new("test");
        assert!(matches!(module.function("", int_fn(0)), Err(CallError::InvalidName(_))));
        assert!(matches!(
            module.call("missing", vec![]),
            Err(CallError::UnknownFunction { .. })
        ));
    }

    #[test]
    fn overloads_resolve_in_order_with_strict_pass_first() {
        let mut module = Module::new("test");
        assert!(module.function("scale", float_fn()).is_ok());
        assert!(module.function("scale", int_fn(100)).is_ok());
        assert_eq!(module.overloads("scale").len(), 2);

        // Int converts to f64 only in the implicit pass, so the strict pass
        // picks the second overload.
        let result = module.call("scale", vec![HostValue::Int(1)]);
        assert_eq!(result.ok().and_then(|v| v.as_int()), Some(101));

        let result = module.call("scale", vec![HostValue::Float(1.5)]);
        assert_eq!(result.ok().and_then(|v| v.as_float()), Some(3.0));
    }

    #[test]
    fn implicit_pass_can_be_disabled() {
        let mut module = Module::new("test").with_config(ModuleConfig::default().with_implicit_conversion(false));
        assert!(module.function("scale", float_fn()).is_ok());
        let result = module.call("scale", vec![HostValue::Int(1)]);
        assert!(matches!(result, Err(CallError::NoMatchingOverload { .. })));

        let mut implicit = Module::new("test");
        assert!(implicit.function("scale", float_fn()).is_ok());
        let result = implicit.call("scale", vec![HostValue::Int(1)]);
        assert_eq!(result.ok().and_then(|v| v.as_float()), Some(2.0));
    }

    #[test]
    fn no_matching_overload_lists_attempts() {
        let mut module = Module::new("test");
        assert!(module.function("f", int_fn(0)).is_ok());
        assert!(module.function("f", int_fn(1)).is_ok());
        let err = module.call("f", vec![HostValue::Bool(true)]);
        match err {
            Err(CallError::NoMatchingOverload { name, attempts }) => {
                assert_eq!(name, "f");
                assert_eq!(attempts.len(), 2);
                assert!(matches!(
                    attempts[0],
                    NativeError::Argument {
                        index: 0,
                        source: ConversionError::TypeMismatch { .. }
                    }
                ));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn native_failures_stop_dispatch() {
        let mut module = Module::new("test");
        assert!(module.function("f", failing_fn()).is_ok());
        assert!(module.function("f", int_fn(0)).is_ok());
        assert!(matches!(
            module.call("f", vec![HostValue::Int(1)]),
            Err(CallError::Native(NativeError::Other { .. }))
        ));
    }

    #[test]
    fn methods_dispatch_on_receiver_type() {
        let bump = NativeFn::new(|ctx: &mut CallContext<'_>| {
            ctx.check_arity(0)?;
            let (receiver, _) = ctx.receiver_and_args()?;
            let counter = crate::adapt::receiver_mut::<u32>(receiver)?;
            *counter += 1;
            let value = *counter;
            ctx.set_return(HostValue::Int(value.into()));
            Ok(())
        });
        let mut module = Module::new("test");
        assert!(module.method("Counter", "bump", bump).is_ok());

        let mut counter = HostValue::object("Counter", 1_u32);
        let result = module.call_method("bump", &mut counter, vec![]);
        assert_eq!(result.ok().and_then(|v| v.as_int()), Some(2));
        assert_eq!(counter.downcast_ref::<u32>(), Some(&2));

        let mut other = HostValue::object("Other", 1_u32);
        assert!(matches!(
            module.call_method("bump", &mut other, vec![]),
            Err(CallError::UnknownFunction { .. })
        ));
        assert!(matches!(
            module.call_method("bump", &mut HostValue::Int(1), vec![]),
            Err(CallError::Native(NativeError::InvalidThis { .. }))
        ));
    }
}

//! Integration tests for adapted native functions.
//!
//! These tests register adapted functions in a `Module` and call them with
//! host values, checking how each ownership category crosses the boundary.

use std::sync::{Arc, Mutex};

use msgbridge::{
    CallContext, CallError, Category, ConstKind, Conversion, ConversionError, HostRecord, HostValue,
    Module, MutableKind, NativeError, NativeObject, Record, Wrapped, adapt,
};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Record)]
#[record(name = "bridge.test.IntMessage")]
pub struct IntMessage {
    pub value: i32,
}

impl IntMessage {
    fn new(value: i32) -> Self {
        Self { value }
    }
}

#[derive(Debug, Error)]
#[error("quota of {limit} exceeded")]
pub struct QuotaError {
    limit: i32,
}

#[derive(Debug, NativeObject)]
#[native_object(name = "Counter")]
pub struct Counter {
    total: i64,
}

impl Counter {
    fn from_message(message: &IntMessage) -> Counter {
        Counter {
            total: message.value as i64,
        }
    }

    fn add(&mut self, message: &IntMessage) -> i64 {
        self.total += message.value as i64;
        self.total
    }

    fn total(&self) -> i64 {
        self.total
    }
}

fn int_record(value: i64) -> HostValue {
    HostValue::Record(HostRecord::new("bridge.test.IntMessage").with("value", value))
}

fn module() -> Module {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Module::new("test")
}

fn argument_source(err: &CallError) -> Option<&ConversionError> {
    match err {
        CallError::NoMatchingOverload { attempts, .. } => attempts.iter().find_map(|attempt| match attempt {
            NativeError::Argument { source, .. } => Some(source),
            _ => None,
        }),
        _ => None,
    }
}

// =============================================================================
// Const references
// =============================================================================

#[test]
fn test_const_ref_borrows_host_object() {
    let mut module = module();
    module
        .function(
            "address",
            adapt!(|m: &IntMessage| -> u64 { m as *const IntMessage as usize as u64 }),
        )
        .expect("register");

    let host = HostValue::record(IntMessage::new(3));
    let expected = host
        .downcast_ref::<IntMessage>()
        .map(|m| m as *const IntMessage as usize);

    let result = module.call("address", vec![host]).expect("call");
    assert_eq!(result.as_int().map(|v| v as u64 as usize), expected);
}

#[test]
fn test_const_ref_reads_host_record_copy() {
    let mut module = module();
    module
        .function("get", adapt!(|m: &IntMessage| -> i32 { m.value }))
        .expect("register");

    let result = module.call("get", vec![int_record(42)]).expect("call");
    assert_eq!(result.as_int(), Some(42));
}

#[test]
fn test_const_ref_rejects_null() {
    let mut module = module();
    module
        .function("get", adapt!(|m: &IntMessage| -> i32 { m.value }))
        .expect("register");

    let err = module.call("get", vec![HostValue::None]).expect_err("null must not convert");
    assert!(matches!(
        argument_source(&err),
        Some(ConversionError::NullHandle { .. })
    ));
}

#[test]
fn test_const_pointer_accepts_null() {
    let mut module = module();
    module
        .function(
            "get_or",
            adapt!(|m: Option<&IntMessage>| -> i32 { m.map_or(-1, |m| m.value) }),
        )
        .expect("register");

    let absent = module.call("get_or", vec![HostValue::None]).expect("call");
    assert_eq!(absent.as_int(), Some(-1));

    let present = module
        .call("get_or", vec![HostValue::record(IntMessage::new(9))])
        .expect("call");
    assert_eq!(present.as_int(), Some(9));
}

#[test]
fn test_wrong_record_type_is_rejected() {
    #[derive(Debug, Clone, Default, Record)]
    #[record(name = "bridge.test.Other")]
    struct Other {
        value: i32,
    }

    let mut module = module();
    module
        .function("get", adapt!(|m: &IntMessage| -> i32 { m.value }))
        .expect("register");

    let err = module
        .call("get", vec![HostValue::record(Other { value: 1 })])
        .expect_err("different record type");
    assert!(matches!(
        argument_source(&err),
        Some(ConversionError::RecordMismatch { .. })
    ));
}

// =============================================================================
// Values
// =============================================================================

#[test]
fn test_value_param_gets_a_copy() {
    let mut module = module();
    module
        .function(
            "consume",
            adapt!(|mut m: IntMessage| -> i32 {
                m.value += 1;
                m.value
            }),
        )
        .expect("register");

    let host = HostValue::record(IntMessage::new(1));
    let mut slots = [host];
    let mut ret = HostValue::None;
    let f = &module.overloads("consume")[0];
    let mut ctx = CallContext::new(&mut slots, &mut ret, Conversion::STRICT);
    f.call(&mut ctx).expect("call");

    assert_eq!(ret.as_int(), Some(2));
    assert_eq!(slots[0].downcast_ref::<IntMessage>(), Some(&IntMessage::new(1)));
}

#[test]
fn test_boxed_param_and_return() {
    let mut module = module();
    module
        .function(
            "bump",
            adapt!(|m: Box<IntMessage>| -> Box<IntMessage> { Box::new(IntMessage::new(m.value + 1)) }),
        )
        .expect("register");

    let result = module.call("bump", vec![int_record(5)]).expect("call");
    assert_eq!(result.downcast_ref::<IntMessage>(), Some(&IntMessage::new(6)));

    let err = module.call("bump", vec![HostValue::None]).expect_err("null box");
    assert!(matches!(
        argument_source(&err),
        Some(ConversionError::NullHandle { .. })
    ));
}

#[test]
fn test_optional_box_accepts_null() {
    let mut module = module();
    module
        .function(
            "value_or",
            adapt!(|m: Option<Box<IntMessage>>| -> i32 { m.map_or(0, |m| m.value) }),
        )
        .expect("register");

    assert_eq!(
        module.call("value_or", vec![HostValue::None]).expect("call").as_int(),
        Some(0)
    );
    assert_eq!(
        module.call("value_or", vec![int_record(4)]).expect("call").as_int(),
        Some(4)
    );
}

#[test]
fn test_record_return_is_owned_by_host() {
    let mut module = module();
    module
        .function("make", adapt!(|value: i32| -> IntMessage { IntMessage::new(value) }))
        .expect("register");

    let result = module.call("make", vec![HostValue::Int(7)]).expect("call");
    let object = result.as_object().expect("record object");
    assert_eq!(object.type_name(), "bridge.test.IntMessage");
    assert_eq!(object.downcast_ref::<IntMessage>(), Some(&IntMessage::new(7)));
}

#[test]
fn test_shared_record_return_is_cloned_out() {
    let shared = Arc::new(IntMessage::new(9));
    let handle = shared.clone();
    let mut module = module();
    module
        .function("shared", adapt!(move || -> Arc<IntMessage> { handle.clone() }))
        .expect("register");

    let result = module.call("shared", vec![]).expect("call");
    assert_eq!(result.downcast_ref::<IntMessage>(), Some(&IntMessage::new(9)));
    assert_eq!(Arc::strong_count(&shared), 2);
}

#[test]
fn test_empty_option_return_is_none() {
    let mut module = module();
    module
        .function("find", adapt!(|| -> Option<IntMessage> { None }))
        .expect("register");

    assert!(module.call("find", vec![]).expect("call").is_none());
}

// =============================================================================
// Containers
// =============================================================================

#[test]
fn test_container_elements_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    let mut module = module();
    module
        .function(
            "sum",
            adapt!(move |messages: Vec<IntMessage>| -> i32 {
                if let Ok(mut log) = log.lock() {
                    log.extend(messages.iter().map(|m| m.value));
                }
                messages.iter().map(|m| m.value).sum()
            }),
        )
        .expect("register");

    let list = HostValue::List(vec![
        int_record(1),
        HostValue::record(IntMessage::new(2)),
        int_record(3),
    ]);
    let result = module.call("sum", vec![list]).expect("call");

    assert_eq!(result.as_int(), Some(6));
    assert_eq!(*seen.lock().expect("lock"), vec![1, 2, 3]);
}

#[test]
fn test_slice_param_sums_records() {
    let mut module = module();
    module
        .function(
            "sum",
            adapt!(|messages: &[IntMessage]| -> i32 { messages.iter().map(|m| m.value).sum() }),
        )
        .expect("register");

    let list = HostValue::List(vec![int_record(4), int_record(5)]);
    assert_eq!(module.call("sum", vec![list]).expect("call").as_int(), Some(9));
}

#[test]
fn test_container_return_keeps_order() {
    let mut module = module();
    module
        .function(
            "range",
            adapt!(|n: i32| -> Vec<IntMessage> { (0..n).map(IntMessage::new).collect() }),
        )
        .expect("register");

    let result = module.call("range", vec![HostValue::Int(3)]).expect("call");
    let values: Vec<i32> = result
        .as_list()
        .expect("list")
        .iter()
        .filter_map(|item| item.downcast_ref::<IntMessage>())
        .map(|m| m.value)
        .collect();
    assert_eq!(values, vec![0, 1, 2]);
}

#[test]
fn test_container_with_bad_element_is_rejected() {
    let mut module = module();
    module
        .function("count", adapt!(|messages: Vec<IntMessage>| -> usize { messages.len() }))
        .expect("register");

    let list = HostValue::List(vec![int_record(1), HostValue::Int(2)]);
    assert!(module.call("count", vec![list]).is_err());
}

// =============================================================================
// Errors raised by native code
// =============================================================================

#[test]
fn test_result_error_is_raised_unchanged() {
    let mut module = module();
    module
        .function(
            "checked",
            adapt!(|m: &IntMessage| -> Result<IntMessage, QuotaError> {
                if m.value > 10 {
                    Err(QuotaError { limit: 10 })
                } else {
                    Ok(m.clone())
                }
            }),
        )
        .expect("register");

    let ok = module.call("checked", vec![int_record(3)]).expect("call");
    assert_eq!(ok.downcast_ref::<IntMessage>(), Some(&IntMessage::new(3)));

    let err = module.call("checked", vec![int_record(11)]).expect_err("quota");
    let CallError::Native(native) = err else {
        panic!("expected a native error");
    };
    assert_eq!(native.raised::<QuotaError>().map(|e| e.limit), Some(10));
    assert_eq!(native.to_string(), "quota of 10 exceeded");
}

#[test]
fn test_string_error_is_raised_with_message() {
    let mut module = module();
    module
        .function(
            "parse",
            adapt!(|text: &str| -> Result<i64, String> {
                text.parse::<i64>().map_err(|_| format!("not a number: {text}"))
            }),
        )
        .expect("register");

    assert_eq!(
        module.call("parse", vec![HostValue::from("12")]).expect("call").as_int(),
        Some(12)
    );
    let err = module
        .call("parse", vec![HostValue::from("twelve")])
        .expect_err("not a number");
    let CallError::Native(native) = err else {
        panic!("expected a native error");
    };
    assert!(matches!(native, NativeError::Raised(_)));
    assert_eq!(native.to_string(), "not a number: twelve");
}

// =============================================================================
// Hand-built wrappers
// =============================================================================

#[test]
fn test_manual_mutable_wrapper_writes_through() {
    let bump = adapt!(|mut m: Wrapped<'_, IntMessage, MutableKind>| {
        if let Some(m) = m.get_mut() {
            m.value += 1;
        }
    });
    assert_eq!(bump.signature().params[0].category, Category::MutableRef);

    let mut slots = [HostValue::record(IntMessage::new(1))];
    let mut ret = HostValue::None;
    let mut ctx = CallContext::new(&mut slots, &mut ret, Conversion::STRICT);
    bump.call(&mut ctx).expect("call");

    assert_eq!(slots[0].downcast_ref::<IntMessage>(), Some(&IntMessage::new(2)));
}

#[test]
fn test_manual_const_wrapper_sees_null() {
    let is_null = adapt!(|m: Wrapped<'_, IntMessage, ConstKind>| -> bool { m.is_empty() });

    let mut slots = [HostValue::None];
    let mut ret = HostValue::None;
    let mut ctx = CallContext::new(&mut slots, &mut ret, Conversion::STRICT);
    is_null.call(&mut ctx).expect("call");
    assert_eq!(ret.as_bool(), Some(true));
}

#[test]
fn test_manual_wrapper_and_ref_overloads_coexist() {
    let mut module = module();
    module
        .function(
            "which",
            adapt!(|_m: Wrapped<'_, IntMessage, ConstKind>| -> i32 { 1 }),
        )
        .expect("register")
        .function("which", adapt!(|_m: &IntMessage| -> i32 { 2 }))
        .expect("register");

    assert_eq!(module.overloads("which").len(), 2);
    let result = module.call("which", vec![int_record(5)]).expect("call");
    assert_eq!(result.as_int(), Some(1));
    let result = module
        .call("which", vec![HostValue::record(IntMessage::new(5))])
        .expect("call");
    assert_eq!(result.as_int(), Some(1));
}

// =============================================================================
// Signatures and overloads
// =============================================================================

fn describe(m: &IntMessage, scale: i32) -> i32 {
    m.value * scale
}

#[test]
fn test_signature_categories() {
    let f = adapt!(describe as fn(&IntMessage, i32) -> i32);
    let signature = f.signature();
    assert_eq!(signature.arity(), 2);
    assert_eq!(signature.params[0].category, Category::ConstRef);
    assert_eq!(signature.params[1].category, Category::Passthrough);
    assert_eq!(signature.returns.category, Category::Passthrough);

    let g = adapt!(|m: IntMessage| -> Vec<IntMessage> { vec![m] });
    assert_eq!(g.signature().params[0].category, Category::Value);
    assert_eq!(g.signature().returns.category, Category::Value);
}

#[test]
fn test_arity_mismatch_is_reported() {
    let mut module = module();
    module
        .function("scale", adapt!(describe as fn(&IntMessage, i32) -> i32))
        .expect("register");

    let err = module.call("scale", vec![int_record(2)]).expect_err("one argument");
    let CallError::NoMatchingOverload { attempts, .. } = err else {
        panic!("expected overload failure");
    };
    assert!(matches!(
        attempts.as_slice(),
        [NativeError::ArgumentCount {
            expected: 2,
            actual: 1
        }]
    ));
}

#[test]
fn test_overloads_pick_matching_shape() {
    let mut module = module();
    module
        .function("kind", adapt!(|_m: &IntMessage| -> String { "record".to_owned() }))
        .expect("register")
        .function("kind", adapt!(|_v: i64| -> String { "int".to_owned() }))
        .expect("register");

    assert_eq!(module.overloads("kind").len(), 2);
    let record = module.call("kind", vec![int_record(1)]).expect("call");
    assert_eq!(record.as_str(), Some("record"));
    let int = module.call("kind", vec![HostValue::Int(1)]).expect("call");
    assert_eq!(int.as_str(), Some("int"));
}

#[test]
fn test_implicit_conversion_is_a_second_pass() {
    let mut module = module();
    module
        .function("half", adapt!(|v: f64| -> f64 { v / 2.0 }))
        .expect("register");

    let result = module.call("half", vec![HostValue::Int(3)]).expect("call");
    assert_eq!(result.as_float(), Some(1.5));

    let mut strict = Module::new("strict").with_config(msgbridge::ModuleConfig::default().with_implicit_conversion(false));
    strict
        .function("half", adapt!(|v: f64| -> f64 { v / 2.0 }))
        .expect("register");
    assert!(strict.call("half", vec![HostValue::Int(3)]).is_err());
}

#[test]
fn test_unsigned_param_rejects_negative() {
    let mut module = module();
    module
        .function("id", adapt!(|n: u64| -> u64 { n }))
        .expect("register");

    assert_eq!(module.call("id", vec![HostValue::Int(7)]).expect("call").as_int(), Some(7));
    let err = module.call("id", vec![HostValue::Int(-1)]).expect_err("negative");
    assert!(matches!(
        argument_source(&err),
        Some(ConversionError::IntegerOverflow {
            value: -1,
            target_type: "u64"
        })
    ));
}

#[test]
fn test_unknown_function() {
    let module = module();
    assert!(matches!(
        module.call("missing", vec![]),
        Err(CallError::UnknownFunction { .. })
    ));
}

// =============================================================================
// Native objects
// =============================================================================

#[test]
fn test_native_object_constructor_and_methods() {
    let mut module = module();
    module
        .function("counter", adapt!(|m: &IntMessage| -> Counter { Counter::from_message(m) }))
        .expect("register");
    module
        .method(
            Counter::NAME,
            "add",
            adapt!(method Counter::add as fn(&mut Counter, &IntMessage) -> i64),
        )
        .expect("register")
        .method(
            Counter::NAME,
            "total",
            adapt!(method Counter::total as fn(&Counter) -> i64),
        )
        .expect("register");

    let mut counter = module.call("counter", vec![int_record(2)]).expect("construct");
    assert_eq!(counter.as_object().map(|o| o.type_name()), Some("Counter"));

    let total = module
        .call_method("add", &mut counter, vec![int_record(5)])
        .expect("add");
    assert_eq!(total.as_int(), Some(7));

    // the receiver is handed back with the mutation applied
    let total = module.call_method("total", &mut counter, vec![]).expect("total");
    assert_eq!(total.as_int(), Some(7));
    assert_eq!(counter.downcast_ref::<Counter>().map(|c| c.total), Some(7));
}

#[test]
fn test_method_on_non_object_receiver() {
    let mut module = module();
    module
        .method(
            Counter::NAME,
            "total",
            adapt!(method Counter::total as fn(&Counter) -> i64),
        )
        .expect("register");

    let mut receiver = HostValue::Int(1);
    assert!(matches!(
        module.call_method("total", &mut receiver, vec![]),
        Err(CallError::Native(NativeError::InvalidThis { .. }))
    ));
    assert_eq!(receiver.as_int(), Some(1));
}

#[test]
fn test_native_object_param_borrows() {
    let mut module = module();
    module
        .function("read", adapt!(|c: &Counter| -> i64 { c.total }))
        .expect("register");

    let host = HostValue::object(Counter::NAME, Counter { total: 11 });
    assert_eq!(module.call("read", vec![host]).expect("call").as_int(), Some(11));
}

//! The host runtime's side of the boundary.
//!
//! A [`HostValue`] is what the host hands to an adapted call and what it gets
//! back. Native values the host holds on to live in a [`HostObject`]; records
//! the host built itself (never backed by a native instance) are
//! [`HostRecord`]s.

use std::any::Any;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::record::Record;
use crate::reflect::Reflect;

/// A value as seen by the host runtime.
///
/// Does not implement `Clone`: an `Object` owns a native value that may not be
/// cloneable.
#[derive(Debug, Default)]
pub enum HostValue {
    /// The host's null / "no value"
    #[default]
    None,
    /// Integer (every native integer width crosses as i64)
    Int(i64),
    /// Float (f32 and f64 both cross as f64)
    Float(f64),
    /// Boolean
    Bool(bool),
    /// String (owned by the host)
    Str(String),
    /// Sequence
    List(Vec<HostValue>),
    /// A record built by the host, not backed by a native instance
    Record(HostRecord),
    /// A native value owned by the host
    Object(HostObject),
}

impl HostValue {
    /// Get a human-readable name for this value's kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "none",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Bool(_) => "bool",
            HostValue::Str(_) => "str",
            HostValue::List(_) => "list",
            HostValue::Record(_) => "record",
            HostValue::Object(_) => "object",
        }
    }

    /// Wrap a native record as a host-owned object.
    pub fn record<R: Record>(record: R) -> Self {
        HostValue::Object(HostObject::record(record))
    }

    /// Wrap an arbitrary native value as a host-owned object.
    pub fn object<T: Any + Send + Sync>(type_name: &'static str, value: T) -> Self {
        HostValue::Object(HostObject::new(type_name, value))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            HostValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&HostRecord> {
        match self {
            HostValue::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut HostObject> {
        match self {
            HostValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow the native value inside an `Object`, if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object()?.downcast_ref::<T>()
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Int(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(value as i64)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Float(value)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(value.to_owned())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Str(value)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::List(items)
    }
}

impl From<HostRecord> for HostValue {
    fn from(record: HostRecord) -> Self {
        HostValue::Record(record)
    }
}

impl From<HostObject> for HostValue {
    fn from(object: HostObject) -> Self {
        HostValue::Object(object)
    }
}

/// A record the host built out of its own values.
///
/// Field values are keyed by field name; validation against a descriptor
/// happens only when the record is copied into a native instance.
#[derive(Debug, Default)]
pub struct HostRecord {
    type_name: String,
    fields: BTreeMap<String, HostValue>,
}

impl HostRecord {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<HostValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&HostValue> {
        self.fields.get(name)
    }

    /// Fully-qualified record type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &HostValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

type ReflectView = fn(&dyn Any) -> Option<&dyn Reflect>;

fn reflect_view<R: Record>(any: &dyn Any) -> Option<&dyn Reflect> {
    any.downcast_ref::<R>().map(|record| record as &dyn Reflect)
}

/// A native value owned by the host.
///
/// Borrowing parameters (`&R`, `Wrapped<R, ConstKind>`, method receivers)
/// read straight out of the box without copying.
pub struct HostObject {
    type_name: Cow<'static, str>,
    value: Box<dyn Any + Send + Sync>,
    reflect: Option<ReflectView>,
}

impl HostObject {
    /// Box an arbitrary native value under a host-visible type name.
    pub fn new<T: Any + Send + Sync>(type_name: &'static str, value: T) -> Self {
        Self {
            type_name: Cow::Borrowed(type_name),
            value: Box::new(value),
            reflect: None,
        }
    }

    /// Box a native record. The object keeps a reflection view so code that
    /// does not know `R` statically can still read its fields.
    pub fn record<R: Record>(record: R) -> Self {
        let type_name = Cow::Owned(record.descriptor().full_name().to_owned());
        Self {
            type_name,
            value: Box::new(record),
            reflect: Some(reflect_view::<R> as ReflectView),
        }
    }

    /// Host-visible type name (the full record name for records).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }

    /// Reflection view of the contained record, if this object holds one.
    pub fn reflect(&self) -> Option<&dyn Reflect> {
        let view = self.reflect?;
        view(&*self.value as &dyn Any)
    }

    /// Take the native value back out, or return the object unchanged if it
    /// holds a different type.
    pub fn into_inner<T: Any>(self) -> Result<T, HostObject> {
        let HostObject {
            type_name,
            value,
            reflect,
        } = self;
        match value.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(value) => Err(HostObject {
                type_name,
                value,
                reflect,
            }),
        }
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("type_name", &self.type_name)
            .field("record", &self.reflect.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        hits: u32,
    }

    #[test]
    fn host_value_type_names() {
        assert_eq!(HostValue::None.type_name(), "none");
        assert_eq!(HostValue::Int(0).type_name(), "int");
        assert_eq!(HostValue::Float(0.0).type_name(), "float");
        assert_eq!(HostValue::Bool(false).type_name(), "bool");
        assert_eq!(HostValue::from("x").type_name(), "str");
        assert_eq!(HostValue::List(vec![]).type_name(), "list");
        assert_eq!(HostValue::from(HostRecord::new("pkg.M")).type_name(), "record");
        assert_eq!(HostValue::object("Counter", 1u8).type_name(), "object");
    }

    #[test]
    fn host_value_accessors() {
        assert_eq!(HostValue::from(7).as_int(), Some(7));
        assert_eq!(HostValue::from(1.5).as_float(), Some(1.5));
        assert_eq!(HostValue::from(true).as_bool(), Some(true));
        assert_eq!(HostValue::from("abc").as_str(), Some("abc"));
        assert!(HostValue::None.is_none());
        assert!(HostValue::Int(1).as_str().is_none());
    }

    #[test]
    fn host_record_builder() {
        let record = HostRecord::new("pkg.IntMessage")
            .with("value", 5)
            .with("name", "five");
        assert_eq!(record.type_name(), "pkg.IntMessage");
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("value").and_then(HostValue::as_int), Some(5));
        let names: Vec<_> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "value"]);
    }

    #[test]
    fn host_object_downcast() {
        let mut object = HostObject::new("Counter", Counter { hits: 1 });
        assert!(object.is::<Counter>());
        assert!(object.downcast_ref::<String>().is_none());
        assert!(object.reflect().is_none());

        if let Some(counter) = object.downcast_mut::<Counter>() {
            counter.hits += 1;
        }
        assert_eq!(object.downcast_ref::<Counter>().map(|c| c.hits), Some(2));
    }

    #[test]
    fn host_object_into_inner() {
        let object = HostObject::new("Counter", Counter { hits: 3 });
        let object = match object.into_inner::<String>() {
            Ok(_) => panic!("wrong type must not unwrap"),
            Err(object) => object,
        };
        assert_eq!(object.type_name(), "Counter");
        let counter = object.into_inner::<Counter>().ok();
        assert_eq!(counter.map(|c| c.hits), Some(3));
    }
}

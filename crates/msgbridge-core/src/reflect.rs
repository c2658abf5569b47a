//! Field-level reflection over records.
//!
//! [`Reflect`] is the descriptor-driven view of a record used when its Rust
//! type is not statically known: copying a host-built record into a native
//! one, or turning any record into a dynamic one. The adapter itself never
//! goes through here for records whose type it knows.

use crate::descriptor::{FieldKind, Label, RecordDescriptor};
use crate::error::{ConversionError, ReflectError};
use crate::host::{HostRecord, HostValue};

/// A field value in reflection currency.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Raw enum value; need not name a declared enumerator
    Enum(i64),
    Record(RecordValue),
    List(Vec<FieldValue>),
    #[default]
    Unset,
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "bool",
            FieldValue::Str(_) => "string",
            FieldValue::Enum(_) => "enum",
            FieldValue::Record(_) => "record",
            FieldValue::List(_) => "list",
            FieldValue::Unset => "unset",
        }
    }

    /// Default value of a field with this kind and label.
    pub fn default_for(kind: &FieldKind, label: Label) -> FieldValue {
        if label == Label::Repeated {
            return FieldValue::List(Vec::new());
        }
        match kind {
            FieldKind::Int32 | FieldKind::Int64 | FieldKind::UInt32 | FieldKind::UInt64 => {
                FieldValue::Int(0)
            }
            FieldKind::Float | FieldKind::Double => FieldValue::Float(0.0),
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::String => FieldValue::Str(String::new()),
            FieldKind::Enum(_) => FieldValue::Enum(0),
            FieldKind::Record(name) => FieldValue::Record(RecordValue::new(name.clone())),
        }
    }

    /// Read a host value without a schema. Kinds are checked later, by the
    /// setter of the field the value lands in.
    pub fn from_host(value: &HostValue) -> Result<FieldValue, ConversionError> {
        Ok(match value {
            HostValue::None => FieldValue::Unset,
            HostValue::Int(v) => FieldValue::Int(*v),
            HostValue::Float(v) => FieldValue::Float(*v),
            HostValue::Bool(v) => FieldValue::Bool(*v),
            HostValue::Str(s) => FieldValue::Str(s.clone()),
            HostValue::List(items) => FieldValue::List(
                items
                    .iter()
                    .map(FieldValue::from_host)
                    .collect::<Result<_, _>>()?,
            ),
            HostValue::Record(record) => FieldValue::Record(RecordValue::from_host(record)?),
            HostValue::Object(object) => match object.reflect() {
                Some(view) => FieldValue::Record(view.to_record_value()),
                None => {
                    return Err(ConversionError::TypeMismatch {
                        expected: "record",
                        actual: "object",
                    });
                }
            },
        })
    }

    pub fn into_host(self) -> HostValue {
        match self {
            FieldValue::Int(v) | FieldValue::Enum(v) => HostValue::Int(v),
            FieldValue::Float(v) => HostValue::Float(v),
            FieldValue::Bool(v) => HostValue::Bool(v),
            FieldValue::Str(s) => HostValue::Str(s),
            FieldValue::Record(record) => HostValue::Record(record.into_host()),
            FieldValue::List(items) => {
                HostValue::List(items.into_iter().map(FieldValue::into_host).collect())
            }
            FieldValue::Unset => HostValue::None,
        }
    }
}

/// A record's contents in reflection currency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordValue {
    type_name: String,
    fields: Vec<(String, FieldValue)>,
}

impl RecordValue {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn from_host(record: &HostRecord) -> Result<RecordValue, ConversionError> {
        let mut value = RecordValue::new(record.type_name());
        for (name, field) in record.fields() {
            value.push(name, FieldValue::from_host(field)?);
        }
        Ok(value)
    }

    pub fn into_host(self) -> HostRecord {
        let mut record = HostRecord::new(self.type_name);
        for (name, value) in self.fields {
            record.set(name, value.into_host());
        }
        record
    }
}

/// Descriptor-driven access to a record's fields.
pub trait Reflect: Send + Sync {
    fn descriptor(&self) -> &RecordDescriptor;

    fn get_field(&self, name: &str) -> Result<FieldValue, ReflectError>;

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), ReflectError>;

    /// Reset every field to its default.
    fn clear(&mut self);

    fn to_record_value(&self) -> RecordValue {
        let descriptor = self.descriptor();
        let mut value = RecordValue::new(descriptor.full_name());
        for field in descriptor.fields() {
            if let Ok(field_value) = self.get_field(field.name()) {
                value.push(field.name(), field_value);
            }
        }
        value
    }

    /// Copy every set field of `value` into this record.
    fn merge_record_value(&mut self, value: &RecordValue) -> Result<(), ReflectError> {
        if value.type_name() != self.descriptor().full_name() {
            return Err(ReflectError::RecordMismatch {
                expected: self.descriptor().full_name().to_owned(),
                actual: value.type_name().to_owned(),
            });
        }
        for (name, field_value) in value.fields() {
            if *field_value != FieldValue::Unset {
                self.set_field(name, field_value.clone())?;
            }
        }
        Ok(())
    }
}

/// How one Rust field type maps onto a [`FieldKind`] and [`FieldValue`].
pub trait FieldType: Sized {
    fn field_kind() -> FieldKind;

    fn field_label() -> Label {
        Label::Singular
    }

    fn to_field_value(&self) -> FieldValue;

    fn from_field_value(value: FieldValue, field: &str) -> Result<Self, ReflectError>;
}

pub(crate) fn kind_mismatch(field: &str, expected: &'static str, value: &FieldValue) -> ReflectError {
    ReflectError::KindMismatch {
        field: field.to_owned(),
        expected,
        actual: value.kind_name(),
    }
}

macro_rules! impl_int_field {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl FieldType for $ty {
                fn field_kind() -> FieldKind {
                    FieldKind::$kind
                }

                fn to_field_value(&self) -> FieldValue {
                    FieldValue::Int(i64::try_from(*self).unwrap_or(i64::MAX))
                }

                fn from_field_value(value: FieldValue, field: &str) -> Result<Self, ReflectError> {
                    match value {
                        FieldValue::Int(v) | FieldValue::Enum(v) => {
                            <$ty>::try_from(v).map_err(|_| ReflectError::OutOfRange {
                                value: v,
                                target_type: stringify!($ty),
                            })
                        }
                        other => Err(kind_mismatch(field, "int", &other)),
                    }
                }
            }
        )*
    };
}

impl_int_field!(
    i8 => Int32,
    i16 => Int32,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt32,
    u16 => UInt32,
    u32 => UInt32,
    u64 => UInt64,
);

macro_rules! impl_float_field {
    ($($ty:ty => $kind:ident),*) => {
        $(
            impl FieldType for $ty {
                fn field_kind() -> FieldKind {
                    FieldKind::$kind
                }

                fn to_field_value(&self) -> FieldValue {
                    FieldValue::Float(*self as f64)
                }

                fn from_field_value(value: FieldValue, field: &str) -> Result<Self, ReflectError> {
                    match value {
                        FieldValue::Float(v) => Ok(v as $ty),
                        FieldValue::Int(v) => Ok(v as $ty),
                        other => Err(kind_mismatch(field, "float", &other)),
                    }
                }
            }
        )*
    };
}

impl_float_field!(f32 => Float, f64 => Double);

impl FieldType for bool {
    fn field_kind() -> FieldKind {
        FieldKind::Bool
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }

    fn from_field_value(value: FieldValue, field: &str) -> Result<Self, ReflectError> {
        match value {
            FieldValue::Bool(v) => Ok(v),
            other => Err(kind_mismatch(field, "bool", &other)),
        }
    }
}

impl FieldType for String {
    fn field_kind() -> FieldKind {
        FieldKind::String
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::Str(self.clone())
    }

    fn from_field_value(value: FieldValue, field: &str) -> Result<Self, ReflectError> {
        match value {
            FieldValue::Str(s) => Ok(s),
            other => Err(kind_mismatch(field, "string", &other)),
        }
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn field_kind() -> FieldKind {
        T::field_kind()
    }

    fn field_label() -> Label {
        Label::Repeated
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::List(self.iter().map(T::to_field_value).collect())
    }

    fn from_field_value(value: FieldValue, field: &str) -> Result<Self, ReflectError> {
        match value {
            FieldValue::List(items) => items
                .into_iter()
                .map(|item| T::from_field_value(item, field))
                .collect(),
            FieldValue::Unset => Ok(Vec::new()),
            other => Err(kind_mismatch(field, "list", &other)),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn field_kind() -> FieldKind {
        T::field_kind()
    }

    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(value) => value.to_field_value(),
            None => FieldValue::Unset,
        }
    }

    fn from_field_value(value: FieldValue, field: &str) -> Result<Self, ReflectError> {
        match value {
            FieldValue::Unset => Ok(None),
            value => T::from_field_value(value, field).map(Some),
        }
    }
}

//! Records whose schema is only known at runtime.

use std::sync::Arc;

use crate::descriptor::{DescriptorPool, FieldDescriptor, FieldKind, Label, RecordDescriptor};
use crate::error::ReflectError;
use crate::reflect::{FieldValue, Reflect, RecordValue, kind_mismatch};

/// Creates default-valued records from a full type name.
pub trait RecordFactory: Send + Sync {
    /// `None` when no record type with this name is known.
    fn new_record(&self, full_name: &str) -> Option<DynamicRecord>;
}

impl RecordFactory for DescriptorPool {
    fn new_record(&self, full_name: &str) -> Option<DynamicRecord> {
        let descriptor = self.find_record(full_name);
        if descriptor.is_none() {
            tracing::debug!(record = full_name, "record type not found in pool");
        }
        descriptor.map(DynamicRecord::new)
    }
}

/// A record backed by a runtime [`RecordDescriptor`].
///
/// Field storage runs parallel to the descriptor's field list; unset fields
/// read back as their default.
#[derive(Debug, Clone, Default)]
pub struct DynamicRecord {
    descriptor: Arc<RecordDescriptor>,
    values: Vec<FieldValue>,
}

impl DynamicRecord {
    pub fn new(descriptor: Arc<RecordDescriptor>) -> Self {
        let values = vec![FieldValue::Unset; descriptor.fields().len()];
        Self { descriptor, values }
    }

    /// Build a dynamic copy of any record.
    pub fn copy_of(source: &dyn Reflect) -> Result<Self, ReflectError> {
        let mut record = DynamicRecord::new(Arc::new(source.descriptor().clone()));
        record.merge_record_value(&source.to_record_value())?;
        Ok(record)
    }

    pub fn full_name(&self) -> &str {
        self.descriptor.full_name()
    }

    pub fn descriptor_arc(&self) -> &Arc<RecordDescriptor> {
        &self.descriptor
    }

    /// True when the field was explicitly assigned.
    pub fn has_field(&self, name: &str) -> bool {
        self.descriptor
            .field_index(name)
            .is_some_and(|index| self.values[index] != FieldValue::Unset)
    }

    fn unknown_field(&self, name: &str) -> ReflectError {
        ReflectError::UnknownField {
            record: self.descriptor.full_name().to_owned(),
            field: name.to_owned(),
        }
    }
}

/// Check `value` against the field's kind, normalizing it where the kind
/// allows (ints in float fields, ints in enum fields).
fn check_value(field: &FieldDescriptor, value: FieldValue) -> Result<FieldValue, ReflectError> {
    if field.label() == Label::Repeated {
        return match value {
            FieldValue::List(items) => items
                .into_iter()
                .map(|item| check_singular(field, item))
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::List),
            FieldValue::Unset => Ok(FieldValue::Unset),
            other => Err(kind_mismatch(field.name(), "list", &other)),
        };
    }
    check_singular(field, value)
}

fn check_singular(field: &FieldDescriptor, value: FieldValue) -> Result<FieldValue, ReflectError> {
    let range = |v: i64, min: i64, max: i64, target_type: &'static str| {
        if (min..=max).contains(&v) {
            Ok(FieldValue::Int(v))
        } else {
            Err(ReflectError::OutOfRange { value: v, target_type })
        }
    };
    match (field.kind(), value) {
        (_, FieldValue::Unset) => Ok(FieldValue::Unset),
        (FieldKind::Int32, FieldValue::Int(v)) => range(v, i32::MIN as i64, i32::MAX as i64, "int32"),
        (FieldKind::UInt32, FieldValue::Int(v)) => range(v, 0, u32::MAX as i64, "uint32"),
        (FieldKind::Int64, FieldValue::Int(v)) => Ok(FieldValue::Int(v)),
        (FieldKind::UInt64, FieldValue::Int(v)) => range(v, 0, i64::MAX, "uint64"),
        (FieldKind::Float | FieldKind::Double, FieldValue::Float(v)) => Ok(FieldValue::Float(v)),
        (FieldKind::Float | FieldKind::Double, FieldValue::Int(v)) => Ok(FieldValue::Float(v as f64)),
        (FieldKind::Bool, FieldValue::Bool(v)) => Ok(FieldValue::Bool(v)),
        (FieldKind::String, FieldValue::Str(s)) => Ok(FieldValue::Str(s)),
        (FieldKind::Enum(_), FieldValue::Enum(v) | FieldValue::Int(v)) => {
            range(v, i32::MIN as i64, i32::MAX as i64, "enum").map(|_| FieldValue::Enum(v))
        }
        (FieldKind::Record(expected), FieldValue::Record(record)) => {
            if record.type_name() == expected {
                Ok(FieldValue::Record(record))
            } else {
                Err(ReflectError::RecordMismatch {
                    expected: expected.clone(),
                    actual: record.type_name().to_owned(),
                })
            }
        }
        (kind, other) => Err(kind_mismatch(field.name(), kind.category(), &other)),
    }
}

impl Reflect for DynamicRecord {
    fn descriptor(&self) -> &RecordDescriptor {
        &self.descriptor
    }

    fn get_field(&self, name: &str) -> Result<FieldValue, ReflectError> {
        let index = self
            .descriptor
            .field_index(name)
            .ok_or_else(|| self.unknown_field(name))?;
        Ok(match &self.values[index] {
            FieldValue::Unset => {
                let field = &self.descriptor.fields()[index];
                FieldValue::default_for(field.kind(), field.label())
            }
            value => value.clone(),
        })
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), ReflectError> {
        let index = self
            .descriptor
            .field_index(name)
            .ok_or_else(|| self.unknown_field(name))?;
        let value = check_value(&self.descriptor.fields()[index], value)?;
        self.values[index] = value;
        Ok(())
    }

    fn clear(&mut self) {
        self.values.fill(FieldValue::Unset);
    }

    fn to_record_value(&self) -> RecordValue {
        let mut value = RecordValue::new(self.descriptor.full_name());
        for (field, stored) in self.descriptor.fields().iter().zip(&self.values) {
            if *stored != FieldValue::Unset {
                value.push(field.name(), stored.clone());
            }
        }
        value
    }
}

impl PartialEq for DynamicRecord {
    fn eq(&self, other: &Self) -> bool {
        self.full_name() == other.full_name() && self.to_record_value() == other.to_record_value()
    }
}

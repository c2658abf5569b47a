//! Record and enum descriptors, and the pool that indexes them.
//!
//! A descriptor is the runtime schema of a record: its full name and the
//! kind, label and number of every field. Statically known records build
//! theirs once (see `#[derive(Record)]`); dynamic records get theirs from a
//! [`DescriptorPool`].

use std::fmt::Write as _;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::PoolError;
use crate::record::Record;
use crate::enums::RecordEnum;
use crate::type_hash::TypeHash;

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float,
    Double,
    Bool,
    String,
    /// Enum field, by full enum name
    Enum(String),
    /// Nested record field, by full record name
    Record(String),
}

impl FieldKind {
    /// Schema-language spelling of the kind.
    pub fn name(&self) -> &str {
        match self {
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::UInt32 => "uint32",
            FieldKind::UInt64 => "uint64",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Enum(name) | FieldKind::Record(name) => name.as_str(),
        }
    }

    /// Short category name used in error messages.
    pub fn category(&self) -> &'static str {
        match self {
            FieldKind::Int32 | FieldKind::Int64 | FieldKind::UInt32 | FieldKind::UInt64 => "int",
            FieldKind::Float | FieldKind::Double => "float",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Enum(_) => "enum",
            FieldKind::Record(_) => "record",
        }
    }
}

/// Cardinality of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Label {
    #[default]
    Singular,
    Repeated,
}

/// Schema of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    number: u32,
    kind: FieldKind,
    label: Label,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, number: u32, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            number,
            kind,
            label: Label::Singular,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    pub fn repeated(self) -> Self {
        self.with_label(Label::Repeated)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

/// Schema of a record type.
#[derive(Debug, Clone, Default)]
pub struct RecordDescriptor {
    full_name: String,
    fields: Vec<FieldDescriptor>,
    by_name: FxHashMap<String, usize>,
}

impl RecordDescriptor {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            fields: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Builder-style field declaration. A repeated name replaces the earlier
    /// declaration.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.add_field(field);
        self
    }

    pub fn add_field(&mut self, field: FieldDescriptor) {
        match self.by_name.get(field.name()) {
            Some(&index) => self.fields[index] = field,
            None => {
                self.by_name.insert(field.name().to_owned(), self.fields.len());
                self.fields.push(field);
            }
        }
    }

    /// Fully-qualified name, e.g. `pkg.sub.Message`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Last segment of the full name.
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(self.full_name.as_str(), |(_, name)| name)
    }

    /// Everything before the last segment; empty for unqualified names.
    pub fn package(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or("", |(package, _)| package)
    }

    pub fn type_hash(&self) -> TypeHash {
        TypeHash::from_name(&self.full_name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&index| &self.fields[index])
    }

    /// Declaration index of a field, for storage parallel to `fields()`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.number() == number)
    }

    /// Render the descriptor in schema syntax.
    pub fn debug_string(&self) -> String {
        let mut out = String::new();
        if !self.package().is_empty() {
            let _ = writeln!(out, "package {};", self.package());
        }
        let _ = writeln!(out, "message {} {{", self.name());
        for field in &self.fields {
            let label = if field.is_repeated() { "repeated " } else { "" };
            let _ = writeln!(
                out,
                "  {}{} {} = {};",
                label,
                field.kind().name(),
                field.name(),
                field.number()
            );
        }
        out.push_str("}\n");
        out
    }
}

impl PartialEq for RecordDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name && self.fields == other.fields
    }
}

/// Schema of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumDescriptor {
    full_name: String,
    values: Vec<(String, i64)>,
}

impl EnumDescriptor {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.values.push((name.into(), value));
        self
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Declared enumerators in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Value of the enumerator with this name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.values
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| *value)
    }

    /// Name of the first enumerator with this value. Unknown values have none.
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, candidate)| *candidate == value)
            .map(|(name, _)| name.as_str())
    }
}

/// Registry of record and enum descriptors keyed by the hash of their full
/// name.
#[derive(Debug, Default)]
pub struct DescriptorPool {
    records: FxHashMap<TypeHash, Arc<RecordDescriptor>>,
    enums: FxHashMap<TypeHash, Arc<EnumDescriptor>>,
}

impl DescriptorPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, descriptor: RecordDescriptor) -> Result<Arc<RecordDescriptor>, PoolError> {
        validate_full_name(descriptor.full_name())?;
        let hash = descriptor.type_hash();
        if self.records.contains_key(&hash) {
            return Err(PoolError::DuplicateRecord(descriptor.full_name().to_owned()));
        }
        let descriptor = Arc::new(descriptor);
        self.records.insert(hash, Arc::clone(&descriptor));
        tracing::debug!(record = descriptor.full_name(), "registered record descriptor");
        Ok(descriptor)
    }

    pub fn add_enum(&mut self, descriptor: EnumDescriptor) -> Result<Arc<EnumDescriptor>, PoolError> {
        validate_full_name(descriptor.full_name())?;
        let hash = TypeHash::from_name(descriptor.full_name());
        if self.enums.contains_key(&hash) {
            return Err(PoolError::DuplicateEnum(descriptor.full_name().to_owned()));
        }
        let descriptor = Arc::new(descriptor);
        self.enums.insert(hash, Arc::clone(&descriptor));
        tracing::debug!(enum_name = descriptor.full_name(), "registered enum descriptor");
        Ok(descriptor)
    }

    /// Register the schema of a statically known record type.
    pub fn register<R: Record>(&mut self) -> Result<Arc<RecordDescriptor>, PoolError> {
        let descriptor = R::static_descriptor()
            .ok_or_else(|| PoolError::InvalidName(std::any::type_name::<R>().to_owned()))?;
        self.add_record(descriptor.clone())
    }

    /// Register the schema of an enum type.
    pub fn register_enum<E: RecordEnum>(&mut self) -> Result<Arc<EnumDescriptor>, PoolError> {
        self.add_enum(E::descriptor().clone())
    }

    pub fn find_record(&self, full_name: &str) -> Option<Arc<RecordDescriptor>> {
        self.records.get(&TypeHash::from_name(full_name)).cloned()
    }

    pub fn find_enum(&self, full_name: &str) -> Option<Arc<EnumDescriptor>> {
        self.enums.get(&TypeHash::from_name(full_name)).cloned()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }
}

/// A full name is one or more dot-separated identifiers.
fn validate_full_name(full_name: &str) -> Result<(), PoolError> {
    let valid = !full_name.is_empty()
        && full_name.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(PoolError::InvalidName(full_name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_message() -> RecordDescriptor {
        RecordDescriptor::new("bridge.test.IntMessage")
            .with_field(FieldDescriptor::new("value", 1, FieldKind::Int32))
            .with_field(FieldDescriptor::new("history", 2, FieldKind::Int64).repeated())
    }

    #[test]
    fn record_descriptor_lookup() {
        let descriptor = int_message();
        assert_eq!(descriptor.name(), "IntMessage");
        assert_eq!(descriptor.package(), "bridge.test");
        assert_eq!(descriptor.field("value").map(FieldDescriptor::number), Some(1));
        assert_eq!(descriptor.field_by_number(2).map(FieldDescriptor::name), Some("history"));
        assert_eq!(descriptor.field_index("history"), Some(1));
        assert!(descriptor.field("missing").is_none());
    }

    #[test]
    fn add_field_replaces_same_name() {
        let descriptor = int_message().with_field(FieldDescriptor::new("value", 7, FieldKind::Int64));
        assert_eq!(descriptor.fields().len(), 2);
        assert_eq!(descriptor.field("value").map(FieldDescriptor::number), Some(7));
    }

    #[test]
    fn debug_string_renders_schema() {
        let text = int_message().debug_string();
        assert!(text.starts_with("package bridge.test;\nmessage IntMessage {\n"));
        assert!(text.contains("  int32 value = 1;\n"));
        assert!(text.contains("  repeated int64 history = 2;\n"));
    }

    #[test]
    fn enum_descriptor_lookup() {
        let descriptor = EnumDescriptor::new("bridge.test.Color")
            .with_value("RED", 0)
            .with_value("GREEN", 1);
        assert_eq!(descriptor.value_of("GREEN"), Some(1));
        assert_eq!(descriptor.name_of(0), Some("RED"));
        assert_eq!(descriptor.name_of(42), None);
        assert_eq!(descriptor.values().count(), 2);
    }

    #[test]
    fn pool_rejects_duplicates() {
        let mut pool = DescriptorPool::new();
        assert!(pool.add_record(int_message()).is_ok());
        assert_eq!(
            pool.add_record(int_message()),
            Err(PoolError::DuplicateRecord("bridge.test.IntMessage".into()))
        );
        assert_eq!(pool.record_count(), 1);
    }

    #[test]
    fn pool_rejects_invalid_names() {
        let mut pool = DescriptorPool::new();
        for name in ["", "pkg.", ".Message", "pkg.9lives", "pkg.with space"] {
            assert_eq!(
                pool.add_record(RecordDescriptor::new(name)).err(),
                Some(PoolError::InvalidName(name.into()))
            );
        }
    }

    #[test]
    fn pool_find() {
        let mut pool = DescriptorPool::new();
        let added = pool.add_record(int_message()).ok();
        let found = pool.find_record("bridge.test.IntMessage");
        assert_eq!(found.as_deref(), added.as_deref());
        assert!(pool.find_record("bridge.test.Missing").is_none());

        pool.add_enum(EnumDescriptor::new("bridge.test.Color")).ok();
        assert!(pool.find_enum("bridge.test.Color").is_some());
        assert_eq!(pool.enum_count(), 1);
    }
}

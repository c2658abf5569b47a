//! Error types for the boundary layer.
//!
//! ```text
//! CallError            - dispatch through a Module
//! └── NativeError      - one adapted call
//!     └── ConversionError - one host value <-> native value crossing
//!         └── ReflectError  - field access through a descriptor
//! PoolError            - descriptor pool registration
//! ```
//!
//! Build-time rejection of unsafe signatures never shows up here: it is a
//! compile error, not a runtime value.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors raised while reading or writing a record field by name.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReflectError {
    /// The record's descriptor has no field with this name.
    #[error("record '{record}' has no field named '{field}'")]
    UnknownField { record: String, field: String },

    /// The value does not fit the field's declared kind.
    #[error("field '{field}' expects {expected}, got {actual}")]
    KindMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// An integer field value is out of range for the Rust field type.
    #[error("value {value} does not fit in {target_type}")]
    OutOfRange { value: i64, target_type: &'static str },

    /// A nested record value names a different record type.
    #[error("expected record '{expected}', got '{actual}'")]
    RecordMismatch { expected: String, actual: String },
}

/// Errors that can occur when converting between host and native values.
///
/// This is the "argument could not be converted" channel: every failure of a
/// single crossing is reported through it rather than raised separately.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Type mismatch during conversion
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A host null reached a position that requires an object
    #[error("null cannot be converted to {target_type}")]
    NullHandle { target_type: &'static str },

    /// Integer overflow during conversion
    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow { value: i64, target_type: &'static str },

    /// Float conversion error
    #[error("float conversion error: value {value} cannot be represented as {target_type}")]
    FloatConversion {
        value: f64,
        target_type: &'static str,
    },

    /// The host named a record type no factory knows about
    #[error("unknown record type '{type_name}'")]
    UnknownRecordType { type_name: String },

    /// The host passed a record of a different type
    #[error("expected record '{expected}', got '{actual}'")]
    RecordMismatch { expected: String, actual: String },

    /// A host string did not name any enumerator
    #[error("'{name}' is not an enumerator of {enum_name}")]
    UnknownEnumerator { enum_name: String, name: String },

    /// Copying fields through reflection failed
    #[error("record field conversion failed: {0}")]
    Reflect(#[from] ReflectError),

    /// Generic conversion failure
    #[error("conversion failed: {message}")]
    Failed { message: String },
}

/// Errors that can occur during one adapted native call.
#[derive(Debug, Error)]
pub enum NativeError {
    /// An argument could not be converted to the parameter's type
    #[error("argument {index}: {source}")]
    Argument {
        index: usize,
        #[source]
        source: ConversionError,
    },

    /// Wrong number of arguments
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// Error converting the return value
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Invalid receiver for method call
    #[error("invalid receiver: {message}")]
    InvalidThis { message: String },

    /// Receiver holds a different native type
    #[error("receiver type mismatch: expected {expected}, got {actual}")]
    ThisTypeMismatch {
        expected: &'static str,
        actual: String,
    },

    /// The native function returned an error; surfaced unchanged
    #[error("{0}")]
    Raised(Box<dyn StdError + Send + Sync + 'static>),

    /// Generic native error
    #[error("native error: {message}")]
    Other { message: String },
}

impl NativeError {
    /// Wrap a conversion failure of the argument at `index`.
    pub fn argument(index: usize, source: ConversionError) -> Self {
        NativeError::Argument { index, source }
    }

    /// Create an "invalid receiver" error with a message.
    pub fn invalid_this(message: impl Into<String>) -> Self {
        NativeError::InvalidThis {
            message: message.into(),
        }
    }

    /// Create a generic native error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other {
            message: message.into(),
        }
    }

    /// True when the call never reached native code because an argument did
    /// not convert. Overload resolution skips such failures.
    pub fn is_argument_mismatch(&self) -> bool {
        matches!(
            self,
            NativeError::Argument { .. }
                | NativeError::ArgumentCount { .. }
                | NativeError::ThisTypeMismatch { .. }
        )
    }

    /// Downcast an error returned by the native function back to its type.
    pub fn raised<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            NativeError::Raised(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Errors from descriptor pool registration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error("record type '{0}' is already registered")]
    DuplicateRecord(String),

    #[error("enum type '{0}' is already registered")]
    DuplicateEnum(String),

    #[error("'{0}' is not a valid fully-qualified name")]
    InvalidName(String),
}

/// Errors from calling through a [`Module`](crate::module::Module).
#[derive(Debug, Error)]
pub enum CallError {
    #[error("module '{module}' has no function '{name}'")]
    UnknownFunction { module: String, name: String },

    #[error("no overload of '{name}' accepts these arguments: {}", format_attempts(.attempts))]
    NoMatchingOverload {
        name: String,
        attempts: Vec<NativeError>,
    },

    #[error("'{0}' is not a valid function name")]
    InvalidName(String),

    #[error(transparent)]
    Native(#[from] NativeError),
}

fn format_attempts(attempts: &[NativeError]) -> String {
    attempts
        .iter()
        .enumerate()
        .map(|(i, err)| format!("[{}] {}", i, err))
        .collect::<Vec<_>>()
        .join("; ")
}

//! Error model for search parameters and wire documents.

use thiserror::Error;

/// Result type used by the codec.
pub type CodecResult<T> = Result<T, CodecError>;

/// A search parameter was malformed or incomplete.
///
/// Raised by the filter compiler before any store call is attempted. `index`
/// is the position of the offending parameter in its category list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("search parameter #{index}: type is required")]
    MissingType { index: usize },

    #[error("search parameter #{index}: field is required")]
    MissingField { index: usize },

    #[error(
        "search parameter #{index} ({field}): one of equal, lower_limit or upper_limit is required"
    )]
    MissingBound { index: usize, field: String },

    #[error(
        "search parameter #{index} ({field}): equal cannot be combined with lower_limit/upper_limit"
    )]
    ConflictingBounds { index: usize, field: String },

    #[error("search parameter #{index} ({field}): string parameters only support equal")]
    TextRange { index: usize, field: String },

    #[error("search parameter #{index} ({field}): cannot parse {value:?} as float: {reason}")]
    BadFloat {
        index: usize,
        field: String,
        value: String,
        reason: String,
    },

    #[error("search parameter #{index} ({field}): cannot parse {value:?} as int: {reason}")]
    BadInt {
        index: usize,
        field: String,
        value: String,
        reason: String,
    },

    #[error("search pair #{index} ({field}): value must be text or a number, found {found}")]
    UnsupportedValue {
        index: usize,
        field: String,
        found: String,
    },
}

impl ValidationError {
    /// Position of the rejected parameter.
    pub fn index(&self) -> usize {
        match self {
            ValidationError::MissingType { index }
            | ValidationError::MissingField { index }
            | ValidationError::MissingBound { index, .. }
            | ValidationError::ConflictingBounds { index, .. }
            | ValidationError::TextRange { index, .. }
            | ValidationError::BadFloat { index, .. }
            | ValidationError::BadInt { index, .. }
            | ValidationError::UnsupportedValue { index, .. } => *index,
        }
    }
}

/// A wire document could not be turned into the target entity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Identifier text present but not a valid 128-bit identifier.
    #[error("field {field}: malformed identifier {value:?}: {reason}")]
    MalformedIdentifier {
        field: String,
        value: String,
        reason: String,
    },

    /// The runtime representation cannot be coerced into the declared field type.
    #[error("field {field}: cannot coerce {found} to {expected}")]
    Coercion {
        field: String,
        expected: &'static str,
        found: String,
    },

    /// A grouped aggregation result did not have the expected shape.
    #[error("aggregate output field {field}: expected {expected}, found {found}")]
    AggregateShapeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },
}

impl CodecError {
    /// Name of the document field that failed to decode.
    pub fn field(&self) -> &str {
        match self {
            CodecError::MalformedIdentifier { field, .. }
            | CodecError::Coercion { field, .. }
            | CodecError::AggregateShapeMismatch { field, .. } => field,
        }
    }
}

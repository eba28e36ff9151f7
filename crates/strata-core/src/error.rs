use crate::{config::ConfigError, index::IndexError, tuple::TupleError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Domain errors (`IndexError`, `ConfigError`, `TupleError`) convert into it
/// at API boundaries that want one error type.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct an index-origin not-found error.
    pub(crate) fn index_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::NotFound, ErrorOrigin::Index, message)
    }

    /// Construct an index-origin conflict error.
    pub(crate) fn index_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Conflict, ErrorOrigin::Index, message)
    }

    /// Construct an index-origin invalid-argument error.
    pub(crate) fn index_invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidArgument, ErrorOrigin::Index, message)
    }

    /// Construct a measure-origin invalid-argument error.
    pub(crate) fn measure_invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidArgument, ErrorOrigin::Measure, message)
    }

    /// Construct a configuration-origin error.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Configuration, ErrorOrigin::Config, message)
    }

    /// Construct a tuple-origin invariant violation.
    pub(crate) fn tuple_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Tuple, message)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<IndexError> for InternalError {
    fn from(err: IndexError) -> Self {
        let message = err.to_string();

        match err {
            IndexError::KeyNotFound { .. } => Self::index_not_found(message),
            IndexError::DuplicateKey { .. } => Self::index_conflict(message),
            IndexError::ReplaceMissing { .. } => Self::index_invalid_argument(message),
            IndexError::UnknownMeasure { .. } => Self::measure_invalid_argument(message),
        }
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

impl From<TupleError> for InternalError {
    fn from(err: TupleError) -> Self {
        Self::tuple_invariant(err.to_string())
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    Conflict,
    InvalidArgument,
    Configuration,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidArgument => "invalid_argument",
            Self::Configuration => "configuration",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Config,
    Index,
    Measure,
    Tuple,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Index => "index",
            Self::Measure => "measure",
            Self::Tuple => "tuple",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

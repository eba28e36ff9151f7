use thiserror::Error as ThisError;

///
/// IndexError
///
/// Failures surfaced by ordered-index operations.
/// `KeyNotFound` is an expected outcome; the rest are caller errors.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum IndexError {
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("unique index violation: key {key} already present")]
    DuplicateKey { key: String },

    #[error("cannot replace missing item with key {key}")]
    ReplaceMissing { key: String },

    #[error("measure '{name}' is not defined for this index")]
    UnknownMeasure { name: String },
}

impl IndexError {
    pub(crate) fn key_not_found(key: &impl std::fmt::Debug) -> Self {
        Self::KeyNotFound {
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn duplicate_key(key: &impl std::fmt::Debug) -> Self {
        Self::DuplicateKey {
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn replace_missing(key: &impl std::fmt::Debug) -> Self {
        Self::ReplaceMissing {
            key: format!("{key:?}"),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

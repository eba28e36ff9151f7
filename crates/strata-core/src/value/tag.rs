use crate::value::Value;

///
/// ValueTag
///
/// Stable canonical value-variant tag used by ordering surfaces.
///
/// IMPORTANT:
/// Tag order decides cross-variant key order and must stay fixed once
/// indexes are populated.
///

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ValueTag {
    Null = 0,
    Bool = 1,
    Int = 2,
    Uint = 3,
    Text = 4,
    Blob = 5,
}

impl ValueTag {
    #[must_use]
    pub(crate) const fn of(value: &Value) -> Self {
        match value {
            Value::Blob(_) => Self::Blob,
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Null => Self::Null,
            Value::Text(_) => Self::Text,
            Value::Uint(_) => Self::Uint,
        }
    }

    #[must_use]
    pub(crate) const fn to_u8(self) -> u8 {
        self as u8
    }
}

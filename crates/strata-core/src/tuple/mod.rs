//! Module: tuple
//! Responsibility: fixed-shape value tuples, their shape descriptors, and
//! field-by-field comparison.
//! Does not own: index storage or segment discrimination policy.

pub mod transform;


use crate::{
    index::KeyComparer,
    range::Direction,
    value::{FieldKind, Value, canonical_cmp},
};
use derive_more::Deref;
use std::{cmp::Ordering, fmt, sync::Arc};
use thiserror::Error as ThisError;

///
/// TupleError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TupleError {
    #[error("tuple arity mismatch: expected {expected} fields, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("field {index} expects {expected}, found {found}")]
    FieldKindMismatch {
        index: usize,
        expected: FieldKind,
        found: FieldKind,
    },

    #[error("field {index} is null and its kind cannot be inferred")]
    UntypedNull { index: usize },
}

///
/// TupleDescriptor
///
/// Shared, immutable tuple shape. Cheap to clone; hashable so transform
/// caches can key on it.
///

#[derive(Clone, Debug, Deref, Eq, Hash, PartialEq)]
#[deref(forward)]
pub struct TupleDescriptor(Arc<[FieldKind]>);

impl TupleDescriptor {
    #[must_use]
    pub fn new(kinds: impl IntoIterator<Item = FieldKind>) -> Self {
        Self(kinds.into_iter().collect())
    }

    #[must_use]
    pub fn kinds(&self) -> &[FieldKind] {
        &self.0
    }

    /// Whether `prefix` describes the leading fields of this shape.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for TupleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{kind}")?;
        }
        write!(f, ")")
    }
}

///
/// Tuple
///
/// Ordered, typed field values. Immutable once constructed.
///

#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Tuple {
    descriptor: TupleDescriptor,
    values: Vec<Value>,
}

impl Tuple {
    /// Build a tuple, validating arity and per-field kinds.
    pub fn try_new(descriptor: TupleDescriptor, values: Vec<Value>) -> Result<Self, TupleError> {
        if descriptor.len() != values.len() {
            return Err(TupleError::ArityMismatch {
                expected: descriptor.len(),
                found: values.len(),
            });
        }

        for (index, (value, kind)) in values.iter().zip(descriptor.iter()).enumerate() {
            if let Some(found) = value.kind()
                && found != *kind
            {
                return Err(TupleError::FieldKindMismatch {
                    index,
                    expected: *kind,
                    found,
                });
            }
        }

        Ok(Self { descriptor, values })
    }

    /// Build a tuple whose shape is inferred from its values.
    pub fn from_values(values: Vec<Value>) -> Result<Self, TupleError> {
        let kinds = values
            .iter()
            .enumerate()
            .map(|(index, value)| value.kind().ok_or(TupleError::UntypedNull { index }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            descriptor: TupleDescriptor::new(kinds),
            values,
        })
    }

    // Callers guarantee `values` already matches `descriptor`.
    pub(crate) const fn from_parts(descriptor: TupleDescriptor, values: Vec<Value>) -> Self {
        Self { descriptor, values }
    }

    #[must_use]
    pub const fn descriptor(&self) -> &TupleDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn last(&self) -> Option<&Value> {
        self.values.last()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Leading `len` fields as a new tuple.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        assert!(
            len <= self.len(),
            "tuple prefix of {len} fields requested from a {}-field tuple",
            self.len()
        );

        Self {
            descriptor: TupleDescriptor::new(self.descriptor.iter().copied().take(len)),
            values: self.values[..len].to_vec(),
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tuple{self}")
    }
}

///
/// TupleComparer
///
/// Field-by-field canonical comparison with a sort direction per field.
/// Fields past the configured direction list sort `Positive`; a shorter
/// tuple sorts before a longer one sharing its prefix.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TupleComparer {
    directions: Arc<[Direction]>,
}

impl TupleComparer {
    #[must_use]
    pub fn new(directions: impl IntoIterator<Item = Direction>) -> Self {
        Self {
            directions: directions.into_iter().collect(),
        }
    }

    /// Comparer sorting every field `Positive`.
    #[must_use]
    pub fn ascending() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn direction_of(&self, field: usize) -> Direction {
        self.directions
            .get(field)
            .copied()
            .unwrap_or(Direction::Positive)
    }

    /// Comparer for the shape that appends one field after the first
    /// `width` fields.
    #[must_use]
    pub fn extended(&self, width: usize, direction: Direction) -> Self {
        let mut directions = (0..width).map(|i| self.direction_of(i)).collect::<Vec<_>>();
        directions.push(direction);

        Self::new(directions)
    }

    #[must_use]
    pub fn compare(&self, left: &Tuple, right: &Tuple) -> Ordering {
        self.compare_values(left.values(), right.values())
    }

    #[must_use]
    pub fn compare_values(&self, left: &[Value], right: &[Value]) -> Ordering {
        for (field, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let cmp = self.direction_of(field).apply(canonical_cmp(l, r));
            if cmp != Ordering::Equal {
                return cmp;
            }
        }

        left.len().cmp(&right.len())
    }

    /// Wrap into the generic comparer used by ordered indexes.
    #[must_use]
    pub fn key_comparer(&self) -> KeyComparer<Tuple> {
        let comparer = self.clone();
        KeyComparer::new(move |left: &Tuple, right: &Tuple| comparer.compare(left, right))
    }
}

//! Module: tuple::transform
//! Responsibility: cut-in / cut-out tuple transforms that splice a span of
//! fields into or out of a tuple, and the per-shape cache that memoizes them.
//! Boundary: composite indexes use these to map segment-local tuples into the
//! shared physical key space and back.
//!
//! Shape mismatches are programming errors and panic.

use crate::{
    tuple::{Tuple, TupleDescriptor},
    value::Value,
};
use std::{cell::RefCell, collections::HashMap};

///
/// Segment
///
/// Contiguous span of tuple fields: `offset..offset + length`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Segment {
    pub offset: usize,
    pub length: usize,
}

impl Segment {
    #[must_use]
    pub const fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// One-field span at `offset`.
    #[must_use]
    pub const fn single(offset: usize) -> Self {
        Self::new(offset, 1)
    }

    #[must_use]
    pub const fn end(self) -> usize {
        self.offset + self.length
    }
}

///
/// CutInTransform
///
/// Inserts `segment.length` fields of the `inserted` shape at
/// `segment.offset`, turning a `source`-shaped tuple into a `target`-shaped
/// one.
///

#[derive(Clone, Debug)]
pub struct CutInTransform {
    source: TupleDescriptor,
    inserted: TupleDescriptor,
    segment: Segment,
    target: TupleDescriptor,
}

impl CutInTransform {
    #[must_use]
    pub fn new(source: &TupleDescriptor, segment: Segment, inserted: &TupleDescriptor) -> Self {
        assert_eq!(
            segment.length,
            inserted.len(),
            "cut-in span length must match the inserted shape {inserted}"
        );
        assert!(
            segment.offset <= source.len(),
            "cut-in offset {} is past the end of source shape {source}",
            segment.offset
        );

        let kinds = source.kinds();
        let target = TupleDescriptor::new(
            kinds[..segment.offset]
                .iter()
                .chain(inserted.iter())
                .chain(kinds[segment.offset..].iter())
                .copied(),
        );

        Self {
            source: source.clone(),
            inserted: inserted.clone(),
            segment,
            target,
        }
    }

    #[must_use]
    pub const fn source(&self) -> &TupleDescriptor {
        &self.source
    }

    #[must_use]
    pub const fn target(&self) -> &TupleDescriptor {
        &self.target
    }

    #[must_use]
    pub const fn segment(&self) -> Segment {
        self.segment
    }

    /// Splice `values` into `tuple` at the configured offset.
    #[must_use]
    pub fn apply(&self, tuple: &Tuple, values: &[Value]) -> Tuple {
        assert_eq!(
            tuple.descriptor(),
            &self.source,
            "cut-in applied to a tuple of shape {} (expected {})",
            tuple.descriptor(),
            self.source
        );
        assert_eq!(
            values.len(),
            self.segment.length,
            "cut-in expects {} inserted values",
            self.segment.length
        );
        for (value, kind) in values.iter().zip(self.inserted.iter()) {
            assert!(
                value.fits(*kind),
                "cut-in value {value} does not fit field kind {kind}"
            );
        }

        let fields = tuple.values();
        let mut out = Vec::with_capacity(self.target.len());
        out.extend_from_slice(&fields[..self.segment.offset]);
        out.extend_from_slice(values);
        out.extend_from_slice(&fields[self.segment.offset..]);

        Tuple::from_parts(self.target.clone(), out)
    }

    #[must_use]
    pub fn apply_one(&self, tuple: &Tuple, value: Value) -> Tuple {
        self.apply(tuple, std::slice::from_ref(&value))
    }
}

///
/// CutOutTransform
///
/// Removes the `segment` span from a `source`-shaped tuple.
///

#[derive(Clone, Debug)]
pub struct CutOutTransform {
    source: TupleDescriptor,
    segment: Segment,
    target: TupleDescriptor,
}

impl CutOutTransform {
    #[must_use]
    pub fn new(source: &TupleDescriptor, segment: Segment) -> Self {
        assert!(
            segment.end() <= source.len(),
            "cut-out span {}..{} exceeds source shape {source}",
            segment.offset,
            segment.end()
        );

        let kinds = source.kinds();
        let target = TupleDescriptor::new(
            kinds[..segment.offset]
                .iter()
                .chain(kinds[segment.end()..].iter())
                .copied(),
        );

        Self {
            source: source.clone(),
            segment,
            target,
        }
    }

    #[must_use]
    pub const fn source(&self) -> &TupleDescriptor {
        &self.source
    }

    #[must_use]
    pub const fn target(&self) -> &TupleDescriptor {
        &self.target
    }

    #[must_use]
    pub const fn segment(&self) -> Segment {
        self.segment
    }

    #[must_use]
    pub fn apply(&self, tuple: &Tuple) -> Tuple {
        assert_eq!(
            tuple.descriptor(),
            &self.source,
            "cut-out applied to a tuple of shape {} (expected {})",
            tuple.descriptor(),
            self.source
        );

        let fields = tuple.values();
        let mut out = Vec::with_capacity(self.target.len());
        out.extend_from_slice(&fields[..self.segment.offset]);
        out.extend_from_slice(&fields[self.segment.end()..]);

        Tuple::from_parts(self.target.clone(), out)
    }

    /// The values `apply` would drop.
    #[must_use]
    pub fn removed<'t>(&self, tuple: &'t Tuple) -> &'t [Value] {
        &tuple.values()[self.segment.offset..self.segment.end()]
    }
}

type CutInKey = (TupleDescriptor, Segment, TupleDescriptor);
type CutOutKey = (TupleDescriptor, Segment);

///
/// TransformCache
///
/// Lazily populated transform memo keyed by tuple shape.
/// Single-writer: interior mutability is a `RefCell`, so the owning index is
/// `!Sync` and concurrent use needs an external lock.
///

#[derive(Debug, Default)]
pub struct TransformCache {
    cut_in: RefCell<HashMap<CutInKey, CutInTransform>>,
    cut_out: RefCell<HashMap<CutOutKey, CutOutTransform>>,
}

impl TransformCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cut_in(
        &self,
        source: &TupleDescriptor,
        segment: Segment,
        inserted: &TupleDescriptor,
    ) -> CutInTransform {
        let key = (source.clone(), segment, inserted.clone());

        self.cut_in
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| CutInTransform::new(source, segment, inserted))
            .clone()
    }

    pub fn cut_out(&self, source: &TupleDescriptor, segment: Segment) -> CutOutTransform {
        let key = (source.clone(), segment);

        self.cut_out
            .borrow_mut()
            .entry(key)
            .or_insert_with(|| CutOutTransform::new(source, segment))
            .clone()
    }

    /// Number of memoized transforms (both directions).
    #[must_use]
    pub fn len(&self) -> usize {
        self.cut_in.borrow().len() + self.cut_out.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

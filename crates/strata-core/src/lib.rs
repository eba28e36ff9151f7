//! Core runtime for Strata: ordered index contracts, segmented composite
//! indexes, differential overlay indexes, and the primitives they share.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod composite;
pub mod config;
pub mod differential;
pub mod error;
pub mod index;
pub mod measure;
pub mod obs;
pub mod range;
pub mod tuple;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

pub use error::InternalError as Error;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        composite::{CompositeIndex, IndexSegment},
        differential::DifferentialIndex,
        index::{IndexConfiguration, IndexReader, KeyComparer, MemoryIndex, OrderedIndex},
        measure::Measure,
        range::{Direction, Entire, Range, Ray},
        tuple::{Tuple, TupleComparer, TupleDescriptor},
        value::{FieldKind, Value},
    };
}

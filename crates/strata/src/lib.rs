//! ## Crate layout
//! - `core`: ordered index contracts, the in-memory index, segmented
//!   composite indexes, differential overlays, measures, configuration,
//!   and observability.
//!
//! The `prelude` module mirrors the surface most callers need: index types,
//! the traits that drive them, and the tuple/value vocabulary.

pub use strata_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::{
    Error,
    config::{ConfigError, IndexConfig},
    obs::{metrics_report, metrics_reset_all, with_metrics_sink},
};

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        composite::{
            CompositeIndex, CompositeIndexConfiguration, IndexSegment,
            IndexSegmentConfigurationSet,
        },
        config::IndexConfig,
        differential::DifferentialIndex,
        index::{
            IndexConfiguration, IndexReader as _, KeyComparer, MemoryIndex, OrderedIndex as _,
            SeekResult,
        },
        measure::Measure,
        range::{Direction, Entire, Range, Ray},
        tuple::{Tuple, TupleComparer, TupleDescriptor},
        value::{FieldKind, Value},
    };
}

/// Parse a TOML index description and build an in-memory composite index.
pub fn composite_from_toml(source: &str) -> Result<core::composite::CompositeIndex, Error> {
    let configuration = IndexConfig::from_toml_str(source)?.into_composite()?;
    let index = core::composite::CompositeIndex::new_in_memory(configuration)?;

    Ok(index)
}

///
/// TESTS
///

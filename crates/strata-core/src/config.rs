//! Module: config
//! Responsibility: declarative (TOML) composite index configuration and its
//! validation into a `CompositeIndexConfiguration`.
//! Does not own: building the physical index; see `CompositeIndex::new`.

use crate::{
    composite::{CompositeIndexConfiguration, IndexSegmentConfigurationSet},
    measure::{Measure, MeasureKind},
    range::Direction,
    tuple::{Tuple, TupleComparer, TupleDescriptor},
    value::FieldKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid index config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("composite index requires at least one segment")]
    EmptySegmentSet,

    #[error("segment '{name}' is declared more than once")]
    DuplicateSegment { name: String },

    #[error("measure '{name}' is declared more than once")]
    DuplicateMeasure { name: String },

    #[error("index key must have at least one field")]
    EmptyKey,

    #[error("key shape {key} is not a prefix of item shape {item}")]
    KeyNotItemPrefix { key: String, item: String },

    #[error("sum measure '{name}' does not name a field")]
    SumFieldMissing { name: String },

    #[error("measure '{name}' reads field {field}, but items have {width} fields")]
    MeasureFieldOutOfRange {
        name: String,
        field: usize,
        width: usize,
    },

    #[error("measure '{name}' reads field {field} of kind {kind}, which is not numeric")]
    MeasureFieldNotNumeric {
        name: String,
        field: usize,
        kind: FieldKind,
    },
}

///
/// FieldConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub kind: FieldKind,

    #[serde(default)]
    pub direction: Direction,
}

///
/// MeasureConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeasureConfig {
    pub name: String,
    pub kind: MeasureKind,

    #[serde(default)]
    pub field: Option<usize>,
}

///
/// IndexConfig
///
/// ```toml
/// segments = ["users", "orders"]
///
/// [[key]]
/// kind = "int"
///
/// [[values]]
/// kind = "text"
///
/// [[measures]]
/// name = "rows"
/// kind = "count"
/// ```
///
/// Item fields are the key fields followed by the value fields; measure
/// `field` indexes into that combined list.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    pub key: Vec<FieldConfig>,
    pub values: Vec<FieldConfig>,
    pub segments: Vec<String>,
    pub measures: Vec<MeasureConfig>,
}

impl IndexConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    #[must_use]
    pub fn key_descriptor(&self) -> TupleDescriptor {
        TupleDescriptor::new(self.key.iter().map(|field| field.kind))
    }

    #[must_use]
    pub fn item_descriptor(&self) -> TupleDescriptor {
        TupleDescriptor::new(self.key.iter().chain(&self.values).map(|field| field.kind))
    }

    /// Validate and build the composite configuration.
    pub fn into_composite(self) -> Result<CompositeIndexConfiguration, ConfigError> {
        if self.key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }

        let item = self.item_descriptor();
        let measures = self.build_measures(&item)?;
        let comparer = TupleComparer::new(self.key.iter().map(|field| field.direction));

        let configuration = CompositeIndexConfiguration::new(
            self.key_descriptor(),
            item,
            IndexSegmentConfigurationSet::new(self.segments),
        )
        .with_comparer(comparer)
        .with_measures(measures);

        configuration.validate()?;

        Ok(configuration)
    }

    fn build_measures(&self, item: &TupleDescriptor) -> Result<Vec<Measure<Tuple>>, ConfigError> {
        let mut seen = BTreeSet::new();
        let mut measures = Vec::with_capacity(self.measures.len());

        for config in &self.measures {
            if !seen.insert(config.name.as_str()) {
                return Err(ConfigError::DuplicateMeasure {
                    name: config.name.clone(),
                });
            }

            let measure = match config.kind {
                MeasureKind::Count => Measure::count(config.name.clone()),
                MeasureKind::Sum => {
                    let field = config.field.ok_or_else(|| ConfigError::SumFieldMissing {
                        name: config.name.clone(),
                    })?;
                    let kind = item.get(field).copied().ok_or_else(|| {
                        ConfigError::MeasureFieldOutOfRange {
                            name: config.name.clone(),
                            field,
                            width: item.len(),
                        }
                    })?;
                    if !kind.is_numeric() {
                        return Err(ConfigError::MeasureFieldNotNumeric {
                            name: config.name.clone(),
                            field,
                            kind,
                        });
                    }

                    Measure::sum_field(config.name.clone(), field)
                }
            };
            measures.push(measure);
        }

        Ok(measures)
    }
}

///
/// TESTS
///

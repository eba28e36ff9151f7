//! Module: measure
//! Responsibility: aggregate definitions over index items and the
//! incrementally maintained result sets indexes keep in sync with writes.
//! Does not own: deciding when a ranged query may use the maintained set.


use crate::{index::IndexError, tuple::Tuple, value::Value};
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt, sync::Arc};

type ValueOf<I> = Arc<dyn Fn(&I) -> i128 + Send + Sync>;

///
/// MeasureKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    Count,
    Sum,
}

///
/// Measure
///
/// Named aggregate that can be maintained under add/subtract.
///

pub struct Measure<I> {
    name: String,
    kind: MeasureKind,
    value_of: Option<ValueOf<I>>,
}

impl<I> Measure<I> {
    #[must_use]
    pub fn count(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MeasureKind::Count,
            value_of: None,
        }
    }

    #[must_use]
    pub fn sum(name: impl Into<String>, value_of: impl Fn(&I) -> i128 + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            kind: MeasureKind::Sum,
            value_of: Some(Arc::new(value_of)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> MeasureKind {
        self.kind
    }

    // What one item adds to (or removes from) the running result.
    fn contribution(&self, item: &I) -> i128 {
        match (&self.kind, &self.value_of) {
            (MeasureKind::Sum, Some(value_of)) => value_of(item),
            (MeasureKind::Sum, None) => 0,
            (MeasureKind::Count, _) => 1,
        }
    }
}

impl Measure<Tuple> {
    /// Sum over the numeric view of one tuple field; nulls and non-numeric
    /// values contribute zero.
    #[must_use]
    pub fn sum_field(name: impl Into<String>, field: usize) -> Self {
        Self::sum(name, move |item: &Tuple| {
            item.get(field).and_then(Value::as_i128).unwrap_or(0)
        })
    }
}

impl<I> Clone for Measure<I> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            value_of: self.value_of.clone(),
        }
    }
}

impl<I> fmt::Debug for Measure<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Measure")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

///
/// MeasureResultSet
///
/// One running result per measure definition.
/// `add`/`subtract` are exact inverses (wrapping arithmetic).
///

pub struct MeasureResultSet<I> {
    measures: Arc<[Measure<I>]>,
    results: Vec<i128>,
}

impl<I> MeasureResultSet<I> {
    #[must_use]
    pub fn new(measures: Arc<[Measure<I>]>) -> Self {
        let results = vec![0; measures.len()];

        Self { measures, results }
    }

    pub fn add(&mut self, item: &I) {
        for (result, measure) in self.results.iter_mut().zip(self.measures.iter()) {
            *result = result.wrapping_add(measure.contribution(item));
        }
    }

    pub fn subtract(&mut self, item: &I) {
        for (result, measure) in self.results.iter_mut().zip(self.measures.iter()) {
            *result = result.wrapping_sub(measure.contribution(item));
        }
    }

    pub fn reset(&mut self) {
        self.results.fill(0);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<i128> {
        self.measures
            .iter()
            .position(|measure| measure.name() == name)
            .map(|i| self.results[i])
    }

    /// Result for `name`; undefined names are a caller error.
    pub fn result(&self, name: &str) -> Result<i128, IndexError> {
        self.get(name).ok_or_else(|| IndexError::UnknownMeasure {
            name: name.to_string(),
        })
    }

    /// Results for several measures, in the order requested.
    pub fn get_measurements(&self, names: &[&str]) -> Result<Vec<i128>, IndexError> {
        names.iter().map(|name| self.result(name)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i128)> {
        self.measures
            .iter()
            .zip(self.results.iter())
            .map(|(measure, result)| (measure.name(), *result))
    }

    #[must_use]
    pub fn results(&self) -> &[i128] {
        &self.results
    }

    #[must_use]
    pub fn measures(&self) -> &Arc<[Measure<I>]> {
        &self.measures
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl<I> Clone for MeasureResultSet<I> {
    fn clone(&self) -> Self {
        Self {
            measures: Arc::clone(&self.measures),
            results: self.results.clone(),
        }
    }
}

impl<I> PartialEq for MeasureResultSet<I> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<I> fmt::Debug for MeasureResultSet<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Compute every measure from scratch over `items`.
pub fn batch_calculate<I, T>(
    measures: &Arc<[Measure<I>]>,
    items: impl IntoIterator<Item = T>,
) -> MeasureResultSet<I>
where
    T: Borrow<I>,
{
    let mut results = MeasureResultSet::new(Arc::clone(measures));
    for item in items {
        results.add(item.borrow());
    }

    results
}

use crate::measure::{Measure, MeasureResultSet};
use std::{cmp::Ordering, fmt, sync::Arc};

type CompareFn<K> = dyn Fn(&K, &K) -> Ordering + Send + Sync;
type ExtractFn<K, I> = dyn Fn(&I) -> K + Send + Sync;

///
/// KeyComparer
///
/// Shared total order over keys.
///

pub struct KeyComparer<K>(Arc<CompareFn<K>>);

impl<K> KeyComparer<K> {
    pub fn new(compare: impl Fn(&K, &K) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Arc::new(compare))
    }

    #[must_use]
    pub fn compare(&self, left: &K, right: &K) -> Ordering {
        (self.0)(left, right)
    }

    #[must_use]
    pub fn equals(&self, left: &K, right: &K) -> bool {
        self.compare(left, right) == Ordering::Equal
    }
}

impl<K: Ord + 'static> KeyComparer<K> {
    /// The key type's own `Ord`.
    #[must_use]
    pub fn natural() -> Self {
        Self::new(K::cmp)
    }
}

impl<K> Clone for KeyComparer<K> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<K> fmt::Debug for KeyComparer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyComparer")
    }
}

///
/// IndexConfiguration
///
/// Everything needed to build an ordered index over items `I` keyed by `K`:
/// key extraction, key order, and the measures to maintain.
///

pub struct IndexConfiguration<K, I> {
    key_extractor: Arc<ExtractFn<K, I>>,
    key_comparer: KeyComparer<K>,
    measures: Arc<[Measure<I>]>,
}

impl<K, I> IndexConfiguration<K, I> {
    pub fn new(
        key_extractor: impl Fn(&I) -> K + Send + Sync + 'static,
        key_comparer: KeyComparer<K>,
    ) -> Self {
        Self {
            key_extractor: Arc::new(key_extractor),
            key_comparer,
            measures: Arc::from(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_measure(self, measure: Measure<I>) -> Self {
        let mut measures = self.measures.to_vec();
        measures.push(measure);

        self.with_measures(measures)
    }

    #[must_use]
    pub fn with_measures(self, measures: impl IntoIterator<Item = Measure<I>>) -> Self {
        Self {
            measures: measures.into_iter().collect(),
            ..self
        }
    }

    #[must_use]
    pub fn extract_key(&self, item: &I) -> K {
        (self.key_extractor)(item)
    }

    #[must_use]
    pub const fn key_comparer(&self) -> &KeyComparer<K> {
        &self.key_comparer
    }

    #[must_use]
    pub const fn measures(&self) -> &Arc<[Measure<I>]> {
        &self.measures
    }

    /// Fresh, zeroed result set for this configuration's measures.
    #[must_use]
    pub fn new_measure_results(&self) -> MeasureResultSet<I> {
        MeasureResultSet::new(Arc::clone(&self.measures))
    }
}

impl<K: Ord + 'static, I> IndexConfiguration<K, I> {
    /// Configuration ordered by the key type's own `Ord`.
    pub fn natural(key_extractor: impl Fn(&I) -> K + Send + Sync + 'static) -> Self {
        Self::new(key_extractor, KeyComparer::natural())
    }
}

impl<K, I> Clone for IndexConfiguration<K, I> {
    fn clone(&self) -> Self {
        Self {
            key_extractor: Arc::clone(&self.key_extractor),
            key_comparer: self.key_comparer.clone(),
            measures: Arc::clone(&self.measures),
        }
    }
}

impl<K, I> fmt::Debug for IndexConfiguration<K, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexConfiguration")
            .field("measures", &self.measures)
            .finish_non_exhaustive()
    }
}

//! Module: index::memory
//! Responsibility: in-memory unique ordered index over a sorted vector.
//! Readers borrow the index, so the store cannot change under an open
//! reader.

use crate::{
    index::{IndexConfiguration, IndexError, IndexReader, OrderedIndex, SeekResult},
    measure::MeasureResultSet,
    obs::sink::{self, IndexKind, MetricsEvent},
    range::{Direction, Entire, Range, Ray},
};
use std::{cmp::Ordering, fmt};

///
/// MemoryIndex
///
/// Items sorted ascending by extracted key under the configured comparer;
/// lookups binary search with `partition_point`.
///

pub struct MemoryIndex<K, I> {
    configuration: IndexConfiguration<K, I>,
    items: Vec<I>,
    measures: MeasureResultSet<I>,
}

impl<K, I> MemoryIndex<K, I>
where
    K: Clone + fmt::Debug,
    I: Clone,
{
    #[must_use]
    pub fn new(configuration: IndexConfiguration<K, I>) -> Self {
        let measures = configuration.new_measure_results();

        Self {
            configuration,
            items: Vec::new(),
            measures,
        }
    }

    /// Build from items in any order; duplicate keys are rejected.
    pub fn from_items(
        configuration: IndexConfiguration<K, I>,
        items: impl IntoIterator<Item = I>,
    ) -> Result<Self, IndexError> {
        let mut index = Self::new(configuration);
        for item in items {
            index.add(item)?;
        }

        Ok(index)
    }

    /// Items in ascending key order.
    #[must_use]
    pub fn items(&self) -> &[I] {
        &self.items
    }

    fn compare_item(&self, item: &I, key: &K) -> Ordering {
        let item_key = self.configuration.extract_key(item);
        self.configuration.key_comparer().compare(&item_key, key)
    }

    // Index of the item with `key`, or the insertion point.
    fn search(&self, key: &K) -> Result<usize, usize> {
        let at = self
            .items
            .partition_point(|item| self.compare_item(item, key) == Ordering::Less);

        match self.items.get(at) {
            Some(item) if self.compare_item(item, key) == Ordering::Equal => Ok(at),
            _ => Err(at),
        }
    }

    // First index whose key is not below `point`.
    fn lower_position(&self, point: &Entire<K>) -> usize {
        let comparer = self.configuration.key_comparer();
        self.items.partition_point(|item| {
            point.compare_key(&self.configuration.extract_key(item), comparer) == Ordering::Greater
        })
    }

    // First index whose key is above `point`.
    fn upper_position(&self, point: &Entire<K>) -> usize {
        let comparer = self.configuration.key_comparer();
        self.items.partition_point(|item| {
            point.compare_key(&self.configuration.extract_key(item), comparer) != Ordering::Less
        })
    }

    // `[lo, hi)` slice covered by `range`; empty ranges collapse to `lo == hi`.
    fn bounds(&self, range: &Range<Entire<K>>) -> (usize, usize) {
        let lo = self.lower_position(range.first());
        let hi = self.upper_position(range.second());

        (lo, hi.max(lo))
    }
}

impl<K, I> OrderedIndex<K, I> for MemoryIndex<K, I>
where
    K: Clone + fmt::Debug,
    I: Clone,
{
    fn configuration(&self) -> &IndexConfiguration<K, I> {
        &self.configuration
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_ok()
    }

    fn get_item(&self, key: &K) -> Result<I, IndexError> {
        self.search(key)
            .map(|at| self.items[at].clone())
            .map_err(|_| IndexError::key_not_found(key))
    }

    fn seek(&self, ray: &Ray<Entire<K>>) -> SeekResult<I> {
        let point = ray.point();
        let found = match ray.direction() {
            Direction::Positive => {
                let at = self.lower_position(point);
                self.items.get(at)
            }
            Direction::Negative => {
                let at = self.upper_position(point);
                at.checked_sub(1).and_then(|at| self.items.get(at))
            }
        };

        let result = match (found, point) {
            (None, _) => SeekResult::None,
            (Some(item), Entire::Exact(key)) if self.compare_item(item, key) == Ordering::Equal => {
                SeekResult::Exact(item.clone())
            }
            (Some(item), _) => SeekResult::Nearest(item.clone()),
        };

        sink::record(MetricsEvent::Seek {
            index: IndexKind::Memory,
            outcome: result.result_type(),
        });

        result
    }

    fn create_reader<'a>(
        &'a self,
        range: &Range<Entire<K>>,
        direction: Direction,
    ) -> Box<dyn IndexReader<K, I> + 'a> {
        sink::record(MetricsEvent::ReaderOpen {
            index: IndexKind::Memory,
        });

        Box::new(MemoryIndexReader::new(self, range.clone(), direction))
    }

    fn add(&mut self, item: I) -> Result<(), IndexError> {
        let key = self.configuration.extract_key(&item);
        match self.search(&key) {
            Ok(_) => Err(IndexError::duplicate_key(&key)),
            Err(at) => {
                self.measures.add(&item);
                self.items.insert(at, item);
                Ok(())
            }
        }
    }

    fn remove(&mut self, item: &I) -> bool {
        let key = self.configuration.extract_key(item);
        self.remove_key(&key)
    }

    fn remove_key(&mut self, key: &K) -> bool {
        match self.search(key) {
            Ok(at) => {
                let removed = self.items.remove(at);
                self.measures.subtract(&removed);
                true
            }
            Err(_) => false,
        }
    }

    fn replace(&mut self, item: I) -> Result<(), IndexError> {
        let key = self.configuration.extract_key(&item);
        let at = self
            .search(&key)
            .map_err(|_| IndexError::replace_missing(&key))?;

        self.measures.add(&item);
        let old = std::mem::replace(&mut self.items[at], item);
        self.measures.subtract(&old);

        Ok(())
    }

    fn clear(&mut self) {
        self.items.clear();
        self.measures.reset();
    }

    fn measure_results(&self) -> &MeasureResultSet<I> {
        &self.measures
    }
}

impl<K, I> fmt::Debug for MemoryIndex<K, I>
where
    I: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryIndex")
            .field("items", &self.items)
            .field("measures", &self.measures)
            .finish_non_exhaustive()
    }
}

///
/// MemoryIndexReader
///
/// Cursor over the `[lo, hi)` slice a range covers. `pending` is the next
/// slot to yield going up, or one past it going down.
///

pub struct MemoryIndexReader<'a, K, I> {
    index: &'a MemoryIndex<K, I>,
    range: Range<Entire<K>>,
    direction: Direction,
    lo: usize,
    hi: usize,
    pending: usize,
    current: Option<usize>,
}

impl<'a, K, I> MemoryIndexReader<'a, K, I>
where
    K: Clone + fmt::Debug,
    I: Clone,
{
    fn new(index: &'a MemoryIndex<K, I>, range: Range<Entire<K>>, direction: Direction) -> Self {
        let (lo, hi) = index.bounds(&range);
        let pending = match direction {
            Direction::Positive => lo,
            Direction::Negative => hi,
        };

        Self {
            index,
            range,
            direction,
            lo,
            hi,
            pending,
            current: None,
        }
    }
}

impl<K, I> IndexReader<K, I> for MemoryIndexReader<'_, K, I>
where
    K: Clone + fmt::Debug,
    I: Clone,
{
    fn range(&self) -> &Range<Entire<K>> {
        &self.range
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn current(&self) -> Option<&I> {
        self.current.map(|at| &self.index.items[at])
    }

    fn move_next(&mut self) -> bool {
        match self.direction {
            Direction::Positive if self.pending < self.hi => {
                self.current = Some(self.pending);
                self.pending += 1;
                true
            }
            Direction::Negative if self.pending > self.lo => {
                self.pending -= 1;
                self.current = Some(self.pending);
                true
            }
            _ => {
                self.current = None;
                false
            }
        }
    }

    fn move_to(&mut self, point: &Entire<K>) {
        let at = match self.direction {
            Direction::Positive => self.index.lower_position(point),
            Direction::Negative => self.index.upper_position(point),
        };

        self.pending = at.clamp(self.lo, self.hi);
        self.current = None;
    }

    fn reset(&mut self) {
        self.pending = match self.direction {
            Direction::Positive => self.lo,
            Direction::Negative => self.hi,
        };
        self.current = None;
    }
}

//! Module: index
//! Responsibility: the ordered-index contract (lookups, seeks, readers,
//! writes, measures) and the in-memory physical index implementing it.
//! Does not own: segment multiplexing or overlay merging; those are
//! compositions over this contract.

mod config;
mod error;
mod memory;

#[cfg(test)]
mod tests;

use crate::{
    measure::{MeasureResultSet, batch_calculate},
    range::{Direction, Entire, Range, Ray},
};

// re-exports
pub use config::{IndexConfiguration, KeyComparer};
pub use error::IndexError;
pub use memory::{MemoryIndex, MemoryIndexReader};

///
/// SeekResultType
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SeekResultType {
    None,
    Nearest,
    Exact,
}

///
/// SeekResult
///
/// `Exact`: the ray's point matched a key.
/// `Nearest`: the next item in the ray's direction.
/// `None`: nothing lies in that direction.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SeekResult<I> {
    None,
    Nearest(I),
    Exact(I),
}

impl<I> SeekResult<I> {
    #[must_use]
    pub const fn result_type(&self) -> SeekResultType {
        match self {
            Self::None => SeekResultType::None,
            Self::Nearest(_) => SeekResultType::Nearest,
            Self::Exact(_) => SeekResultType::Exact,
        }
    }

    #[must_use]
    pub const fn item(&self) -> Option<&I> {
        match self {
            Self::None => None,
            Self::Nearest(item) | Self::Exact(item) => Some(item),
        }
    }

    #[must_use]
    pub fn into_item(self) -> Option<I> {
        match self {
            Self::None => None,
            Self::Nearest(item) | Self::Exact(item) => Some(item),
        }
    }

    #[must_use]
    pub const fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Transform the found item, keeping the result type.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(I) -> U) -> SeekResult<U> {
        match self {
            Self::None => SeekResult::None,
            Self::Nearest(item) => SeekResult::Nearest(f(item)),
            Self::Exact(item) => SeekResult::Exact(f(item)),
        }
    }
}

///
/// IndexReader
///
/// Restartable cursor over one range of an index in one direction.
/// `current` is `None` before the first `move_next` and after exhaustion.
/// Resources are released on drop.
///

pub trait IndexReader<K, I> {
    fn range(&self) -> &Range<Entire<K>>;

    fn direction(&self) -> Direction;

    fn current(&self) -> Option<&I>;

    /// Advance; returns `false` (repeatedly) once the range is exhausted.
    fn move_next(&mut self) -> bool;

    /// Position so the next `move_next` lands on the first item at or past
    /// `point` in scan direction, clamped to the range.
    fn move_to(&mut self, point: &Entire<K>);

    /// Position back at the range start.
    fn reset(&mut self);
}

///
/// ReaderIter
///
/// Owned-item iterator over any reader.
///

pub struct ReaderIter<'a, K, I> {
    reader: Box<dyn IndexReader<K, I> + 'a>,
}

impl<'a, K, I> ReaderIter<'a, K, I> {
    #[must_use]
    pub fn new(reader: Box<dyn IndexReader<K, I> + 'a>) -> Self {
        Self { reader }
    }
}

impl<K, I: Clone> Iterator for ReaderIter<'_, K, I> {
    type Item = I;

    fn next(&mut self) -> Option<I> {
        if self.reader.move_next() {
            self.reader.current().cloned()
        } else {
            None
        }
    }
}

///
/// OrderedIndex
///
/// Unique, ordered `key -> item` store.
///
/// Keys are compared with the configured `KeyComparer`; `contains` and
/// `remove` identify items by their extracted key.
///

pub trait OrderedIndex<K, I>
where
    K: Clone,
    I: Clone,
{
    fn configuration(&self) -> &IndexConfiguration<K, I>;

    /// Number of items visible through this index.
    fn count(&self) -> usize;

    fn contains_key(&self, key: &K) -> bool;

    fn get_item(&self, key: &K) -> Result<I, IndexError>;

    fn seek(&self, ray: &Ray<Entire<K>>) -> SeekResult<I>;

    fn create_reader<'a>(
        &'a self,
        range: &Range<Entire<K>>,
        direction: Direction,
    ) -> Box<dyn IndexReader<K, I> + 'a>;

    /// Insert a new item; `DuplicateKey` when its key is already present.
    fn add(&mut self, item: I) -> Result<(), IndexError>;

    fn remove(&mut self, item: &I) -> bool;

    fn remove_key(&mut self, key: &K) -> bool;

    /// Swap the stored item sharing `item`'s key.
    fn replace(&mut self, item: I) -> Result<(), IndexError>;

    fn clear(&mut self);

    /// Incrementally maintained results over every visible item.
    fn measure_results(&self) -> &MeasureResultSet<I>;

    //
    // provided
    //

    fn key_of(&self, item: &I) -> K {
        self.configuration().extract_key(item)
    }

    fn key_comparer<'s>(&'s self) -> &'s KeyComparer<K>
    where
        K: 's,
        I: 's,
    {
        self.configuration().key_comparer()
    }

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn contains(&self, item: &I) -> bool {
        self.contains_key(&self.key_of(item))
    }

    /// `get_item` with not-found mapped to `None`.
    fn try_get_item(&self, key: &K) -> Option<I> {
        self.get_item(key).ok()
    }

    fn seek_key(&self, key: &K) -> SeekResult<I> {
        self.seek(&Ray::exact(key.clone()))
    }

    fn iter<'a>(&'a self, range: &Range<Entire<K>>, direction: Direction) -> ReaderIter<'a, K, I> {
        ReaderIter::new(self.create_reader(range, direction))
    }

    /// Measure results over `range`: the maintained set for the full range,
    /// otherwise a fresh batch over the items in range.
    fn get_measure_results(&self, range: &Range<Entire<K>>) -> MeasureResultSet<I> {
        if range.is_full() {
            return self.measure_results().clone();
        }

        let measures = self.configuration().measures();
        batch_calculate(measures, self.iter(range, Direction::Positive))
    }

    fn get_measure_result(&self, range: &Range<Entire<K>>, name: &str) -> Result<i128, IndexError> {
        if range.is_full() {
            return self.measure_results().result(name);
        }

        self.get_measure_results(range).result(name)
    }
}

//! Module: differential
//! Responsibility: copy-on-write overlay over an ordered index. Writes land
//! in fresh `insertions`/`removals` indexes; reads merge them with the
//! untouched `origin`.
//! Does not own: merging the overlay back into origin, or rolling it back.
//! `into_parts` hands the three indexes to whoever does.

mod reader;

#[cfg(test)]
mod tests;

use crate::{
    index::{
        IndexConfiguration, IndexError, IndexReader, MemoryIndex, OrderedIndex, SeekResult,
    },
    measure::{MeasureResultSet, batch_calculate},
    obs::sink::{self, IndexKind, MetricsEvent},
    range::{Direction, Entire, Range, Ray},
};
use std::{cmp::Ordering, fmt, marker::PhantomData};
use tracing::{debug, trace};

// re-exports
pub use reader::DifferentialIndexReader;

///
/// DifferentialIndex
///
/// Visible contents:
/// `insertions ∪ (origin \ removals)`.
///
/// A key in both `insertions` and `removals` was deleted from origin and
/// re-added. No key is live in origin and present in insertions at once.
///

pub struct DifferentialIndex<K, I, O, X = MemoryIndex<K, I>> {
    origin: O,
    insertions: X,
    removals: X,
    measures: MeasureResultSet<I>,
    count: usize,
    _key: PhantomData<fn() -> K>,
}

impl<K, I, O> DifferentialIndex<K, I, O>
where
    K: Clone + fmt::Debug,
    I: Clone,
    O: OrderedIndex<K, I>,
{
    /// Overlay `origin` with in-memory insertions and removals.
    pub fn new(origin: O) -> Self {
        Self::with_factory(origin, MemoryIndex::new)
    }
}

impl<K, I, O, X> DifferentialIndex<K, I, O, X>
where
    K: Clone + fmt::Debug,
    I: Clone,
    O: OrderedIndex<K, I>,
    X: OrderedIndex<K, I>,
{
    /// Overlay `origin`, building the empty insertions and removals indexes
    /// with `factory` from origin's configuration.
    pub fn with_factory(origin: O, mut factory: impl FnMut(IndexConfiguration<K, I>) -> X) -> Self {
        let configuration = origin.configuration().clone();
        let insertions = factory(configuration.clone());
        let removals = factory(configuration);

        let measures = batch_calculate(
            origin.configuration().measures(),
            origin.iter(&Range::full(), Direction::Positive),
        );
        let count = origin.count();

        Self {
            origin,
            insertions,
            removals,
            measures,
            count,
            _key: PhantomData,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> &O {
        &self.origin
    }

    #[must_use]
    pub const fn insertions(&self) -> &X {
        &self.insertions
    }

    /// Tombstones: origin items hidden by this overlay.
    #[must_use]
    pub const fn removals(&self) -> &X {
        &self.removals
    }

    /// `(origin, insertions, removals)`.
    #[must_use]
    pub fn into_parts(self) -> (O, X, X) {
        (self.origin, self.insertions, self.removals)
    }

    fn is_live_in_origin(&self, key: &K) -> bool {
        self.origin.contains_key(key) && !self.removals.contains_key(key)
    }

    // Record `item` as removed; false when its key is already tombstoned.
    fn tombstone(&mut self, item: I) -> bool {
        self.removals.add(item).is_ok()
    }

    fn insert(&mut self, item: I) -> Result<(), IndexError> {
        self.insertions.add(item.clone())?;
        self.measures.add(&item);
        self.count += 1;

        sink::record(MetricsEvent::OverlayInsert);

        Ok(())
    }

    // First live origin item along `ray`, stepping over tombstones.
    fn seek_origin(&self, ray: &Ray<Entire<K>>) -> Option<SeekResult<I>> {
        let found = self.origin.seek(ray);
        let item = found.item()?;
        if !self.removals.contains(item) {
            return Some(found);
        }

        let direction = ray.direction();
        let range = Range::from_ray(ray.point().clone(), direction);
        let mut reader = self.origin.create_reader(&range, direction);
        let mut skipped = 0u64;
        let mut live = None;

        while reader.move_next() {
            let Some(item) = reader.current() else {
                break;
            };
            if !self.removals.contains(item) {
                live = Some(SeekResult::Nearest(item.clone()));
                break;
            }
            skipped += 1;
        }

        sink::record(MetricsEvent::TombstonesSkipped { rows: skipped });

        live
    }
}

impl<K, I, O, X> OrderedIndex<K, I> for DifferentialIndex<K, I, O, X>
where
    K: Clone + fmt::Debug,
    I: Clone,
    O: OrderedIndex<K, I>,
    X: OrderedIndex<K, I>,
{
    fn configuration(&self) -> &IndexConfiguration<K, I> {
        self.origin.configuration()
    }

    fn count(&self) -> usize {
        self.count
    }

    fn contains_key(&self, key: &K) -> bool {
        self.insertions.contains_key(key) || self.is_live_in_origin(key)
    }

    fn get_item(&self, key: &K) -> Result<I, IndexError> {
        if let Ok(item) = self.insertions.get_item(key) {
            return Ok(item);
        }
        if self.removals.contains_key(key) {
            return Err(IndexError::key_not_found(key));
        }

        self.origin.get_item(key)
    }

    fn seek(&self, ray: &Ray<Entire<K>>) -> SeekResult<I> {
        let origin = self.seek_origin(ray);

        let result = match origin {
            Some(hit @ SeekResult::Exact(_)) => hit,
            origin => {
                let inserted = self.insertions.seek(ray);

                match (origin, inserted) {
                    (None, inserted) => inserted,
                    (_, inserted @ SeekResult::Exact(_)) => inserted,
                    (Some(origin), SeekResult::None) => origin,
                    (Some(origin), inserted) => {
                        let closer = match (origin.item(), inserted.item()) {
                            (Some(o), Some(i)) => ray
                                .direction()
                                .apply(self.key_comparer().compare(&self.key_of(o), &self.key_of(i))),
                            _ => Ordering::Greater,
                        };

                        if closer == Ordering::Less {
                            origin
                        } else {
                            inserted
                        }
                    }
                }
            }
        };

        sink::record(MetricsEvent::Seek {
            index: IndexKind::Differential,
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
            index: IndexKind::Differential,
        });

        Box::new(DifferentialIndexReader::new(
            self.origin.configuration(),
            range.clone(),
            direction,
            self.origin.create_reader(range, direction),
            self.insertions.create_reader(range, direction),
            self.removals.create_reader(range, direction),
        ))
    }

    /// Make `item` visible. Adding a key that is already visible is a no-op.
    fn add(&mut self, item: I) -> Result<(), IndexError> {
        let key = self.key_of(&item);
        if self.contains_key(&key) {
            trace!(key = ?key, "overlay add of a visible key ignored");
            return Ok(());
        }

        self.insert(item)
    }

    fn remove(&mut self, item: &I) -> bool {
        let key = self.key_of(item);
        self.remove_key(&key)
    }

    fn remove_key(&mut self, key: &K) -> bool {
        let removed = if self.is_live_in_origin(key) {
            self.origin.get_item(key).ok()
        } else {
            let inserted = self.insertions.get_item(key).ok();
            if inserted.is_some() {
                self.insertions.remove_key(key);
            }
            inserted
        };

        let Some(item) = removed else {
            return false;
        };

        self.measures.subtract(&item);
        self.count -= 1;
        if self.tombstone(item) {
            sink::record(MetricsEvent::OverlayTombstone);
        }

        true
    }

    fn replace(&mut self, item: I) -> Result<(), IndexError> {
        let key = self.key_of(&item);

        if let Ok(old) = self.insertions.get_item(&key) {
            self.insertions.replace(item.clone())?;
            self.measures.subtract(&old);
            self.measures.add(&item);

            return Ok(());
        }

        if !self.is_live_in_origin(&key) {
            return Err(IndexError::replace_missing(&key));
        }

        let old = self.origin.get_item(&key)?;
        self.measures.subtract(&old);
        self.count -= 1;
        if self.tombstone(old) {
            sink::record(MetricsEvent::OverlayTombstone);
        }

        self.insert(item)
    }

    fn clear(&mut self) {
        let visible_origin = self
            .origin
            .iter(&Range::full(), Direction::Positive)
            .filter(|item| !self.removals.contains(item))
            .collect::<Vec<_>>();
        let inserted = self
            .insertions
            .iter(&Range::full(), Direction::Positive)
            .collect::<Vec<_>>();

        let mut tombstones = 0u64;
        for item in visible_origin.into_iter().chain(inserted) {
            if self.tombstone(item) {
                tombstones += 1;
            }
        }

        self.insertions.clear();
        self.measures.reset();
        self.count = 0;

        debug!(tombstones, "overlay cleared");
        sink::record(MetricsEvent::OverlayClear { tombstones });
    }

    fn measure_results(&self) -> &MeasureResultSet<I> {
        &self.measures
    }
}

impl<K, I, O, X> fmt::Debug for DifferentialIndex<K, I, O, X>
where
    O: fmt::Debug,
    X: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifferentialIndex")
            .field("origin", &self.origin)
            .field("insertions", &self.insertions)
            .field("removals", &self.removals)
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

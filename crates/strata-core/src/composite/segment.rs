use crate::{
    composite::{CompositeLayout, IndexSegmentReader, SegmentState},
    index::{IndexConfiguration, IndexError, IndexReader, OrderedIndex, SeekResult},
    measure::MeasureResultSet,
    obs::sink::{self, IndexKind, MetricsEvent},
    range::{Direction, Entire, Range, Ray},
    tuple::{Tuple, transform::TransformCache},
    value::Value,
};
use std::fmt;
use tracing::debug;

///
/// IndexSegment
///
/// One named logical index inside a `CompositeIndex`. Stores nothing of
/// its own: every call translates local keys, items and ranges into the
/// physical key space (segment number appended) and results back.
///

pub struct IndexSegment<'a, X> {
    physical: &'a mut X,
    state: &'a mut SegmentState,
    local: &'a IndexConfiguration<Tuple, Tuple>,
    layout: &'a CompositeLayout,
    cache: &'a TransformCache,
}

impl<'a, X> IndexSegment<'a, X>
where
    X: OrderedIndex<Tuple, Tuple>,
{
    pub(crate) const fn new(
        physical: &'a mut X,
        state: &'a mut SegmentState,
        local: &'a IndexConfiguration<Tuple, Tuple>,
        layout: &'a CompositeLayout,
        cache: &'a TransformCache,
    ) -> Self {
        Self {
            physical,
            state,
            local,
            layout,
            cache,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Discriminator stored as the trailing field of this segment's rows.
    #[must_use]
    pub const fn number(&self) -> usize {
        self.state.number
    }

    fn discriminator(&self) -> Value {
        self.state.discriminator.clone()
    }

    fn physical_key(&self, key: &Tuple) -> Tuple {
        self.layout
            .key_cut_in(self.cache)
            .apply_one(key, self.discriminator())
    }

    fn physical_item(&self, item: &Tuple) -> Tuple {
        self.layout
            .item_cut_in(self.cache)
            .apply_one(item, self.discriminator())
    }

    fn local_item(&self, item: &Tuple) -> Tuple {
        self.layout.item_cut_out(self.cache).apply(item)
    }

    fn physical_entire(&self, entire: &Entire<Tuple>) -> Entire<Tuple> {
        entire.map_ref(|key| self.physical_key(key))
    }

    fn owns(&self, physical_item: &Tuple) -> bool {
        physical_item.last() == Some(&self.state.discriminator)
    }

    // Physical hit from another segment: scan from the ray point with the
    // segment filter for the first row of ours.
    fn seek_past_foreign(&self, point: &Entire<Tuple>, direction: Direction) -> SeekResult<Tuple> {
        sink::record(MetricsEvent::SegmentSeekFallback);

        debug!(
            segment = %self.state.name,
            ?point,
            ?direction,
            "segment seek landed on a foreign row, scanning"
        );

        let range = Range::from_ray(point.clone(), direction);
        let mut reader = self.create_reader(&range, direction);

        if reader.move_next() {
            reader
                .current()
                .cloned()
                .map_or(SeekResult::None, SeekResult::Nearest)
        } else {
            SeekResult::None
        }
    }
}

impl<X> OrderedIndex<Tuple, Tuple> for IndexSegment<'_, X>
where
    X: OrderedIndex<Tuple, Tuple>,
{
    fn configuration(&self) -> &IndexConfiguration<Tuple, Tuple> {
        self.local
    }

    fn count(&self) -> usize {
        self.state.count
    }

    fn contains_key(&self, key: &Tuple) -> bool {
        self.physical.contains_key(&self.physical_key(key))
    }

    fn get_item(&self, key: &Tuple) -> Result<Tuple, IndexError> {
        match self.physical.get_item(&self.physical_key(key)) {
            Ok(item) => Ok(self.local_item(&item)),
            Err(err) if err.is_not_found() => Err(IndexError::key_not_found(key)),
            Err(err) => Err(err),
        }
    }

    fn seek(&self, ray: &Ray<Entire<Tuple>>) -> SeekResult<Tuple> {
        let direction = ray.direction();
        let physical_ray = Ray::new(self.physical_entire(ray.point()), direction);

        let result = match self.physical.seek(&physical_ray) {
            SeekResult::None => SeekResult::None,
            found if found.item().is_some_and(|item| self.owns(item)) => {
                found.map(|item| self.local_item(&item))
            }
            SeekResult::Nearest(_) | SeekResult::Exact(_) => {
                self.seek_past_foreign(ray.point(), direction)
            }
        };

        sink::record(MetricsEvent::Seek {
            index: IndexKind::Segment,
            outcome: result.result_type(),
        });

        result
    }

    fn create_reader<'r>(
        &'r self,
        range: &Range<Entire<Tuple>>,
        direction: Direction,
    ) -> Box<dyn IndexReader<Tuple, Tuple> + 'r> {
        sink::record(MetricsEvent::ReaderOpen {
            index: IndexKind::Segment,
        });

        let physical_range = Range::new(
            self.physical_entire(range.first()),
            self.physical_entire(range.second()),
        );
        let inner = self.physical.create_reader(&physical_range, direction);

        Box::new(IndexSegmentReader::new(
            inner,
            range.clone(),
            direction,
            self.discriminator(),
            self.layout.key_cut_in(self.cache),
            self.layout.item_cut_out(self.cache),
        ))
    }

    fn add(&mut self, item: Tuple) -> Result<(), IndexError> {
        let physical = self.physical_item(&item);
        if let Err(err) = self.physical.add(physical) {
            return Err(match err {
                IndexError::DuplicateKey { .. } => IndexError::duplicate_key(&self.key_of(&item)),
                other => other,
            });
        }

        self.state.measures.add(&item);
        self.state.count += 1;

        Ok(())
    }

    fn remove(&mut self, item: &Tuple) -> bool {
        let key = self.key_of(item);
        self.remove_key(&key)
    }

    fn remove_key(&mut self, key: &Tuple) -> bool {
        let physical_key = self.physical_key(key);
        let Ok(stored) = self.physical.get_item(&physical_key) else {
            return false;
        };

        if !self.physical.remove_key(&physical_key) {
            return false;
        }

        let stored = self.local_item(&stored);
        self.state.measures.subtract(&stored);
        self.state.count -= 1;

        true
    }

    fn replace(&mut self, item: Tuple) -> Result<(), IndexError> {
        let key = self.key_of(&item);
        let old = self
            .physical
            .get_item(&self.physical_key(&key))
            .map_err(|_| IndexError::replace_missing(&key))?;

        let physical = self.physical_item(&item);
        self.physical.replace(physical)?;

        let old = self.local_item(&old);
        self.state.measures.subtract(&old);
        self.state.measures.add(&item);

        Ok(())
    }

    fn clear(&mut self) {
        let items = self
            .iter(&Range::full(), Direction::Positive)
            .collect::<Vec<_>>();

        debug!(segment = %self.state.name, rows = items.len(), "clearing segment");

        for item in &items {
            self.remove(item);
        }

        self.state.measures.reset();
        self.state.count = 0;
    }

    fn measure_results(&self) -> &MeasureResultSet<Tuple> {
        &self.state.measures
    }
}

impl<X> fmt::Debug for IndexSegment<'_, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSegment")
            .field("name", &self.state.name)
            .field("number", &self.state.number)
            .field("count", &self.state.count)
            .finish_non_exhaustive()
    }
}

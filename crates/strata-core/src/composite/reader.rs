use crate::{
    index::IndexReader,
    obs::sink::{self, MetricsEvent},
    range::{Direction, Entire, Range},
    tuple::{
        Tuple,
        transform::{CutInTransform, CutOutTransform},
    },
    value::Value,
};

///
/// IndexSegmentReader
///
/// Filters a physical reader down to one segment's rows. Segment rows are
/// interleaved with other segments' rows in physical order, so foreign
/// rows are skipped one by one rather than sliced away.
///

pub struct IndexSegmentReader<'a> {
    inner: Box<dyn IndexReader<Tuple, Tuple> + 'a>,
    range: Range<Entire<Tuple>>,
    direction: Direction,
    discriminator: Value,
    key_cut_in: CutInTransform,
    item_cut_out: CutOutTransform,
    current: Option<Tuple>,
}

impl<'a> IndexSegmentReader<'a> {
    pub(crate) fn new(
        inner: Box<dyn IndexReader<Tuple, Tuple> + 'a>,
        range: Range<Entire<Tuple>>,
        direction: Direction,
        discriminator: Value,
        key_cut_in: CutInTransform,
        item_cut_out: CutOutTransform,
    ) -> Self {
        Self {
            inner,
            range,
            direction,
            discriminator,
            key_cut_in,
            item_cut_out,
            current: None,
        }
    }
}

impl IndexReader<Tuple, Tuple> for IndexSegmentReader<'_> {
    fn range(&self) -> &Range<Entire<Tuple>> {
        &self.range
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn current(&self) -> Option<&Tuple> {
        self.current.as_ref()
    }

    fn move_next(&mut self) -> bool {
        let mut skipped = 0u64;
        self.current = None;

        while self.inner.move_next() {
            let Some(row) = self.inner.current() else {
                break;
            };

            if row.last() == Some(&self.discriminator) {
                self.current = Some(self.item_cut_out.apply(row));
                break;
            }
            skipped += 1;
        }

        if skipped > 0 {
            sink::record(MetricsEvent::SegmentRowsSkipped { rows: skipped });
        }

        self.current.is_some()
    }

    fn move_to(&mut self, point: &Entire<Tuple>) {
        let physical = point.map_ref(|key| {
            self.key_cut_in
                .apply_one(key, self.discriminator.clone())
        });

        self.inner.move_to(&physical);
        self.current = None;
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.current = None;
    }
}

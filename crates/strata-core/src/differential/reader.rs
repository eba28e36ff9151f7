use crate::{
    index::{IndexConfiguration, IndexReader},
    obs::sink::{self, MetricsEvent},
    range::{Direction, Entire, Range},
};
use std::cmp::Ordering;
use tracing::trace;

///
/// Source
///
/// Which overlay part the merged cursor currently sits on.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Source {
    Origin,
    Insertions,
}

///
/// MergeState
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum MergeState {
    /// No sub-reader has been advanced since creation, `move_to` or `reset`.
    Priming,
    Scanning(Source),
    Exhausted,
}

///
/// MergeCursor
///
/// A sub-reader plus the key of its current item (`None` once exhausted or
/// before the first advance).
///

struct MergeCursor<'a, K, I> {
    reader: Box<dyn IndexReader<K, I> + 'a>,
    key: Option<K>,
}

impl<'a, K, I> MergeCursor<'a, K, I> {
    fn new(reader: Box<dyn IndexReader<K, I> + 'a>) -> Self {
        Self { reader, key: None }
    }

    fn advance(&mut self, configuration: &IndexConfiguration<K, I>) {
        self.key = if self.reader.move_next() {
            self.reader
                .current()
                .map(|item| configuration.extract_key(item))
        } else {
            None
        };
    }

    fn move_to(&mut self, point: &Entire<K>) {
        self.reader.move_to(point);
        self.key = None;
    }

    fn reset(&mut self) {
        self.reader.reset();
        self.key = None;
    }
}

///
/// DifferentialIndexReader
///
/// Key-ordered merge of origin and insertions, dropping origin rows that
/// have a tombstone in removals. All three sub-readers scan the same range
/// in the same direction, so tombstones are matched by walking the
/// removals cursor alongside origin.
///

pub struct DifferentialIndexReader<'a, K, I> {
    configuration: &'a IndexConfiguration<K, I>,
    range: Range<Entire<K>>,
    direction: Direction,
    origin: MergeCursor<'a, K, I>,
    insertions: MergeCursor<'a, K, I>,
    removals: MergeCursor<'a, K, I>,
    state: MergeState,
}

impl<'a, K, I> DifferentialIndexReader<'a, K, I> {
    pub(crate) fn new(
        configuration: &'a IndexConfiguration<K, I>,
        range: Range<Entire<K>>,
        direction: Direction,
        origin: Box<dyn IndexReader<K, I> + 'a>,
        insertions: Box<dyn IndexReader<K, I> + 'a>,
        removals: Box<dyn IndexReader<K, I> + 'a>,
    ) -> Self {
        Self {
            configuration,
            range,
            direction,
            origin: MergeCursor::new(origin),
            insertions: MergeCursor::new(insertions),
            removals: MergeCursor::new(removals),
            state: MergeState::Priming,
        }
    }

    // Scan-order comparison of two keys.
    fn order(&self, left: &K, right: &K) -> Ordering {
        self.direction
            .apply(self.configuration.key_comparer().compare(left, right))
    }

    // Advance origin past every tombstoned row.
    fn skip_tombstones(&mut self) {
        let mut skipped = 0u64;

        while let Some(origin_key) = self.origin.key.as_ref() {
            while self
                .removals
                .key
                .as_ref()
                .is_some_and(|removed| self.order(removed, origin_key) == Ordering::Less)
            {
                self.removals.advance(self.configuration);
            }

            let shadowed = self
                .removals
                .key
                .as_ref()
                .is_some_and(|removed| self.order(removed, origin_key) == Ordering::Equal);
            if !shadowed {
                break;
            }

            self.origin.advance(self.configuration);
            self.removals.advance(self.configuration);
            skipped += 1;
        }

        if skipped > 0 {
            sink::record(MetricsEvent::TombstonesSkipped { rows: skipped });
        }
    }

    fn choose(&mut self) -> MergeState {
        loop {
            self.skip_tombstones();

            let ordering = match (&self.origin.key, &self.insertions.key) {
                (Some(origin), Some(inserted)) => self.order(origin, inserted),
                (Some(_), None) => return MergeState::Scanning(Source::Origin),
                (None, Some(_)) => return MergeState::Scanning(Source::Insertions),
                (None, None) => return MergeState::Exhausted,
            };

            match ordering {
                Ordering::Less => return MergeState::Scanning(Source::Origin),
                Ordering::Greater => return MergeState::Scanning(Source::Insertions),
                // Shadowed origin row: insertions win.
                Ordering::Equal => self.origin.advance(self.configuration),
            }
        }
    }
}

impl<K, I> IndexReader<K, I> for DifferentialIndexReader<'_, K, I> {
    fn range(&self) -> &Range<Entire<K>> {
        &self.range
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn current(&self) -> Option<&I> {
        match self.state {
            MergeState::Scanning(Source::Origin) => self.origin.reader.current(),
            MergeState::Scanning(Source::Insertions) => self.insertions.reader.current(),
            MergeState::Priming | MergeState::Exhausted => None,
        }
    }

    fn move_next(&mut self) -> bool {
        match self.state {
            MergeState::Exhausted => return false,
            MergeState::Priming => {
                self.origin.advance(self.configuration);
                self.insertions.advance(self.configuration);
                self.removals.advance(self.configuration);
            }
            MergeState::Scanning(Source::Origin) => self.origin.advance(self.configuration),
            MergeState::Scanning(Source::Insertions) => {
                self.insertions.advance(self.configuration);
            }
        }

        self.state = self.choose();
        if self.state == MergeState::Exhausted {
            trace!("differential reader exhausted");
            return false;
        }

        true
    }

    fn move_to(&mut self, point: &Entire<K>) {
        self.origin.move_to(point);
        self.insertions.move_to(point);
        self.removals.move_to(point);
        self.state = MergeState::Priming;
    }

    fn reset(&mut self) {
        self.origin.reset();
        self.insertions.reset();
        self.removals.reset();
        self.state = MergeState::Priming;
    }
}

//! Module: composite
//! Responsibility: multiplex several named logical indexes (segments) over
//! one physical ordered index by appending a segment discriminator to every
//! stored key and item.
//! Does not own: the physical storage itself; any `OrderedIndex` over
//! tuples can back a composite.

mod reader;
mod segment;


use crate::{
    config::ConfigError,
    index::{IndexConfiguration, MemoryIndex, OrderedIndex},
    measure::{Measure, MeasureResultSet},
    range::Direction,
    tuple::{
        Tuple, TupleComparer, TupleDescriptor,
        transform::{CutInTransform, CutOutTransform, Segment, TransformCache},
    },
    value::{FieldKind, Value},
};
use std::{collections::BTreeSet, fmt};

// re-exports
pub use reader::IndexSegmentReader;
pub use segment::IndexSegment;

///
/// IndexSegmentConfiguration
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexSegmentConfiguration {
    name: String,
}

impl IndexSegmentConfiguration {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

///
/// IndexSegmentConfigurationSet
///
/// Ordered segment list; position is the segment number.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexSegmentConfigurationSet {
    segments: Vec<IndexSegmentConfiguration>,
}

impl IndexSegmentConfigurationSet {
    #[must_use]
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: names
                .into_iter()
                .map(IndexSegmentConfiguration::new)
                .collect(),
        }
    }

    pub fn push(&mut self, segment: IndexSegmentConfiguration) {
        self.segments.push(segment);
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexSegmentConfiguration> {
        self.segments.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.segments.iter().position(|segment| segment.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segments.is_empty() {
            return Err(ConfigError::EmptySegmentSet);
        }

        let mut seen = BTreeSet::new();
        for segment in &self.segments {
            if !seen.insert(segment.name.as_str()) {
                return Err(ConfigError::DuplicateSegment {
                    name: segment.name.clone(),
                });
            }
        }

        Ok(())
    }
}

///
/// CompositeIndexConfiguration
///
/// Segment-local shape and order: items are `item_descriptor`-shaped tuples
/// whose leading `key_descriptor` fields form the key.
///

#[derive(Clone, Debug)]
pub struct CompositeIndexConfiguration {
    key_descriptor: TupleDescriptor,
    item_descriptor: TupleDescriptor,
    comparer: TupleComparer,
    measures: Vec<Measure<Tuple>>,
    segments: IndexSegmentConfigurationSet,
}

impl CompositeIndexConfiguration {
    #[must_use]
    pub fn new(
        key_descriptor: TupleDescriptor,
        item_descriptor: TupleDescriptor,
        segments: IndexSegmentConfigurationSet,
    ) -> Self {
        Self {
            key_descriptor,
            item_descriptor,
            comparer: TupleComparer::ascending(),
            measures: Vec::new(),
            segments,
        }
    }

    #[must_use]
    pub fn with_comparer(mut self, comparer: TupleComparer) -> Self {
        self.comparer = comparer;
        self
    }

    #[must_use]
    pub fn with_measure(mut self, measure: Measure<Tuple>) -> Self {
        self.measures.push(measure);
        self
    }

    #[must_use]
    pub fn with_measures(mut self, measures: impl IntoIterator<Item = Measure<Tuple>>) -> Self {
        self.measures.extend(measures);
        self
    }

    #[must_use]
    pub const fn key_descriptor(&self) -> &TupleDescriptor {
        &self.key_descriptor
    }

    #[must_use]
    pub const fn item_descriptor(&self) -> &TupleDescriptor {
        &self.item_descriptor
    }

    #[must_use]
    pub const fn comparer(&self) -> &TupleComparer {
        &self.comparer
    }

    #[must_use]
    pub fn measures(&self) -> &[Measure<Tuple>] {
        &self.measures
    }

    #[must_use]
    pub const fn segments(&self) -> &IndexSegmentConfigurationSet {
        &self.segments
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.item_descriptor.starts_with(&self.key_descriptor) {
            return Err(ConfigError::KeyNotItemPrefix {
                key: self.key_descriptor.to_string(),
                item: self.item_descriptor.to_string(),
            });
        }

        self.segments.validate()
    }

    // Segment-local view: key = leading key fields, local comparer.
    fn local_configuration(&self) -> IndexConfiguration<Tuple, Tuple> {
        let key_len = self.key_descriptor.len();

        IndexConfiguration::new(
            move |item: &Tuple| item.prefix(key_len),
            self.comparer.key_comparer(),
        )
        .with_measures(self.measures.iter().cloned())
    }
}

///
/// CompositeLayout
///
/// Local and physical tuple shapes. Physical keys and items are their
/// local counterparts with the segment number appended.
///

#[derive(Clone, Debug)]
pub(crate) struct CompositeLayout {
    key: TupleDescriptor,
    item: TupleDescriptor,
    discriminator: TupleDescriptor,
    physical_item: TupleDescriptor,
}

impl CompositeLayout {
    fn new(key: &TupleDescriptor, item: &TupleDescriptor) -> Self {
        let discriminator = TupleDescriptor::new([FieldKind::Int]);
        let physical_item = CutInTransform::new(item, Segment::single(item.len()), &discriminator)
            .target()
            .clone();

        Self {
            key: key.clone(),
            item: item.clone(),
            discriminator,
            physical_item,
        }
    }

    // Span of value fields inside a physical item.
    fn value_span(&self) -> Segment {
        Segment::new(self.key.len(), self.item.len() - self.key.len())
    }

    // Discriminator slot inside a physical item.
    fn item_discriminator(&self) -> Segment {
        Segment::single(self.item.len())
    }

    fn key_discriminator(&self) -> Segment {
        Segment::single(self.key.len())
    }

    pub(crate) fn key_cut_in(&self, cache: &TransformCache) -> CutInTransform {
        cache.cut_in(&self.key, self.key_discriminator(), &self.discriminator)
    }

    pub(crate) fn item_cut_in(&self, cache: &TransformCache) -> CutInTransform {
        cache.cut_in(&self.item, self.item_discriminator(), &self.discriminator)
    }

    pub(crate) fn item_cut_out(&self, cache: &TransformCache) -> CutOutTransform {
        cache.cut_out(&self.physical_item, self.item_discriminator())
    }

    // Physical configuration: key is the item with its value span cut out,
    // ordered by the local comparer extended with an ascending discriminator.
    fn physical_configuration(
        &self,
        comparer: &TupleComparer,
        measures: &[Measure<Tuple>],
    ) -> IndexConfiguration<Tuple, Tuple> {
        let extract = CutOutTransform::new(&self.physical_item, self.value_span());
        let comparer = comparer.extended(self.key.len(), Direction::Positive);

        IndexConfiguration::new(move |item: &Tuple| extract.apply(item), comparer.key_comparer())
            .with_measures(measures.iter().cloned())
    }
}

///
/// SegmentState
///
/// Per-segment bookkeeping owned by the composite.
///

#[derive(Debug)]
pub(crate) struct SegmentState {
    name: String,
    number: usize,
    discriminator: Value,
    measures: MeasureResultSet<Tuple>,
    count: usize,
}

impl SegmentState {
    #[allow(clippy::cast_possible_wrap)]
    fn new(name: &str, number: usize, measures: MeasureResultSet<Tuple>) -> Self {
        Self {
            name: name.to_string(),
            number,
            discriminator: Value::Int(number as i64),
            measures,
            count: 0,
        }
    }
}

///
/// CompositeIndex
///
/// Owns the physical index and every segment's state. All access goes
/// through `segment`/`segment_at`, which hand out a borrowing
/// `IndexSegment`.
///

pub struct CompositeIndex<X = MemoryIndex<Tuple, Tuple>> {
    configuration: CompositeIndexConfiguration,
    local: IndexConfiguration<Tuple, Tuple>,
    layout: CompositeLayout,
    physical: X,
    segments: Vec<SegmentState>,
    cache: TransformCache,
}

impl<X> CompositeIndex<X>
where
    X: OrderedIndex<Tuple, Tuple>,
{
    /// Validate `configuration` and build the physical index with `factory`.
    pub fn new(
        configuration: CompositeIndexConfiguration,
        factory: impl FnOnce(IndexConfiguration<Tuple, Tuple>) -> X,
    ) -> Result<Self, ConfigError> {
        configuration.validate()?;

        let layout = CompositeLayout::new(
            configuration.key_descriptor(),
            configuration.item_descriptor(),
        );
        let local = configuration.local_configuration();
        let physical = factory(
            layout.physical_configuration(configuration.comparer(), configuration.measures()),
        );
        let segments = configuration
            .segments()
            .iter()
            .enumerate()
            .map(|(number, segment)| {
                SegmentState::new(segment.name(), number, local.new_measure_results())
            })
            .collect();

        Ok(Self {
            configuration,
            local,
            layout,
            physical,
            segments,
            cache: TransformCache::new(),
        })
    }

    #[must_use]
    pub const fn configuration(&self) -> &CompositeIndexConfiguration {
        &self.configuration
    }

    /// Borrow the named segment for reads and writes.
    pub fn segment(&mut self, name: &str) -> Option<IndexSegment<'_, X>> {
        let number = self.segments.iter().position(|state| state.name == name)?;

        self.segment_at(number)
    }

    pub fn segment_at(&mut self, number: usize) -> Option<IndexSegment<'_, X>> {
        let state = self.segments.get_mut(number)?;

        Some(IndexSegment::new(
            &mut self.physical,
            state,
            &self.local,
            &self.layout,
            &self.cache,
        ))
    }

    pub fn segment_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|state| state.name.as_str())
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The shared physical index, holding every segment's rows.
    #[must_use]
    pub const fn physical(&self) -> &X {
        &self.physical
    }

    #[must_use]
    pub fn into_physical(self) -> X {
        self.physical
    }
}

impl CompositeIndex<MemoryIndex<Tuple, Tuple>> {
    /// Composite backed by a `MemoryIndex`.
    pub fn new_in_memory(configuration: CompositeIndexConfiguration) -> Result<Self, ConfigError> {
        Self::new(configuration, MemoryIndex::new)
    }
}

impl<X: fmt::Debug> fmt::Debug for CompositeIndex<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeIndex")
            .field("segments", &self.segments)
            .field("physical", &self.physical)
            .finish_non_exhaustive()
    }
}

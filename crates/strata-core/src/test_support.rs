//! Shared fixtures for unit tests.

use crate::{
    composite::{CompositeIndex, CompositeIndexConfiguration, IndexSegmentConfigurationSet},
    index::{IndexConfiguration, IndexReader, MemoryIndex},
    measure::Measure,
    tuple::{Tuple, TupleDescriptor},
    value::{FieldKind, Value},
};

/// `(key, value)` rows keyed by their first field.
pub(crate) type Row = (i64, i64);

pub(crate) fn row_configuration() -> IndexConfiguration<i64, Row> {
    IndexConfiguration::natural(|row: &Row| row.0).with_measures([
        Measure::count("count"),
        Measure::sum("sum", |row: &Row| i128::from(row.1)),
    ])
}

/// Rows `(k, k * 10)` for each key.
pub(crate) fn row_index(keys: impl IntoIterator<Item = i64>) -> MemoryIndex<i64, Row> {
    MemoryIndex::from_items(row_configuration(), keys.into_iter().map(|k| (k, k * 10)))
        .expect("fixture keys should be unique")
}

/// Drain a reader into the keys it yields.
pub(crate) fn drain_keys<I: Clone>(
    reader: &mut dyn IndexReader<i64, I>,
    key_of: impl Fn(&I) -> i64,
) -> Vec<i64> {
    let mut keys = Vec::new();
    while reader.move_next() {
        keys.push(key_of(reader.current().expect("positioned reader has a current item")));
    }

    keys
}

pub(crate) fn key(k: i64) -> Tuple {
    Tuple::from_values(vec![Value::Int(k)]).expect("int key")
}

pub(crate) fn item(k: i64, label: &str) -> Tuple {
    Tuple::from_values(vec![Value::Int(k), Value::from(label)]).expect("int/text item")
}

pub(crate) fn item_key(item: &Tuple) -> i64 {
    item.get(0)
        .and_then(Value::as_int)
        .expect("item key is an int")
}

/// Segments `a`, `b`, `c` over `(int key, text value)` items with a row
/// count and a key sum.
pub(crate) fn composite() -> CompositeIndex {
    let configuration = CompositeIndexConfiguration::new(
        TupleDescriptor::new([FieldKind::Int]),
        TupleDescriptor::new([FieldKind::Int, FieldKind::Text]),
        IndexSegmentConfigurationSet::new(["a", "b", "c"]),
    )
    .with_measures([Measure::count("count"), Measure::sum_field("sum", 0)]);

    CompositeIndex::new_in_memory(configuration).expect("fixture configuration is valid")
}

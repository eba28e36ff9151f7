use crate::{
    index::{IndexError, MemoryIndex, OrderedIndex, SeekResult},
    range::{Direction, Entire, Range, Ray},
    test_support::{Row, drain_keys, row_configuration, row_index},
};

fn keys(index: &MemoryIndex<i64, Row>, range: &Range<Entire<i64>>, direction: Direction) -> Vec<i64> {
    let mut reader = index.create_reader(range, direction);
    drain_keys(reader.as_mut(), |row: &Row| row.0)
}

#[test]
fn items_stay_sorted_by_key() {
    let index = row_index([5, 1, 9, 3]);

    assert_eq!(index.items().iter().map(|r| r.0).collect::<Vec<_>>(), [1, 3, 5, 9]);
    assert_eq!(index.count(), 4);
}

#[test]
fn duplicate_add_is_rejected() {
    let mut index = row_index([1, 2]);
    let err = index.add((2, 99)).unwrap_err();

    assert!(matches!(err, IndexError::DuplicateKey { .. }));
    assert_eq!(index.get_item(&2), Ok((2, 20)));
    assert_eq!(index.count(), 2);
}

#[test]
fn get_item_reports_missing_keys() {
    let index = row_index([1]);

    assert!(index.get_item(&4).unwrap_err().is_not_found());
    assert_eq!(index.try_get_item(&4), None);
    assert_eq!(index.try_get_item(&1), Some((1, 10)));
}

#[test]
fn remove_and_replace_maintain_measures() {
    let mut index = row_index([1, 2, 3]);
    assert_eq!(index.measure_results().get("sum"), Some(60));

    assert!(index.remove(&(2, 0)));
    assert!(!index.remove_key(&2));
    assert_eq!(index.measure_results().get("count"), Some(2));
    assert_eq!(index.measure_results().get("sum"), Some(40));

    index.replace((3, 7)).expect("key 3 exists");
    assert_eq!(index.get_item(&3), Ok((3, 7)));
    assert_eq!(index.measure_results().get("sum"), Some(17));

    let err = index.replace((8, 0)).unwrap_err();
    assert!(matches!(err, IndexError::ReplaceMissing { .. }));
}

#[test]
fn clear_empties_items_and_measures() {
    let mut index = row_index([1, 2, 3]);
    index.clear();

    assert!(index.is_empty());
    assert_eq!(index.measure_results().results(), &[0, 0]);
}

#[test]
fn seek_positive_and_negative() {
    let index = row_index([10, 20, 30]);

    assert_eq!(index.seek_key(&20), SeekResult::Exact((20, 200)));
    assert_eq!(index.seek_key(&15), SeekResult::Nearest((20, 200)));
    assert_eq!(index.seek_key(&31), SeekResult::None);

    let back = Ray::new(Entire::Exact(15), Direction::Negative);
    assert_eq!(index.seek(&back), SeekResult::Nearest((10, 100)));

    let before_all = Ray::new(Entire::Exact(5), Direction::Negative);
    assert_eq!(index.seek(&before_all), SeekResult::None);
}

#[test]
fn seek_from_infinitesimals_skips_the_key() {
    let index = row_index([10, 20, 30]);

    let after = Ray::new(Entire::PositiveInfinitesimal(20), Direction::Positive);
    assert_eq!(index.seek(&after), SeekResult::Nearest((30, 300)));

    let before = Ray::new(Entire::NegativeInfinitesimal(20), Direction::Negative);
    assert_eq!(index.seek(&before), SeekResult::Nearest((10, 100)));
}

#[test]
fn reader_respects_range_bounds_in_both_directions() {
    let index = row_index([1, 2, 3, 4, 5]);
    let range = Range::new(Entire::Exact(2), Entire::PositiveInfinitesimal(4));

    assert_eq!(keys(&index, &range, Direction::Positive), [2, 3, 4]);
    assert_eq!(keys(&index, &range, Direction::Negative), [4, 3, 2]);

    let open = Range::new(Entire::PositiveInfinitesimal(2), Entire::NegativeInfinitesimal(5));
    assert_eq!(keys(&index, &open, Direction::Positive), [3, 4]);
}

#[test]
fn empty_range_yields_nothing() {
    let index = row_index([1, 2, 3]);
    let range = Range::new(Entire::Exact(3), Entire::Exact(1));

    assert!(range.is_empty(index.key_comparer()));
    assert!(keys(&index, &range, Direction::Positive).is_empty());
    assert!(keys(&index, &range, Direction::Negative).is_empty());
}

#[test]
fn key_comparer_is_reachable_through_a_trait_object() {
    let index = row_index([1, 2]);
    let dynamic: &dyn OrderedIndex<i64, Row> = &index;

    let comparer = dynamic.key_comparer();
    assert_eq!(comparer.compare(&1, &2), std::cmp::Ordering::Less);
    assert!(Range::new(Entire::Exact(2), Entire::Exact(1)).is_empty(comparer));
}

#[test]
fn move_next_after_exhaustion_keeps_returning_false() {
    let index = row_index([1]);
    let mut reader = index.create_reader(&Range::full(), Direction::Positive);

    assert!(reader.move_next());
    assert!(!reader.move_next());
    assert!(!reader.move_next());
    assert!(reader.current().is_none());
}

#[test]
fn move_to_and_reset_reposition_the_reader() {
    let index = row_index([1, 2, 3, 4, 5, 6]);
    let range = Range::new(Entire::Exact(2), Entire::Exact(5));

    let mut forward = index.create_reader(&range, Direction::Positive);
    forward.move_to(&Entire::Exact(4));
    assert_eq!(drain_keys(forward.as_mut(), |row: &Row| row.0), [4, 5]);

    // Clamped to the range start.
    forward.move_to(&Entire::NegativeInfinity);
    assert_eq!(drain_keys(forward.as_mut(), |row: &Row| row.0), [2, 3, 4, 5]);

    let mut backward = index.create_reader(&range, Direction::Negative);
    backward.move_to(&Entire::Exact(3));
    assert_eq!(drain_keys(backward.as_mut(), |row: &Row| row.0), [3, 2]);

    backward.reset();
    assert_eq!(drain_keys(backward.as_mut(), |row: &Row| row.0), [5, 4, 3, 2]);
}

#[test]
fn ranged_measures_are_recomputed() {
    let index = row_index([1, 2, 3, 4]);
    let range = Range::new(Entire::Exact(2), Entire::Exact(3));

    assert_eq!(index.get_measure_result(&range, "count"), Ok(2));
    assert_eq!(index.get_measure_result(&range, "sum"), Ok(50));
    assert_eq!(index.get_measure_result(&Range::full(), "sum"), Ok(100));
    assert!(matches!(
        index.get_measure_result(&range, "avg"),
        Err(IndexError::UnknownMeasure { .. })
    ));
}

#[test]
fn custom_comparer_orders_descending() {
    let configuration = row_configuration();
    let descending = crate::index::IndexConfiguration::new(
        |row: &Row| row.0,
        crate::index::KeyComparer::new(|a: &i64, b: &i64| b.cmp(a)),
    )
    .with_measures(configuration.measures().iter().cloned());

    let index = MemoryIndex::from_items(descending, [(1, 0), (3, 0), (2, 0)]).expect("unique keys");
    assert_eq!(keys(&index, &Range::full(), Direction::Positive), [3, 2, 1]);
    assert_eq!(index.seek_key(&4), SeekResult::Nearest((3, 0)));
}

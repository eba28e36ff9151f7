use crate::{
    differential::DifferentialIndex,
    index::{IndexError, MemoryIndex, OrderedIndex, SeekResult},
    obs::{self, IndexKind, MetricsEvent, MetricsSink},
    range::{Direction, Entire, Range, Ray},
    test_support::{Row, composite, drain_keys, item, item_key, key, row_index},
    tuple::Tuple,
};
use proptest::prelude::*;
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

type Overlay = DifferentialIndex<i64, Row, MemoryIndex<i64, Row>>;

fn overlay(keys: impl IntoIterator<Item = i64>) -> Overlay {
    DifferentialIndex::new(row_index(keys))
}

fn keys<X: OrderedIndex<i64, Row>>(index: &X, direction: Direction) -> Vec<i64> {
    let mut reader = index.create_reader(&Range::full(), direction);
    drain_keys(reader.as_mut(), |row: &Row| row.0)
}

// Origin {1, 3, 5, 7}, inserted {2, 4}, tombstoned {3}.
fn mixed() -> Overlay {
    let mut index = overlay([1, 3, 5, 7]);
    index.add((2, 20)).expect("fresh key");
    index.add((4, 40)).expect("fresh key");
    assert!(index.remove_key(&3));

    index
}

#[test]
fn reads_merge_insertions_over_live_origin() {
    let index = mixed();

    assert_eq!(keys(&index, Direction::Positive), [1, 2, 4, 5, 7]);
    assert_eq!(keys(&index, Direction::Negative), [7, 5, 4, 2, 1]);

    assert_eq!(keys(index.insertions(), Direction::Positive), [2, 4]);
    assert_eq!(keys(index.removals(), Direction::Positive), [3]);
    assert_eq!(index.origin().count(), 4);
}

#[test]
fn lookups_see_only_visible_items() {
    let index = mixed();

    assert!(!index.contains_key(&3));
    assert!(index.get_item(&3).unwrap_err().is_not_found());
    assert_eq!(index.get_item(&2), Ok((2, 20)));
    assert_eq!(index.get_item(&5), Ok((5, 50)));

    assert_eq!(index.count(), 5);
    assert_eq!(index.measure_results().get("count"), Some(5));
    assert_eq!(index.measure_results().get("sum"), Some(190));
}

#[test]
fn adding_a_visible_key_changes_nothing() {
    let mut index = mixed();

    index.add((1, 99)).expect("visible add is accepted");
    index.add((2, 99)).expect("visible add is accepted");

    assert_eq!(index.get_item(&1), Ok((1, 10)));
    assert_eq!(index.get_item(&2), Ok((2, 20)));
    assert_eq!(index.count(), 5);
    assert!(!index.insertions().contains_key(&1));
}

#[test]
fn removing_twice_leaves_one_tombstone() {
    let mut index = overlay([1, 2]);

    assert!(index.remove_key(&2));
    assert!(!index.remove_key(&2));
    assert!(!index.remove(&(9, 0)));

    assert_eq!(index.removals().count(), 1);
    assert_eq!(index.count(), 1);
    assert_eq!(index.measure_results().get("sum"), Some(10));
}

#[test]
fn re_added_origin_key_lives_in_insertions() {
    let mut index = overlay([1, 3]);
    assert!(index.remove_key(&3));
    index.add((3, 33)).expect("hidden key can be re-added");

    assert!(index.insertions().contains_key(&3));
    assert!(index.removals().contains_key(&3));
    assert_eq!(index.get_item(&3), Ok((3, 33)));
    assert_eq!(keys(&index, Direction::Positive), [1, 3]);
    assert_eq!(index.measure_results().get("sum"), Some(43));

    // The second removal comes out of insertions; the tombstone stays.
    assert!(index.remove_key(&3));
    assert!(!index.contains_key(&3));
    assert!(index.insertions().is_empty());
    assert_eq!(index.removals().count(), 1);
    assert_eq!(index.count(), 1);
    assert_eq!(index.measure_results().get("sum"), Some(10));
}

#[test]
fn replace_routes_by_where_the_key_lives() {
    let mut index = mixed();

    index.replace((5, 55)).expect("origin key");
    assert_eq!(index.get_item(&5), Ok((5, 55)));
    assert_eq!(index.origin().get_item(&5), Ok((5, 50)));
    assert!(index.removals().contains_key(&5));

    index.replace((2, 22)).expect("inserted key");
    assert_eq!(index.insertions().get_item(&2), Ok((2, 22)));

    assert_eq!(index.count(), 5);
    assert_eq!(index.measure_results().get("sum"), Some(197));

    for missing in [(3, 0), (9, 0)] {
        let err = index.replace(missing).unwrap_err();
        assert!(matches!(err, IndexError::ReplaceMissing { .. }));
    }
    assert_eq!(keys(&index, Direction::Positive), [1, 2, 4, 5, 7]);
}

#[test]
fn clear_tombstones_everything_visible() {
    let mut index = overlay([1, 2, 3]);
    index.add((4, 40)).expect("fresh key");
    assert!(index.remove_key(&2));

    index.clear();

    assert!(index.is_empty());
    assert!(keys(&index, Direction::Positive).is_empty());
    assert_eq!(index.measure_results().results(), &[0, 0]);
    assert!(index.insertions().is_empty());
    assert_eq!(keys(index.removals(), Direction::Positive), [1, 2, 3, 4]);
    assert_eq!(index.origin().count(), 3);

    index.add((2, 5)).expect("cleared key can be re-added");
    assert_eq!(keys(&index, Direction::Positive), [2]);
    assert_eq!(index.measure_results().get("sum"), Some(5));
}

#[test]
fn seek_prefers_the_closest_visible_item() {
    let mut index = overlay([10, 20, 30, 40]);
    assert!(index.remove_key(&20));
    index.add((25, 250)).expect("fresh key");

    assert_eq!(index.seek_key(&20), SeekResult::Nearest((25, 250)));
    assert_eq!(index.seek_key(&25), SeekResult::Exact((25, 250)));
    assert_eq!(index.seek_key(&30), SeekResult::Exact((30, 300)));
    assert_eq!(index.seek_key(&41), SeekResult::None);

    let back = Ray::new(Entire::Exact(22), Direction::Negative);
    assert_eq!(index.seek(&back), SeekResult::Nearest((10, 100)));

    let back = Ray::new(Entire::Exact(28), Direction::Negative);
    assert_eq!(index.seek(&back), SeekResult::Nearest((25, 250)));
}

#[test]
fn reader_move_to_reset_and_exhaustion() {
    let mut index = overlay([1, 3, 5, 7]);
    index.add((4, 40)).expect("fresh key");
    assert!(index.remove_key(&5));

    let mut reader = index.create_reader(&Range::full(), Direction::Positive);
    assert_eq!(reader.current(), None);

    reader.move_to(&Entire::Exact(4));
    assert!(reader.move_next());
    assert_eq!(reader.current(), Some(&(4, 40)));
    assert!(reader.move_next());
    assert_eq!(reader.current(), Some(&(7, 70)));
    assert!(!reader.move_next());
    assert!(!reader.move_next());
    assert_eq!(reader.current(), None);

    reader.reset();
    assert!(reader.move_next());
    assert_eq!(reader.current(), Some(&(1, 10)));

    let mut back = index.create_reader(&Range::full(), Direction::Negative);
    back.move_to(&Entire::Exact(4));
    assert_eq!(drain_keys(back.as_mut(), |row: &Row| row.0), [4, 3, 1]);

    let ranged = Range::new(Entire::Exact(2), Entire::Exact(6));
    let mut reader = index.create_reader(&ranged, Direction::Positive);
    assert_eq!(drain_keys(reader.as_mut(), |row: &Row| row.0), [3, 4]);
    assert_eq!(index.get_measure_result(&ranged, "sum"), Ok(70));
}

#[derive(Default)]
struct Recorder {
    tombstones_skipped: RefCell<u64>,
    overlay_readers: RefCell<u64>,
    inserts: RefCell<u64>,
}

impl MetricsSink for Recorder {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::TombstonesSkipped { rows } => *self.tombstones_skipped.borrow_mut() += rows,
            MetricsEvent::ReaderOpen {
                index: IndexKind::Differential,
            } => *self.overlay_readers.borrow_mut() += 1,
            MetricsEvent::OverlayInsert => *self.inserts.borrow_mut() += 1,
            _ => {}
        }
    }
}

#[test]
fn merge_reports_skipped_tombstones() {
    let recorder = Rc::new(Recorder::default());

    let visible = obs::with_metrics_sink(recorder.clone(), || {
        let mut index = overlay([1, 2, 3, 4]);
        assert!(index.remove_key(&2));
        assert!(index.remove_key(&3));
        index.add((9, 90)).expect("fresh key");

        keys(&index, Direction::Positive)
    });

    assert_eq!(visible, [1, 4, 9]);
    assert_eq!(*recorder.tombstones_skipped.borrow(), 2);
    assert_eq!(*recorder.overlay_readers.borrow(), 1);
    assert_eq!(*recorder.inserts.borrow(), 1);
}

#[test]
fn overlay_over_a_segment_leaves_the_segment_untouched() {
    let mut index = composite();
    for k in [1, 2, 3] {
        index.segment("a").expect("a").add(item(k, "a")).expect("fresh");
    }
    index.segment("b").expect("b").add(item(2, "b")).expect("fresh");

    {
        let segment = index.segment("a").expect("segment a");
        let mut overlay: DifferentialIndex<Tuple, Tuple, _> = DifferentialIndex::new(segment);

        assert!(overlay.remove_key(&key(2)));
        overlay.add(item(4, "new")).expect("fresh key");
        overlay.replace(item(1, "one")).expect("origin key");

        let visible = overlay
            .iter(&Range::full(), Direction::Positive)
            .collect::<Vec<_>>();
        assert_eq!(visible, [item(1, "one"), item(3, "a"), item(4, "new")]);
        assert_eq!(overlay.measure_results().get("count"), Some(3));
        assert_eq!(overlay.measure_results().get("sum"), Some(8));
    }

    let a = index.segment("a").expect("segment a");
    let stored = a
        .iter(&Range::full(), Direction::Positive)
        .map(|item| item_key(&item))
        .collect::<Vec<_>>();
    assert_eq!(stored, [1, 2, 3]);
    assert_eq!(a.get_item(&key(1)), Ok(item(1, "a")));
    assert_eq!(index.physical().count(), 4);
}

#[derive(Clone, Debug)]
enum Op {
    Add(i64, i64),
    Remove(i64),
    Replace(i64, i64),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0i64..16, -100i64..100).prop_map(|(k, v)| Op::Add(k, v)),
        3 => (0i64..16).prop_map(Op::Remove),
        2 => (0i64..16, -100i64..100).prop_map(|(k, v)| Op::Replace(k, v)),
        1 => Just(Op::Clear),
    ]
}

fn expected_seek(model: &BTreeMap<i64, i64>, k: i64, direction: Direction) -> SeekResult<Row> {
    if let Some(v) = model.get(&k) {
        return SeekResult::Exact((k, *v));
    }

    let next = match direction {
        Direction::Positive => model.range(k..).next(),
        Direction::Negative => model.range(..k).next_back(),
    };
    next.map_or(SeekResult::None, |(k, v)| SeekResult::Nearest((*k, *v)))
}

proptest! {
    #[test]
    fn overlay_matches_a_map_model(
        origin in prop::collection::btree_set(0i64..16, 0..10),
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let mut index = overlay(origin.iter().copied());
        let mut model = origin.iter().map(|k| (*k, k * 10)).collect::<BTreeMap<_, _>>();

        for op in ops {
            match op {
                Op::Add(k, v) => {
                    prop_assert!(index.add((k, v)).is_ok());
                    model.entry(k).or_insert(v);
                }
                Op::Remove(k) => {
                    prop_assert_eq!(index.remove_key(&k), model.remove(&k).is_some());
                }
                Op::Replace(k, v) => {
                    let replaced = index.replace((k, v)).is_ok();
                    prop_assert_eq!(replaced, model.contains_key(&k));
                    if let Some(slot) = model.get_mut(&k) {
                        *slot = v;
                    }
                }
                Op::Clear => {
                    index.clear();
                    model.clear();
                }
            }

            let read = index.iter(&Range::full(), Direction::Positive).count();
            let count = i128::try_from(read).expect("small");
            prop_assert_eq!(index.get_measure_result(&Range::full(), "count"), Ok(count));
            prop_assert_eq!(read, model.len());
        }

        let expected = model.keys().copied().collect::<Vec<_>>();
        prop_assert_eq!(keys(&index, Direction::Positive), expected.clone());
        prop_assert_eq!(
            keys(&index, Direction::Negative),
            expected.iter().rev().copied().collect::<Vec<_>>()
        );

        prop_assert_eq!(index.count(), model.len());
        let count = i128::try_from(model.len()).expect("small");
        let sum = model.values().map(|v| i128::from(*v)).sum::<i128>();
        prop_assert_eq!(index.measure_results().get("count"), Some(count));
        prop_assert_eq!(index.measure_results().get("sum"), Some(sum));

        for k in -1i64..17 {
            prop_assert_eq!(index.contains_key(&k), model.contains_key(&k));
            for direction in [Direction::Positive, Direction::Negative] {
                let ray = Ray::new(Entire::Exact(k), direction);
                prop_assert_eq!(index.seek(&ray), expected_seek(&model, k, direction));
            }
        }
    }
}

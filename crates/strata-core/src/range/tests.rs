use crate::{
    index::KeyComparer,
    range::{Direction, Entire, EntireValueType, Range, Ray},
};
use proptest::prelude::*;
use std::cmp::Ordering;

fn natural() -> KeyComparer<i64> {
    KeyComparer::natural()
}

#[test]
fn infinitesimals_bracket_their_key() {
    let cmp = natural();

    assert_eq!(
        Entire::NegativeInfinitesimal(5).compare(&Entire::Exact(5), &cmp),
        Ordering::Less
    );
    assert_eq!(
        Entire::PositiveInfinitesimal(5).compare(&Entire::Exact(5), &cmp),
        Ordering::Greater
    );
    assert_eq!(
        Entire::PositiveInfinitesimal(4).compare(&Entire::NegativeInfinitesimal(5), &cmp),
        Ordering::Less
    );
}

#[test]
fn infinities_bound_every_point() {
    let cmp = natural();
    let points = [
        Entire::NegativeInfinitesimal(i64::MIN),
        Entire::Exact(0),
        Entire::PositiveInfinitesimal(i64::MAX),
    ];

    for point in &points {
        assert_eq!(Entire::NegativeInfinity.compare(point, &cmp), Ordering::Less);
        assert_eq!(Entire::PositiveInfinity.compare(point, &cmp), Ordering::Greater);
    }
    assert_eq!(
        Entire::<i64>::PositiveInfinity.compare(&Entire::PositiveInfinity, &cmp),
        Ordering::Equal
    );
}

#[test]
fn compare_key_matches_compare_against_exact() {
    let cmp = natural();

    for point in [
        Entire::NegativeInfinity,
        Entire::NegativeInfinitesimal(3),
        Entire::Exact(3),
        Entire::PositiveInfinitesimal(3),
        Entire::PositiveInfinity,
    ] {
        for key in 2..=4 {
            assert_eq!(
                point.compare_key(&key, &cmp),
                point.compare(&Entire::Exact(key), &cmp),
                "{point:?} vs {key}"
            );
        }
    }
}

#[test]
fn entire_accessors() {
    let point = Entire::PositiveInfinitesimal(7);

    assert_eq!(point.value_type(), EntireValueType::PositiveInfinitesimal);
    assert_eq!(point.value(), Some(&7));
    assert!(!point.is_exact());
    assert!(!Entire::<i64>::NegativeInfinity.has_value());
    assert_eq!(point.map(|k| k * 2), Entire::PositiveInfinitesimal(14));
    assert_eq!(Entire::from(3), Entire::Exact(3));
    assert_eq!(Entire::after(3, Direction::Negative), Entire::NegativeInfinitesimal(3));
    assert_eq!(Entire::<i64>::infinity(Direction::Positive), Entire::PositiveInfinity);
}

#[test]
fn range_membership_and_emptiness() {
    let cmp = natural();
    let range = Range::new(Entire::PositiveInfinitesimal(1), Entire::Exact(4));

    assert!(!range.contains_key(&1, &cmp));
    assert!(range.contains_key(&2, &cmp));
    assert!(range.contains_key(&4, &cmp));
    assert!(!range.contains_key(&5, &cmp));
    assert!(!range.is_empty(&cmp));

    assert!(Range::new(Entire::PositiveInfinitesimal(3), Entire::Exact(3)).is_empty(&cmp));
    assert!(!Range::point(3).is_empty(&cmp));
    assert!(Range::<Entire<i64>>::full().is_full());
}

#[test]
fn range_start_and_end_follow_direction() {
    let range = Range::new(Entire::Exact(1), Entire::Exact(9));

    assert_eq!(range.start(Direction::Positive), &Entire::Exact(1));
    assert_eq!(range.start(Direction::Negative), &Entire::Exact(9));
    assert_eq!(range.end(Direction::Negative), &Entire::Exact(1));

    let tail = Range::from_ray(Entire::Exact(4), Direction::Negative);
    assert_eq!(tail, Range::new(Entire::NegativeInfinity, Entire::Exact(4)));
}

#[test]
fn ray_helpers() {
    let ray = Ray::exact(3);

    assert_eq!(ray.direction(), Direction::Positive);
    assert_eq!(ray.point(), &Entire::Exact(3));
    assert_eq!(ray.map(|p| p.map(|k| k + 1)).into_point(), Entire::Exact(4));
    assert_eq!(Direction::Negative.apply(Ordering::Less), Ordering::Greater);
    assert_eq!(Direction::Positive.reversed(), Direction::Negative);
}

fn entire() -> impl Strategy<Value = Entire<i64>> {
    prop_oneof![
        Just(Entire::NegativeInfinity),
        (-5i64..5).prop_map(Entire::NegativeInfinitesimal),
        (-5i64..5).prop_map(Entire::Exact),
        (-5i64..5).prop_map(Entire::PositiveInfinitesimal),
        Just(Entire::PositiveInfinity),
    ]
}

proptest! {
    #[test]
    fn entire_order_is_antisymmetric(a in entire(), b in entire()) {
        let cmp = natural();

        prop_assert_eq!(a.compare(&b, &cmp), b.compare(&a, &cmp).reverse());
    }

    #[test]
    fn entire_order_is_transitive(a in entire(), b in entire(), c in entire()) {
        let cmp = natural();
        let mut sorted = [a, b, c];
        sorted.sort_by(|x, y| x.compare(y, &cmp));

        prop_assert_ne!(sorted[0].compare(&sorted[2], &cmp), Ordering::Greater);
    }
}

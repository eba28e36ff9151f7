//! Module: range
//! Responsibility: boundary primitives (`Entire`, `Range`, `Ray`) and scan
//! `Direction` shared by every ordered index.
//! Does not own: how an index turns a range into physical positions.

#[cfg(test)]
mod tests;

use crate::index::KeyComparer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

///
/// Direction
///
/// Canonical traversal direction shared by readers, seeks, and per-field
/// sort order.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Positive,
    Negative,
}

impl Direction {
    /// Orient an ascending comparison result along this direction.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Positive => ordering,
            Self::Negative => ordering.reverse(),
        }
    }

    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Positive)
    }
}

///
/// EntireValueType
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntireValueType {
    NegativeInfinity,
    NegativeInfinitesimal,
    Exact,
    PositiveInfinitesimal,
    PositiveInfinity,
}

///
/// Entire
///
/// A key, a point infinitesimally before/after a key, or an infinity marker.
/// Infinitesimals let a range express "just past `k`" without a sentinel key.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Entire<K> {
    NegativeInfinity,
    NegativeInfinitesimal(K),
    Exact(K),
    PositiveInfinitesimal(K),
    PositiveInfinity,
}

impl<K> Entire<K> {
    /// The infinity lying at the far end of a scan in `direction`.
    #[must_use]
    pub const fn infinity(direction: Direction) -> Self {
        match direction {
            Direction::Positive => Self::PositiveInfinity,
            Direction::Negative => Self::NegativeInfinity,
        }
    }

    /// The infinitesimal just past `key` when scanning in `direction`.
    #[must_use]
    pub const fn after(key: K, direction: Direction) -> Self {
        match direction {
            Direction::Positive => Self::PositiveInfinitesimal(key),
            Direction::Negative => Self::NegativeInfinitesimal(key),
        }
    }

    #[must_use]
    pub const fn value_type(&self) -> EntireValueType {
        match self {
            Self::NegativeInfinity => EntireValueType::NegativeInfinity,
            Self::NegativeInfinitesimal(_) => EntireValueType::NegativeInfinitesimal,
            Self::Exact(_) => EntireValueType::Exact,
            Self::PositiveInfinitesimal(_) => EntireValueType::PositiveInfinitesimal,
            Self::PositiveInfinity => EntireValueType::PositiveInfinity,
        }
    }

    #[must_use]
    pub const fn value(&self) -> Option<&K> {
        match self {
            Self::NegativeInfinitesimal(k) | Self::Exact(k) | Self::PositiveInfinitesimal(k) => {
                Some(k)
            }
            Self::NegativeInfinity | Self::PositiveInfinity => None,
        }
    }

    #[must_use]
    pub const fn has_value(&self) -> bool {
        self.value().is_some()
    }

    #[must_use]
    pub const fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }

    /// Transform the carried key, keeping the marker. Infinity markers pass
    /// through untouched.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(K) -> U) -> Entire<U> {
        match self {
            Self::NegativeInfinity => Entire::NegativeInfinity,
            Self::NegativeInfinitesimal(k) => Entire::NegativeInfinitesimal(f(k)),
            Self::Exact(k) => Entire::Exact(f(k)),
            Self::PositiveInfinitesimal(k) => Entire::PositiveInfinitesimal(f(k)),
            Self::PositiveInfinity => Entire::PositiveInfinity,
        }
    }

    /// Borrowing variant of [`Entire::map`].
    #[must_use]
    pub fn map_ref<U>(&self, f: impl FnOnce(&K) -> U) -> Entire<U> {
        match self {
            Self::NegativeInfinity => Entire::NegativeInfinity,
            Self::NegativeInfinitesimal(k) => Entire::NegativeInfinitesimal(f(k)),
            Self::Exact(k) => Entire::Exact(f(k)),
            Self::PositiveInfinitesimal(k) => Entire::PositiveInfinitesimal(f(k)),
            Self::PositiveInfinity => Entire::PositiveInfinity,
        }
    }

    // Infinity markers bracket every valued point.
    const fn infinity_rank(&self) -> u8 {
        match self {
            Self::NegativeInfinity => 0,
            Self::PositiveInfinity => 2,
            _ => 1,
        }
    }

    // Position relative to the carried key.
    const fn shift(&self) -> i8 {
        match self {
            Self::NegativeInfinitesimal(_) => -1,
            Self::PositiveInfinitesimal(_) => 1,
            _ => 0,
        }
    }

    /// Compare this point against a plain key.
    #[must_use]
    pub fn compare_key(&self, key: &K, comparer: &KeyComparer<K>) -> Ordering {
        match self {
            Self::NegativeInfinity => Ordering::Less,
            Self::PositiveInfinity => Ordering::Greater,
            Self::Exact(k) => comparer.compare(k, key),
            Self::NegativeInfinitesimal(k) => comparer.compare(k, key).then(Ordering::Less),
            Self::PositiveInfinitesimal(k) => comparer.compare(k, key).then(Ordering::Greater),
        }
    }

    /// Total order over points.
    #[must_use]
    pub fn compare(&self, other: &Self, comparer: &KeyComparer<K>) -> Ordering {
        match (self.value(), other.value()) {
            (Some(left), Some(right)) => comparer
                .compare(left, right)
                .then(self.shift().cmp(&other.shift())),
            _ => self.infinity_rank().cmp(&other.infinity_rank()),
        }
    }
}

impl<K> From<K> for Entire<K> {
    fn from(key: K) -> Self {
        Self::Exact(key)
    }
}

///
/// Range
///
/// Directionless pair of endpoints covering `first <= k <= second`.
/// Empty when `first > second`. Scan direction is supplied separately.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Range<T> {
    first: T,
    second: T,
}

impl<T> Range<T> {
    #[must_use]
    pub const fn new(first: T, second: T) -> Self {
        Self { first, second }
    }

    #[must_use]
    pub const fn first(&self) -> &T {
        &self.first
    }

    #[must_use]
    pub const fn second(&self) -> &T {
        &self.second
    }

    /// Endpoint a scan in `direction` starts from.
    #[must_use]
    pub const fn start(&self, direction: Direction) -> &T {
        match direction {
            Direction::Positive => &self.first,
            Direction::Negative => &self.second,
        }
    }

    /// Endpoint a scan in `direction` stops at.
    #[must_use]
    pub const fn end(&self, direction: Direction) -> &T {
        match direction {
            Direction::Positive => &self.second,
            Direction::Negative => &self.first,
        }
    }

    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Range<U> {
        Range {
            first: f(self.first),
            second: f(self.second),
        }
    }
}

impl<K> Range<Entire<K>> {
    /// `(-inf, +inf)`.
    #[must_use]
    pub const fn full() -> Self {
        Self::new(Entire::NegativeInfinity, Entire::PositiveInfinity)
    }

    /// Single-key range.
    #[must_use]
    pub fn point(key: K) -> Self
    where
        K: Clone,
    {
        Self::new(Entire::Exact(key.clone()), Entire::Exact(key))
    }

    /// Range starting at `point` and running to the infinity in `direction`.
    #[must_use]
    pub const fn from_ray(point: Entire<K>, direction: Direction) -> Self {
        match direction {
            Direction::Positive => Self::new(point, Entire::PositiveInfinity),
            Direction::Negative => Self::new(Entire::NegativeInfinity, point),
        }
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(
            (&self.first, &self.second),
            (Entire::NegativeInfinity, Entire::PositiveInfinity)
        )
    }

    #[must_use]
    pub fn is_empty(&self, comparer: &KeyComparer<K>) -> bool {
        self.first.compare(&self.second, comparer) == Ordering::Greater
    }

    #[must_use]
    pub fn contains_key(&self, key: &K, comparer: &KeyComparer<K>) -> bool {
        self.first.compare_key(key, comparer) != Ordering::Greater
            && self.second.compare_key(key, comparer) != Ordering::Less
    }
}

///
/// Ray
///
/// Scan start point plus direction.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Ray<T> {
    point: T,
    direction: Direction,
}

impl<T> Ray<T> {
    #[must_use]
    pub const fn new(point: T, direction: Direction) -> Self {
        Self { point, direction }
    }

    #[must_use]
    pub const fn point(&self) -> &T {
        &self.point
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn into_point(self) -> T {
        self.point
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Ray<U> {
        Ray {
            point: f(self.point),
            direction: self.direction,
        }
    }
}

impl<K> Ray<Entire<K>> {
    /// Positive ray at `Exact(key)`.
    #[must_use]
    pub const fn exact(key: K) -> Self {
        Self::new(Entire::Exact(key), Direction::Positive)
    }
}

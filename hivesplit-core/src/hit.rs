//! Compact hit records and their two total orderings.
//!
//! A [`Hit`] points back into native per-sensor pulse storage through
//! `(sensor_index, pulse_index)`. That pair is the hit's identity; time and
//! charge are payload. Hits are kept in one of two sorted sets:
//!
//! - [`RetrievalOrderedHits`]: `(sensor_index, pulse_index)` ascending, which
//!   mirrors the native storage layout.
//! - [`TimeOrderedHits`]: time ascending, ties broken by identity, which is
//!   the order the clustering engine consumes hits in.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single detected pulse in compact form.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit {
    /// Position of the sensor among the keys of the readout's pulse map.
    pub sensor_index: u32,
    /// Ordinal of the pulse within that sensor's pulse list.
    pub pulse_index: u32,
    /// Pulse time.
    pub time: f64,
    /// Pulse charge.
    pub charge: f64,
}

impl Hit {
    /// Creates a new hit.
    #[inline]
    #[must_use]
    pub fn new(sensor_index: u32, pulse_index: u32, time: f64, charge: f64) -> Self {
        Self {
            sensor_index,
            pulse_index,
            time,
            charge,
        }
    }

    /// Returns the identity pair `(sensor_index, pulse_index)`.
    #[inline]
    #[must_use]
    pub fn identity(&self) -> (u32, u32) {
        (self.sensor_index, self.pulse_index)
    }

    /// Compares identity and payload bit for bit.
    #[inline]
    #[must_use]
    pub fn same_payload(&self, other: &Self) -> bool {
        self.identity() == other.identity()
            && self.time.to_bits() == other.time.to_bits()
            && self.charge.to_bits() == other.charge.to_bits()
    }
}

impl PartialEq for Hit {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Hit {}

impl Hash for Hit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// A hit ordered by `(sensor_index, pulse_index)`.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalOrdered(pub Hit);

impl PartialEq for RetrievalOrdered {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RetrievalOrdered {}

impl PartialOrd for RetrievalOrdered {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RetrievalOrdered {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.identity().cmp(&other.0.identity())
    }
}

impl Deref for RetrievalOrdered {
    type Target = Hit;

    fn deref(&self) -> &Hit {
        &self.0
    }
}

/// A hit ordered by time, ties broken by `(sensor_index, pulse_index)`.
#[derive(Debug, Clone, Copy)]
pub struct TimeOrdered(pub Hit);

impl PartialEq for TimeOrdered {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeOrdered {}

impl PartialOrd for TimeOrdered {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeOrdered {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .time
            .total_cmp(&other.0.time)
            .then_with(|| self.0.identity().cmp(&other.0.identity()))
    }
}

impl Deref for TimeOrdered {
    type Target = Hit;

    fn deref(&self) -> &Hit {
        &self.0
    }
}

/// Hits in retrieval order.
pub type RetrievalOrderedHits = BTreeSet<RetrievalOrdered>;

/// Hits in time order.
pub type TimeOrderedHits = BTreeSet<TimeOrdered>;

/// Re-sorts retrieval-ordered hits into time order.
#[must_use]
pub fn retrieval_ordered_to_time_ordered(hits: &RetrievalOrderedHits) -> TimeOrderedHits {
    hits.iter().map(|h| TimeOrdered(h.0)).collect()
}

/// Re-sorts time-ordered hits into retrieval order.
#[must_use]
pub fn time_ordered_to_retrieval_ordered(hits: &TimeOrderedHits) -> RetrievalOrderedHits {
    hits.iter().map(|h| RetrievalOrdered(h.0)).collect()
}

/// Returns true if the two sorted sets share at least one element.
///
/// Walks both sets in lockstep, so the cost is linear in the smaller prefix
/// that has to be skipped.
pub fn sets_intersect<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    let mut left = a.iter();
    let mut right = b.iter();
    let (mut l, mut r) = (left.next(), right.next());

    while let (Some(x), Some(y)) = (l, r) {
        match x.cmp(y) {
            Ordering::Less => l = left.next(),
            Ordering::Greater => r = right.next(),
            Ordering::Equal => return true,
        }
    }
    false
}

/// Union of two sorted sets.
#[must_use]
pub fn unite<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    a.union(b).cloned().collect()
}

/// Returns true if both sets hold exactly the same elements.
pub fn identical<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// Returns true if every element of `sub` is also in `sup`.
pub fn is_subset<T: Ord>(sub: &BTreeSet<T>, sup: &BTreeSet<T>) -> bool {
    sub.len() <= sup.len() && sub.is_subset(sup)
}

/// Earliest and latest hit time of a time-ordered set.
#[must_use]
pub fn time_span(hits: &TimeOrderedHits) -> Option<(f64, f64)> {
    let first = hits.first()?;
    let last = hits.last()?;
    Some((first.time, last.time))
}

//! Honeycomb ring registry.
//!
//! Strings are arranged so that every string is surrounded by concentric
//! rings of other strings. For each registered string the registry stores
//! `rings[n]`, the set of strings at graph distance `n` in the adjacency
//! graph; `rings[0]` is the string itself.
//!
//! The registry is bounded by `max_rings`. Any request past that bound is a
//! configuration error, which also keeps ring searches finite on malformed
//! input.

use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Per-string ring registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Honeycomb {
    max_rings: usize,
    rings: BTreeMap<i32, Vec<BTreeSet<i32>>>,
}

impl Honeycomb {
    /// Creates an empty registry holding at most `max_rings` rings per string
    /// (ring 0 not counted).
    #[must_use]
    pub fn new(max_rings: usize) -> Self {
        Self {
            max_rings,
            rings: BTreeMap::new(),
        }
    }

    /// Maximum ring index this registry accepts.
    #[must_use]
    pub fn max_rings(&self) -> usize {
        self.max_rings
    }

    /// Number of registered strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Returns true if no string is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Returns true if `string` has an entry.
    #[must_use]
    pub fn contains(&self, string: i32) -> bool {
        self.rings.contains_key(&string)
    }

    /// Registered strings in ascending order.
    pub fn strings(&self) -> impl Iterator<Item = i32> + '_ {
        self.rings.keys().copied()
    }

    /// Number of rings stored for `string`, ring 0 included.
    #[must_use]
    pub fn ring_count(&self, string: i32) -> usize {
        self.rings.get(&string).map_or(0, Vec::len)
    }

    /// Registers `string` with only its ring 0.
    pub fn register(&mut self, string: i32) {
        self.entry(string);
    }

    fn entry(&mut self, center: i32) -> &mut Vec<BTreeSet<i32>> {
        self.rings
            .entry(center)
            .or_insert_with(|| vec![BTreeSet::from([center])])
    }

    fn check_ring(&self, ring: usize) -> Result<()> {
        if ring > self.max_rings {
            return Err(Error::RingOutOfRange {
                ring,
                max: self.max_rings,
            });
        }
        Ok(())
    }

    /// Appends the next ring of `center` and returns its index.
    ///
    /// # Errors
    /// Returns [`Error::RingOutOfRange`] past the maximum ring and
    /// [`Error::InvalidRing`] if `center` is among the members.
    pub fn add_ring<I>(&mut self, center: i32, members: I) -> Result<usize>
    where
        I: IntoIterator<Item = i32>,
    {
        let ring = self.ring_count(center).max(1);
        self.check_ring(ring)?;
        let members: BTreeSet<i32> = members.into_iter().collect();
        if members.contains(&center) {
            return Err(Error::InvalidRing(format!(
                "string {center} cannot lie on its own ring {ring}"
            )));
        }
        self.entry(center).push(members);
        Ok(ring)
    }

    /// Replaces ring `ring` of `center`, padding skipped rings with empty sets.
    ///
    /// # Errors
    /// Returns [`Error::RingOutOfRange`] past the maximum ring and
    /// [`Error::InvalidRing`] for a ring 0 other than `{center}` or an outer
    /// ring holding `center`.
    pub fn set_ring<I>(&mut self, center: i32, ring: usize, members: I) -> Result<()>
    where
        I: IntoIterator<Item = i32>,
    {
        self.check_ring(ring)?;
        let members: BTreeSet<i32> = members.into_iter().collect();
        if ring == 0 {
            if members != BTreeSet::from([center]) {
                return Err(Error::InvalidRing(format!(
                    "ring 0 of string {center} must hold exactly the string itself"
                )));
            }
            self.entry(center);
            return Ok(());
        }
        if members.contains(&center) {
            return Err(Error::InvalidRing(format!(
                "string {center} cannot lie on its own ring {ring}"
            )));
        }

        let rings = self.entry(center);
        if rings.len() <= ring {
            rings.resize(ring + 1, BTreeSet::new());
        }
        rings[ring] = members;
        Ok(())
    }

    /// Ring `ring` of `center`, or `None` if the string or ring is not stored.
    ///
    /// # Errors
    /// Returns [`Error::RingOutOfRange`] past the maximum ring.
    pub fn get_ring(&self, center: i32, ring: usize) -> Result<Option<&BTreeSet<i32>>> {
        self.check_ring(ring)?;
        Ok(self.rings.get(&center).and_then(|rings| rings.get(ring)))
    }

    /// Ring index of `target` as seen from `center`.
    ///
    /// Returns `Some(0)` for the string itself, `Some(n)` for the innermost
    /// ring holding `target` within `max_depth`, and `None` if `center` is
    /// unregistered or `target` is not reachable within `max_depth`.
    ///
    /// # Errors
    /// Returns [`Error::RingOutOfRange`] if `max_depth` exceeds the maximum
    /// ring.
    pub fn which_ring(&self, center: i32, target: i32, max_depth: usize) -> Result<Option<usize>> {
        self.check_ring(max_depth)?;
        if center == target {
            return Ok(Some(0));
        }
        let Some(rings) = self.rings.get(&center) else {
            return Ok(None);
        };
        Ok(rings
            .iter()
            .enumerate()
            .take(max_depth + 1)
            .skip(1)
            .find(|(_, members)| members.contains(&target))
            .map(|(ring, _)| ring))
    }

    /// Records that `a` lies on ring `ring` of `b` and vice versa.
    ///
    /// # Errors
    /// Returns [`Error::RingOutOfRange`] past the maximum ring and
    /// [`Error::InvalidRing`] when ring 0 joins two strings or an outer ring
    /// joins a string to itself.
    pub fn mutually_register(&mut self, a: i32, b: i32, ring: usize) -> Result<()> {
        self.check_ring(ring)?;
        if ring == 0 {
            if a != b {
                return Err(Error::InvalidRing(format!(
                    "strings {a} and {b} cannot share ring 0"
                )));
            }
            self.register(a);
            return Ok(());
        }
        if a == b {
            return Err(Error::InvalidRing(format!(
                "string {a} cannot lie on its own ring {ring}"
            )));
        }

        for (center, other) in [(a, b), (b, a)] {
            let rings = self.entry(center);
            if rings.len() <= ring {
                rings.resize(ring + 1, BTreeSet::new());
            }
            rings[ring].insert(other);
        }
        Ok(())
    }

    /// Derives a registry from horizontal string positions.
    ///
    /// Strings whose horizontal separation is at most `neighbor_radius` are
    /// ring-1 neighbours. Outer rings follow by breadth-first expansion up to
    /// `max_rings`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] for a radius that is not positive.
    pub fn from_string_positions(
        positions: &BTreeMap<i32, (f64, f64)>,
        neighbor_radius: f64,
        max_rings: usize,
    ) -> Result<Self> {
        if neighbor_radius.is_nan() || neighbor_radius <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "neighbor radius must be positive, got {neighbor_radius}"
            )));
        }

        let mut adjacency: BTreeMap<i32, BTreeSet<i32>> =
            positions.keys().map(|&s| (s, BTreeSet::new())).collect();
        for (&a, &(ax, ay)) in positions {
            for (&b, &(bx, by)) in positions.range((Bound::Excluded(a), Bound::Unbounded)) {
                if (ax - bx).hypot(ay - by) <= neighbor_radius {
                    adjacency.entry(a).or_default().insert(b);
                    adjacency.entry(b).or_default().insert(a);
                }
            }
        }

        let mut honeycomb = Self::new(max_rings);
        for &center in positions.keys() {
            honeycomb.register(center);

            let mut visited = BTreeSet::from([center]);
            let mut frontier = BTreeSet::from([center]);
            for ring in 1..=max_rings {
                let next: BTreeSet<i32> = frontier
                    .iter()
                    .flat_map(|s| adjacency[s].iter().copied())
                    .filter(|s| !visited.contains(s))
                    .collect();
                if next.is_empty() {
                    break;
                }
                for &target in &next {
                    honeycomb.mutually_register(center, target, ring)?;
                }
                visited.extend(next.iter().copied());
                frontier = next;
            }
        }

        log::debug!(
            "derived honeycomb for {} strings with up to {} rings",
            honeycomb.len(),
            max_rings
        );
        Ok(honeycomb)
    }
}

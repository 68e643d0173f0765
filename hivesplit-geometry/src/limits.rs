//! Ring-distance limits per zone combination.
//!
//! For a sensor pair whose strings lie on ring `n` of each other, the pair is
//! connected if the vertical offset between the two sensors stays inside
//! `[-below_n, +above_n]`. Pairs on rings past the last configured entry are
//! never connected.

use crate::error::{Error, Result};
use crate::topology::{Zone, ZonePair};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How limit values are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitUnit {
    /// Limits are absolute distances.
    #[default]
    Absolute,
    /// Limits are multiples of a nominal vertical sensor spacing.
    SpacingMultiple { nominal_spacing: f64 },
}

impl LimitUnit {
    fn scale(self) -> f64 {
        match self {
            LimitUnit::Absolute => 1.0,
            LimitUnit::SpacingMultiple { nominal_spacing } => nominal_spacing,
        }
    }
}

/// Allowed vertical offset for one ring.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VerticalLimit {
    /// How far the partner may sit below.
    pub below: f64,
    /// How far the partner may sit above.
    pub above: f64,
}

impl VerticalLimit {
    /// Creates a limit window.
    #[must_use]
    pub fn new(below: f64, above: f64) -> Self {
        Self { below, above }
    }

    /// Symmetric limit window.
    #[must_use]
    pub fn symmetric(extent: f64) -> Self {
        Self::new(extent, extent)
    }
}

/// Vertical limits per ring for one zone combination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RingLimits {
    /// Unit of the limit values.
    #[serde(default)]
    pub unit: LimitUnit,
    /// Entry `n` applies to ring `n`.
    pub rings: Vec<VerticalLimit>,
}

impl RingLimits {
    /// Absolute limits, one entry per ring starting at ring 0.
    #[must_use]
    pub fn absolute(rings: Vec<VerticalLimit>) -> Self {
        Self {
            unit: LimitUnit::Absolute,
            rings,
        }
    }

    /// Limits as multiples of `nominal_spacing`.
    #[must_use]
    pub fn in_spacings(nominal_spacing: f64, rings: Vec<VerticalLimit>) -> Self {
        Self {
            unit: LimitUnit::SpacingMultiple { nominal_spacing },
            rings,
        }
    }

    /// Builds limits from flat `[below_0, above_0, below_1, above_1, ...]` pairs.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRing`] for an empty or odd-length list.
    pub fn from_pairs(unit: LimitUnit, values: &[f64]) -> Result<Self> {
        if values.is_empty() || values.len() % 2 != 0 {
            return Err(Error::InvalidRing(format!(
                "ring limits need a non-empty list of (below, above) pairs, got {} values",
                values.len()
            )));
        }
        Ok(Self {
            unit,
            rings: values
                .chunks_exact(2)
                .map(|pair| VerticalLimit::new(pair[0], pair[1]))
                .collect(),
        })
    }

    /// Highest ring these limits cover, or `None` if empty.
    #[must_use]
    pub fn max_ring(&self) -> Option<usize> {
        self.rings.len().checked_sub(1)
    }

    /// Returns true if a partner offset by `dz` vertically on ring `ring` is
    /// inside the limits.
    #[inline]
    #[must_use]
    pub fn allows(&self, ring: usize, dz: f64) -> bool {
        let scale = self.unit.scale();
        self.rings
            .get(ring)
            .is_some_and(|limit| -limit.below * scale <= dz && dz <= limit.above * scale)
    }

    fn validate(&self) -> Result<()> {
        if self.rings.is_empty() {
            return Err(Error::InvalidRing("ring limits are empty".to_string()));
        }
        if let LimitUnit::SpacingMultiple { nominal_spacing } = self.unit {
            if nominal_spacing.is_nan() || nominal_spacing <= 0.0 {
                return Err(Error::InvalidRing(format!(
                    "nominal sensor spacing must be positive, got {nominal_spacing}"
                )));
            }
        }
        for (ring, limit) in self.rings.iter().enumerate() {
            let valid = |v: f64| !v.is_nan() && v >= 0.0;
            if !(valid(limit.below) && valid(limit.above)) {
                return Err(Error::InvalidRing(format!(
                    "limits of ring {ring} must be non-negative"
                )));
            }
        }
        Ok(())
    }
}

/// Ring limits for every zone combination.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RingLimitTable {
    limits: BTreeMap<ZonePair, RingLimits>,
}

impl RingLimitTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the limits of a zone combination.
    pub fn set(&mut self, pair: ZonePair, limits: RingLimits) {
        self.limits.insert(pair, limits);
    }

    /// Sets the limits of a zone combination and returns the table.
    #[must_use]
    pub fn with(mut self, pair: ZonePair, limits: RingLimits) -> Self {
        self.set(pair, limits);
        self
    }

    /// Limits applying to `pair`.
    ///
    /// Mixed pairs without an entry of their own use the sparser zone's limits.
    ///
    /// # Errors
    /// Returns [`Error::MissingRingLimits`] if neither entry exists.
    pub fn resolve(&self, pair: ZonePair) -> Result<&RingLimits> {
        self.limits
            .get(&pair)
            .or_else(|| {
                let sparser = pair.sparser();
                self.limits.get(&ZonePair::new(sparser, sparser))
            })
            .ok_or(Error::MissingRingLimits(pair))
    }

    /// Highest ring covered by any entry.
    #[must_use]
    pub fn max_ring(&self) -> usize {
        self.limits
            .values()
            .filter_map(RingLimits::max_ring)
            .max()
            .unwrap_or(0)
    }

    /// Checks every entry and that no entry reaches past `max_rings`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRing`] for an empty table or negative limits,
    /// and [`Error::RingOutOfRange`] if an entry reaches past `max_rings`.
    pub fn validate(&self, max_rings: usize) -> Result<()> {
        if self.limits.is_empty() {
            return Err(Error::InvalidRing("ring limit table is empty".to_string()));
        }
        for limits in self.limits.values() {
            limits.validate()?;
        }
        let needed = self.max_ring();
        if needed > max_rings {
            return Err(Error::RingOutOfRange {
                ring: needed,
                max: max_rings,
            });
        }
        Ok(())
    }

    /// Drops the limits of every ring past `max_rings`.
    #[must_use]
    pub fn truncated(mut self, max_rings: usize) -> Self {
        for limits in self.limits.values_mut() {
            limits.rings.truncate(max_rings + 1);
        }
        self
    }

    /// Limits for a detector with regular strings and two denser infills.
    ///
    /// Values are vertical offsets in metres for rings 0, 1, 2 (and 3 for the
    /// ultra-dense infill).
    #[must_use]
    pub fn icecube_defaults() -> Self {
        let single = [300.0, 300.0, 272.7, 272.7, 165.8, 165.8];
        let double = [75.0, 75.0, 131.5, 131.5, 40.8, 40.8];
        let triple = [75.0, 75.0, 75.0, 75.0, 68.5, 68.5, 17.4, 17.4];

        let pairs = |values: &[f64]| RingLimits {
            unit: LimitUnit::Absolute,
            rings: values
                .chunks_exact(2)
                .map(|p| VerticalLimit::new(p[0], p[1]))
                .collect(),
        };

        Self::new()
            .with(ZonePair::new(Zone::Sparse, Zone::Sparse), pairs(&single))
            .with(ZonePair::new(Zone::Dense, Zone::Dense), pairs(&double))
            .with(ZonePair::new(Zone::UltraDense, Zone::UltraDense), pairs(&triple))
    }
}

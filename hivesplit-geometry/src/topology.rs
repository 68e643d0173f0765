//! Sensor topology zones.
//!
//! Zones describe how densely a region of the detector is instrumented. They
//! only decide which ring-limit table applies to a sensor pair.

use crate::detector::Geometry;
use hivesplit_core::SensorKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Instrumentation density of a detector region, sparsest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Regular, widely spaced strings.
    #[default]
    Sparse,
    /// Densely instrumented infill.
    Dense,
    /// Most densely instrumented infill.
    UltraDense,
}

impl Zone {
    /// All zones, sparsest first.
    pub const ALL: [Zone; 3] = [Zone::Sparse, Zone::Dense, Zone::UltraDense];
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Zone::Sparse => "sparse",
            Zone::Dense => "dense",
            Zone::UltraDense => "ultra_dense",
        };
        f.write_str(name)
    }
}

/// Unordered combination of two zones, stored sparsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZonePair(Zone, Zone);

impl ZonePair {
    /// Creates the canonical pair for two zones in any order.
    #[must_use]
    pub fn new(a: Zone, b: Zone) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// The sparser zone of the pair.
    #[must_use]
    pub fn sparser(&self) -> Zone {
        self.0
    }

    /// The denser zone of the pair.
    #[must_use]
    pub fn denser(&self) -> Zone {
        self.1
    }

    /// Returns true if both zones are the same.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        self.0 == self.1
    }
}

impl fmt::Display for ZonePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Zone classification of every sensor of a geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    zones: BTreeMap<SensorKey, Zone>,
}

impl Topology {
    /// Collects the zone of every sensor in `geometry`.
    #[must_use]
    pub fn from_geometry(geometry: &Geometry) -> Self {
        Self {
            zones: geometry
                .sensors()
                .map(|(key, sensor)| (*key, sensor.zone))
                .collect(),
        }
    }

    /// Assigns a zone to a sensor.
    pub fn classify(&mut self, key: SensorKey, zone: Zone) {
        self.zones.insert(key, zone);
    }

    /// Zone of a sensor, or `None` for unknown sensors.
    #[must_use]
    pub fn zone_of(&self, key: SensorKey) -> Option<Zone> {
        self.zones.get(&key).copied()
    }

    /// Returns true if the sensor belongs to the sparse zone.
    #[must_use]
    pub fn is_sparse(&self, key: SensorKey) -> bool {
        self.zone_of(key) == Some(Zone::Sparse)
    }

    /// Returns true if the sensor belongs to the dense zone.
    #[must_use]
    pub fn is_dense(&self, key: SensorKey) -> bool {
        self.zone_of(key) == Some(Zone::Dense)
    }

    /// Returns true if the sensor belongs to the ultra-dense zone.
    #[must_use]
    pub fn is_ultra_dense(&self, key: SensorKey) -> bool {
        self.zone_of(key) == Some(Zone::UltraDense)
    }

    /// Zone combination of two sensors.
    #[must_use]
    pub fn zone_pair(&self, a: SensorKey, b: SensorKey) -> Option<ZonePair> {
        Some(ZonePair::new(self.zone_of(a)?, self.zone_of(b)?))
    }

    /// Number of sensors in `zone`.
    #[must_use]
    pub fn count(&self, zone: Zone) -> usize {
        self.zones.values().filter(|&&z| z == zone).count()
    }
}

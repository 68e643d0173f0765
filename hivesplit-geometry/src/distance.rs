//! Precomputed sensor-pair distance table.
//!
//! The table covers every sensor of a geometry and is stored as a packed
//! lower triangle, so `(i, j)` and `(j, i)` share one cell. Disconnected pairs
//! hold NaN. Building is the only expensive step; lookups are plain indexing.
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use crate::detector::Geometry;
use crate::error::{Error, Result};
use crate::honeycomb::Honeycomb;
use crate::limits::RingLimitTable;
use crate::topology::Topology;
use hivesplit_core::SensorKey;
use rayon::prelude::*;

/// Settings for deriving connectivity from a geometry.
#[derive(Clone, Debug)]
pub struct ConnectivityConfig {
    /// Horizontal distance under which two strings are ring-1 neighbours.
    pub neighbor_radius: f64,
    /// Maximum ring index of the honeycomb.
    pub max_rings: usize,
    /// Vertical limits per ring and zone combination.
    pub ring_limits: RingLimitTable,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            neighbor_radius: 160.0,
            max_rings: 3,
            ring_limits: RingLimitTable::icecube_defaults(),
        }
    }
}

impl ConnectivityConfig {
    /// Sets the neighbour radius.
    #[must_use]
    pub fn with_neighbor_radius(mut self, radius: f64) -> Self {
        self.neighbor_radius = radius;
        self
    }

    /// Sets the maximum ring index.
    #[must_use]
    pub fn with_max_rings(mut self, max_rings: usize) -> Self {
        self.max_rings = max_rings;
        self
    }

    /// Sets the ring-limit table.
    #[must_use]
    pub fn with_ring_limits(mut self, limits: RingLimitTable) -> Self {
        self.ring_limits = limits;
        self
    }
}

/// Symmetric sensor-pair distance table.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTable {
    keys: Vec<SensorKey>,
    cells: Vec<f32>,
}

#[inline]
fn cell_index(i: usize, j: usize) -> usize {
    let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
    hi * (hi + 1) / 2 + lo
}

impl DistanceTable {
    /// Derives the honeycomb from the geometry's string layout and builds the
    /// table from it.
    ///
    /// # Errors
    /// Fails like [`Honeycomb::from_string_positions`] and [`Self::build`].
    pub fn from_geometry(geometry: &Geometry, config: &ConnectivityConfig) -> Result<Self> {
        let honeycomb = Honeycomb::from_string_positions(
            &geometry.string_positions(),
            config.neighbor_radius,
            config.max_rings,
        )?;
        Self::build(geometry, &honeycomb, &config.ring_limits)
    }

    /// Builds the table for every sensor pair of `geometry`.
    ///
    /// A pair is connected if its strings lie on ring `n` of each other
    /// within the ring count of the pair's zone limits and the vertical offset
    /// from the lower-keyed sensor to the other one is inside the ring-`n`
    /// window. A sensor is always connected to itself at distance 0.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] for an empty geometry, and the
    /// ring-limit errors of [`RingLimitTable::validate`] and
    /// [`RingLimitTable::resolve`].
    pub fn build(
        geometry: &Geometry,
        honeycomb: &Honeycomb,
        limits: &RingLimitTable,
    ) -> Result<Self> {
        limits.validate(honeycomb.max_rings())?;
        if geometry.is_empty() {
            return Err(Error::InvalidGeometry("geometry holds no sensors".to_string()));
        }

        let topology = Topology::from_geometry(geometry);
        let sensors: Vec<_> = geometry.sensors().map(|(k, s)| (*k, *s)).collect();

        // Row j holds cells (0..=j, j).
        let rows: Vec<Vec<f32>> = (0..sensors.len())
            .into_par_iter()
            .map(|j| {
                let (key_b, sensor_b) = sensors[j];
                let mut row = Vec::with_capacity(j + 1);
                for &(key_a, sensor_a) in &sensors[..j] {
                    let pair = topology
                        .zone_pair(key_a, key_b)
                        .ok_or(Error::UnknownSensor(key_a))?;
                    let ring_limits = limits.resolve(pair)?;
                    let Some(max_ring) = ring_limits.max_ring() else {
                        row.push(f32::NAN);
                        continue;
                    };
                    let ring = honeycomb.which_ring(key_a.string, key_b.string, max_ring)?;
                    let dz = sensor_b.position.z - sensor_a.position.z;
                    let cell = match ring {
                        Some(ring) if ring_limits.allows(ring, dz) => {
                            sensor_a.position.distance(&sensor_b.position) as f32
                        }
                        _ => f32::NAN,
                    };
                    row.push(cell);
                }
                row.push(0.0);
                Ok(row)
            })
            .collect::<Result<_>>()?;

        let keys: Vec<SensorKey> = sensors.iter().map(|(k, _)| *k).collect();
        let cells: Vec<f32> = rows.into_iter().flatten().collect();
        let table = Self { keys, cells };

        log::debug!(
            "built distance table for {} sensors with {} connected pairs",
            table.len(),
            table.connected_pairs()
        );
        Ok(table)
    }

    /// Number of sensors covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the table covers no sensors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Table index of a sensor.
    #[must_use]
    pub fn index_of(&self, key: SensorKey) -> Option<usize> {
        self.keys.binary_search(&key).ok()
    }

    /// Sensor at a table index.
    #[must_use]
    pub fn key(&self, index: usize) -> Option<SensorKey> {
        self.keys.get(index).copied()
    }

    /// Distance between the sensors at table indices `i` and `j`, or `None`
    /// if they are not connected.
    ///
    /// # Panics
    /// Panics if an index is out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let d = self.cells[cell_index(i, j)];
        (!d.is_nan()).then_some(f64::from(d))
    }

    /// Distance between two sensors by key.
    #[must_use]
    pub fn distance(&self, a: SensorKey, b: SensorKey) -> Option<f64> {
        self.get(self.index_of(a)?, self.index_of(b)?)
    }

    /// Returns true if the sensors at `i` and `j` are connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self, i: usize, j: usize) -> bool {
        !self.cells[cell_index(i, j)].is_nan()
    }

    /// Number of connected pairs of distinct sensors.
    #[must_use]
    pub fn connected_pairs(&self) -> usize {
        let connected = self.cells.iter().filter(|d| !d.is_nan()).count();
        connected - self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Position;
    use crate::limits::{RingLimits, VerticalLimit};
    use crate::topology::{Zone, ZonePair};
    use approx::assert_relative_eq;

    /// Three strings in a row, 100 apart, two sensors each, 20 apart vertically.
    fn line_geometry() -> Geometry {
        let mut geometry = Geometry::new();
        for string in 1..=3 {
            for module in 1..=2 {
                geometry.insert(
                    SensorKey::new(string, module),
                    Position::new(
                        100.0 * f64::from(string - 1),
                        0.0,
                        -20.0 * f64::from(module - 1),
                    ),
                    Zone::Sparse,
                );
            }
        }
        geometry
    }

    fn line_limits(ring1_extent: f64) -> RingLimitTable {
        RingLimitTable::new().with(
            ZonePair::new(Zone::Sparse, Zone::Sparse),
            RingLimits::absolute(vec![
                VerticalLimit::symmetric(50.0),
                VerticalLimit::symmetric(ring1_extent),
            ]),
        )
    }

    #[test]
    fn test_cell_index_is_symmetric() {
        assert_eq!(cell_index(0, 0), 0);
        assert_eq!(cell_index(0, 1), 1);
        assert_eq!(cell_index(1, 1), 2);
        assert_eq!(cell_index(3, 1), cell_index(1, 3));
    }

    #[test]
    fn test_build_line() {
        let geometry = line_geometry();
        let config = ConnectivityConfig::default()
            .with_neighbor_radius(110.0)
            .with_max_rings(2)
            .with_ring_limits(line_limits(10.0));
        let table = DistanceTable::from_geometry(&geometry, &config).unwrap();
        assert_eq!(table.len(), 6);

        let a = SensorKey::new(1, 1);
        let a2 = SensorKey::new(1, 2);
        let b = SensorKey::new(2, 1);
        let b2 = SensorKey::new(2, 2);
        let c = SensorKey::new(3, 1);

        // same string, within ring 0 window
        assert_relative_eq!(table.distance(a, a2).unwrap(), 20.0);
        // neighbouring strings, level
        assert_relative_eq!(table.distance(a, b).unwrap(), 100.0);
        assert_relative_eq!(table.distance(b, a).unwrap(), 100.0);
        // neighbouring strings, vertical offset 20 > 10
        assert_eq!(table.distance(a, b2), None);
        // ring 2 not covered by the limits
        assert_eq!(table.distance(a, c), None);
        // self
        assert_relative_eq!(table.distance(c, c).unwrap(), 0.0);
        assert!(table.is_connected(0, 0));
    }

    #[test]
    fn test_connected_pairs_count() {
        let geometry = line_geometry();
        let config = ConnectivityConfig::default()
            .with_neighbor_radius(110.0)
            .with_max_rings(2)
            .with_ring_limits(line_limits(30.0));
        let table = DistanceTable::from_geometry(&geometry, &config).unwrap();
        // 3 intra-string pairs + 2 neighbouring string pairs x 4 sensor pairs
        assert_eq!(table.connected_pairs(), 3 + 2 * 4);
    }

    #[test]
    fn test_limits_past_honeycomb_are_fatal() {
        let geometry = line_geometry();
        let honeycomb = Honeycomb::new(0);
        let result = DistanceTable::build(&geometry, &honeycomb, &line_limits(10.0));
        assert!(matches!(
            result,
            Err(Error::RingOutOfRange { ring: 1, max: 0 })
        ));
    }

    #[test]
    fn test_unregistered_string_is_not_connected() {
        let geometry = line_geometry();
        let mut honeycomb = Honeycomb::new(1);
        honeycomb.mutually_register(1, 2, 1).unwrap();
        let table = DistanceTable::build(&geometry, &honeycomb, &line_limits(30.0)).unwrap();
        assert!(table.distance(SensorKey::new(1, 1), SensorKey::new(2, 1)).is_some());
        assert_eq!(
            table.distance(SensorKey::new(3, 1), SensorKey::new(2, 1)),
            None
        );
        // sensors on string 3 still see each other through ring 0
        assert!(table.distance(SensorKey::new(3, 1), SensorKey::new(3, 2)).is_some());
    }

    #[test]
    fn test_empty_geometry_is_rejected() {
        let result = DistanceTable::build(&Geometry::new(), &Honeycomb::new(3), &line_limits(1.0));
        assert!(matches!(result, Err(Error::InvalidGeometry(_))));
    }
}

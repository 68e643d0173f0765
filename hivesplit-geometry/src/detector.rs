//! Detector geometry: sensor positions and zones.

use crate::error::{Error, Result};
use crate::topology::Zone;
use hivesplit_core::SensorKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Cartesian sensor position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Per-sensor geometry record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorGeometry {
    /// Sensor position.
    pub position: Position,
    /// Topology zone of the sensor.
    pub zone: Zone,
}

/// Positions and zones of all sensors in the detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    sensors: BTreeMap<SensorKey, SensorGeometry>,
}

// Intermediate structs for the JSON geometry schema
#[derive(Deserialize)]
struct JsonGeometry {
    sensors: Vec<JsonSensor>,
}

#[derive(Deserialize)]
struct JsonSensor {
    string: i32,
    module: u32,
    position: [f64; 3],
    #[serde(default)]
    zone: Zone,
}

impl Geometry {
    /// Creates an empty geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a sensor.
    pub fn insert(&mut self, key: SensorKey, position: Position, zone: Zone) {
        self.sensors.insert(key, SensorGeometry { position, zone });
    }

    /// Adds a sensor and returns the updated geometry.
    #[must_use]
    pub fn with_sensor(mut self, key: SensorKey, position: Position, zone: Zone) -> Self {
        self.insert(key, position, zone);
        self
    }

    /// Number of sensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// Returns true if the geometry holds no sensors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Geometry record of a sensor.
    #[must_use]
    pub fn get(&self, key: SensorKey) -> Option<&SensorGeometry> {
        self.sensors.get(&key)
    }

    /// Sensors in key order.
    pub fn sensors(&self) -> impl Iterator<Item = (&SensorKey, &SensorGeometry)> {
        self.sensors.iter()
    }

    /// Sorted sensor keys.
    #[must_use]
    pub fn keys(&self) -> Vec<SensorKey> {
        self.sensors.keys().copied().collect()
    }

    /// Horizontal position of every string, averaged over its sensors.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn string_positions(&self) -> BTreeMap<i32, (f64, f64)> {
        let mut sums: BTreeMap<i32, (f64, f64, usize)> = BTreeMap::new();
        for (key, sensor) in &self.sensors {
            let entry = sums.entry(key.string).or_insert((0.0, 0.0, 0));
            entry.0 += sensor.position.x;
            entry.1 += sensor.position.y;
            entry.2 += 1;
        }
        sums.into_iter()
            .map(|(string, (x, y, n))| (string, (x / n as f64, y / n as f64)))
            .collect()
    }

    /// Load a geometry from a JSON file.
    ///
    /// # Errors
    /// Returns an I/O or JSON error, or [`Error::InvalidGeometry`] for
    /// duplicate or non-finite sensors.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let json: JsonGeometry = serde_json::from_reader(reader)?;
        Self::from_json_geometry(json)
    }

    /// Load a geometry from a JSON string.
    ///
    /// # Errors
    /// Returns a JSON error, or [`Error::InvalidGeometry`] for duplicate or
    /// non-finite sensors.
    pub fn from_json(json: &str) -> Result<Self> {
        let json: JsonGeometry = serde_json::from_str(json)?;
        Self::from_json_geometry(json)
    }

    fn from_json_geometry(json: JsonGeometry) -> Result<Self> {
        let mut geometry = Self::new();
        for sensor in json.sensors {
            let key = SensorKey::new(sensor.string, sensor.module);
            let [x, y, z] = sensor.position;
            if !(x.is_finite() && y.is_finite() && z.is_finite()) {
                return Err(Error::InvalidGeometry(format!(
                    "sensor {key} has a non-finite position"
                )));
            }
            if geometry.get(key).is_some() {
                return Err(Error::InvalidGeometry(format!(
                    "sensor {key} is listed twice"
                )));
            }
            geometry.insert(key, Position::new(x, y, z), sensor.zone);
        }
        Ok(geometry)
    }
}

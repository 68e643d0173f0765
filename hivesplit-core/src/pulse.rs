//! Native pulse records and per-sensor pulse maps.

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sensor identifier: the string a sensor hangs on and its position along it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorKey {
    /// String (vertical line) number.
    pub string: i32,
    /// Module number along the string.
    pub module: u32,
}

impl SensorKey {
    /// Creates a new sensor key.
    #[inline]
    #[must_use]
    pub fn new(string: i32, module: u32) -> Self {
        Self { string, module }
    }
}

impl fmt::Display for SensorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.string, self.module)
    }
}

/// Minimal read contract for a native pulse record.
///
/// The clustering engine never looks at anything but time and charge, so any
/// detector-specific pulse type can be split as long as it exposes these two.
pub trait PulseRecord: Clone + Send + Sync {
    /// Returns the pulse time.
    fn time(&self) -> f64;

    /// Returns the pulse charge.
    fn charge(&self) -> f64;
}

/// Default native pulse record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pulse {
    /// Leading-edge time.
    pub time: f64,
    /// Deposited charge.
    pub charge: f64,
    /// Pulse width (carried through untouched).
    #[cfg_attr(feature = "serde", serde(default))]
    pub width: f64,
}

impl Pulse {
    /// Creates a pulse with zero width.
    #[inline]
    #[must_use]
    pub fn new(time: f64, charge: f64) -> Self {
        Self {
            time,
            charge,
            width: 0.0,
        }
    }

    /// Sets the pulse width.
    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }
}

impl PulseRecord for Pulse {
    #[inline]
    fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    fn charge(&self) -> f64 {
        self.charge
    }
}

/// Per-sensor pulse lists, each in arrival order.
pub type PulseMap<P = Pulse> = BTreeMap<SensorKey, Vec<P>>;

/// Keys of a pulse map, indexable by a hit's `sensor_index`.
#[must_use]
pub fn sensor_keys<P>(pulses: &PulseMap<P>) -> Vec<SensorKey> {
    pulses.keys().copied().collect()
}

/// Total number of pulses held by a pulse map.
#[must_use]
pub fn pulse_count<P>(pulses: &PulseMap<P>) -> usize {
    pulses.values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_key_ordering() {
        let a = SensorKey::new(1, 60);
        let b = SensorKey::new(2, 1);
        let c = SensorKey::new(2, 3);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "(1, 60)");
    }

    #[test]
    fn test_pulse_map_helpers() {
        let mut pulses = PulseMap::new();
        pulses.insert(
            SensorKey::new(5, 2),
            vec![Pulse::new(10.0, 1.0), Pulse::new(12.0, 0.5)],
        );
        pulses.insert(SensorKey::new(3, 7), vec![Pulse::new(4.0, 2.0)]);

        assert_eq!(pulse_count(&pulses), 3);
        assert_eq!(
            sensor_keys(&pulses),
            vec![SensorKey::new(3, 7), SensorKey::new(5, 2)]
        );
    }

    #[test]
    fn test_pulse_record() {
        let pulse = Pulse::new(100.0, 1.5).with_width(8.0);
        assert!((pulse.time() - 100.0).abs() < f64::EPSILON);
        assert!((pulse.charge() - 1.5).abs() < f64::EPSILON);
        assert!((pulse.width - 8.0).abs() < f64::EPSILON);
    }
}

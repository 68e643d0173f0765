//! Conversion between native pulse maps and compact hits.
#![allow(clippy::cast_possible_truncation)]

use crate::error::{Error, Result};
use crate::hit::{Hit, RetrievalOrdered, RetrievalOrderedHits};
use crate::pulse::{PulseMap, PulseRecord};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which pulses of a sensor become hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExtractionMode {
    /// One hit per native pulse.
    #[default]
    AllHits,
    /// One hit per sensor, taken from its first pulse.
    FirstHitOnly,
    /// One hit per sensor with the first pulse's time and the summed charge
    /// of every pulse on that sensor.
    TotalChargeToFirstHit,
}

impl ExtractionMode {
    /// Whether hits extracted in this mode stand for the sensor's whole pulse
    /// list rather than for individual pulses.
    #[must_use]
    pub fn collapses_sensors(self) -> bool {
        !matches!(self, Self::AllHits)
    }
}

/// Builds the retrieval-ordered hit set of a pulse map.
///
/// Sensors without pulses produce no hits but still occupy their
/// `sensor_index` slot, so indices always match the map's key order.
pub fn extract_hits<P: PulseRecord>(
    pulses: &PulseMap<P>,
    mode: ExtractionMode,
) -> RetrievalOrderedHits {
    let mut hits = RetrievalOrderedHits::new();

    for (sensor_index, series) in pulses.values().enumerate() {
        let sensor_index = sensor_index as u32;
        match mode {
            ExtractionMode::AllHits => {
                hits.extend(series.iter().enumerate().map(|(pulse_index, pulse)| {
                    RetrievalOrdered(Hit::new(
                        sensor_index,
                        pulse_index as u32,
                        pulse.time(),
                        pulse.charge(),
                    ))
                }));
            }
            ExtractionMode::FirstHitOnly => {
                if let Some(first) = series.first() {
                    hits.insert(RetrievalOrdered(Hit::new(
                        sensor_index,
                        0,
                        first.time(),
                        first.charge(),
                    )));
                }
            }
            ExtractionMode::TotalChargeToFirstHit => {
                if let Some(first) = series.first() {
                    let total: f64 = series.iter().map(PulseRecord::charge).sum();
                    hits.insert(RetrievalOrdered(Hit::new(
                        sensor_index,
                        0,
                        first.time(),
                        total,
                    )));
                }
            }
        }
    }

    hits
}

/// Rebuilds the native pulse map referenced by `hits`.
///
/// In strict mode (`use_all_hits == false`) exactly the referenced pulses are
/// copied and a reference outside `original` is a provenance error. With
/// `use_all_hits` every referenced sensor contributes its complete pulse list,
/// which expands hits from the collapsing extraction modes; only a missing
/// sensor is still an error.
///
/// `hits` must have been extracted from `original`. Nothing here can tell a
/// foreign hit set apart from a matching one if the indices happen to exist.
///
/// # Errors
/// Returns [`Error::MissingSensor`] for a sensor index past the map, and in
/// strict mode [`Error::MissingPulse`] for a pulse index past its sensor.
pub fn revert_hits<P: PulseRecord>(
    hits: &RetrievalOrderedHits,
    original: &PulseMap<P>,
    use_all_hits: bool,
) -> Result<PulseMap<P>> {
    let sensors: Vec<_> = original.iter().collect();
    let mut reverted = PulseMap::new();

    for hit in hits {
        let (key, series) = sensors
            .get(hit.sensor_index as usize)
            .ok_or(Error::MissingSensor {
                index: hit.sensor_index,
                available: sensors.len(),
            })?;

        if use_all_hits {
            reverted.entry(**key).or_insert_with(|| series.to_vec());
            continue;
        }

        let pulse = series
            .get(hit.pulse_index as usize)
            .ok_or(Error::MissingPulse {
                sensor: hit.sensor_index,
                pulse: hit.pulse_index,
                available: series.len(),
            })?;
        reverted.entry(**key).or_default().push(pulse.clone());
    }

    Ok(reverted)
}

//! Subevent output records and per-readout statistics.

use crate::pulse::{pulse_count, Pulse, PulseMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One split subevent, restricted to the native pulses it contains.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SubEventRecord<P = Pulse> {
    /// Position of the subevent within its readout (0-based).
    pub index: usize,
    /// Native pulses of the subevent.
    pub pulses: PulseMap<P>,
    /// Earliest hit time.
    pub start_time: f64,
    /// Latest hit time.
    pub stop_time: f64,
}

impl<P> SubEventRecord<P> {
    /// Number of sensors with at least one pulse in the subevent.
    #[must_use]
    pub fn sensor_count(&self) -> usize {
        self.pulses.len()
    }

    /// Number of native pulses in the subevent.
    #[must_use]
    pub fn pulse_count(&self) -> usize {
        pulse_count(&self.pulses)
    }

    /// Time between the first and the last hit.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.stop_time - self.start_time
    }
}

/// Counters gathered while splitting one readout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitStatistics {
    /// Hits fed through the engine.
    pub hits_processed: usize,
    /// Clusters created (singletons and subset splits).
    pub clusters_spawned: usize,
    /// Split-off clusters dropped because another cluster already held them.
    pub clusters_discarded: usize,
    /// Subevent candidates absorbed into an overlapping one.
    pub subevent_merges: usize,
    /// Subevents in the final collection.
    pub subevents_found: usize,
}

impl SplitStatistics {
    /// Adds another readout's counters to this one.
    pub fn accumulate(&mut self, other: &SplitStatistics) {
        self.hits_processed += other.hits_processed;
        self.clusters_spawned += other.clusters_spawned;
        self.clusters_discarded += other.clusters_discarded;
        self.subevent_merges += other.subevent_merges;
        self.subevents_found += other.subevents_found;
    }
}

//! The causal-cluster splitting engine.
//!
//! Hits are consumed strictly in time order. Every hit first ages all live
//! clusters to its own time, then joins each cluster it is causally connected
//! to. A hit connected to only part of a cluster forks a new cluster holding
//! that part plus the hit. Clusters that met their multiplicity hand their
//! hits to the subevent collection once they are exhausted, where overlapping
//! candidates are merged.

use crate::causal::{within_time_cone, CausalNorm, PropagationNorm};
use crate::cluster::{CausalCluster, MultiplicityMode};
use crate::error::{Result, SplitError};
use hivesplit_core::{
    extract_hits, is_subset, retrieval_ordered_to_time_ordered, revert_hits, sensor_keys,
    sets_intersect, time_ordered_to_retrieval_ordered, time_span, ExtractionMode, Hit, PulseMap,
    PulseRecord, SensorKey, SplitStatistics, SubEventRecord, TimeOrdered, TimeOrderedHits,
};
use hivesplit_geometry::{ConnectivityConfig, DistanceTable, Geometry};
use std::cmp::Ordering;
use std::sync::Arc;

/// Splitter configuration.
#[derive(Clone, Debug)]
pub struct SplitterConfig<N = PropagationNorm> {
    /// Multiplicity a cluster must reach to become a subevent candidate.
    pub multiplicity: usize,
    /// What the multiplicity counts.
    pub multiplicity_mode: MultiplicityMode,
    /// Length of the sliding time window.
    pub time_window: f64,
    /// Allowed deviation below the expected travel time.
    pub time_cone_minus: f64,
    /// Allowed deviation above the expected travel time.
    pub time_cone_plus: f64,
    /// Causal propagation norm.
    pub norm: N,
    /// How pulses are turned into hits.
    pub extraction: ExtractionMode,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            multiplicity: 4,
            multiplicity_mode: MultiplicityMode::DistinctSensors,
            time_window: 2000.0,
            time_cone_minus: 1000.0,
            time_cone_plus: 1000.0,
            norm: PropagationNorm::default(),
            extraction: ExtractionMode::AllHits,
        }
    }
}

impl<N: CausalNorm> SplitterConfig<N> {
    /// Sets the multiplicity threshold.
    #[must_use]
    pub fn with_multiplicity(mut self, multiplicity: usize) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    /// Sets what the multiplicity counts.
    #[must_use]
    pub fn with_multiplicity_mode(mut self, mode: MultiplicityMode) -> Self {
        self.multiplicity_mode = mode;
        self
    }

    /// Sets the sliding time window.
    #[must_use]
    pub fn with_time_window(mut self, window: f64) -> Self {
        self.time_window = window;
        self
    }

    /// Sets the time cone around the expected travel time.
    #[must_use]
    pub fn with_time_cone(mut self, minus: f64, plus: f64) -> Self {
        self.time_cone_minus = minus;
        self.time_cone_plus = plus;
        self
    }

    /// Sets the hit extraction mode.
    #[must_use]
    pub fn with_extraction(mut self, mode: ExtractionMode) -> Self {
        self.extraction = mode;
        self
    }

    /// Replaces the causal norm.
    #[must_use]
    pub fn with_norm<M: CausalNorm>(self, norm: M) -> SplitterConfig<M> {
        SplitterConfig {
            multiplicity: self.multiplicity,
            multiplicity_mode: self.multiplicity_mode,
            time_window: self.time_window,
            time_cone_minus: self.time_cone_minus,
            time_cone_plus: self.time_cone_plus,
            norm,
            extraction: self.extraction,
        }
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns [`SplitError::Config`] for a zero multiplicity, a non-positive
    /// window, negative cones or an unusable norm.
    pub fn validate(&self) -> Result<()> {
        if self.multiplicity == 0 {
            return Err(SplitError::Config(
                "multiplicity must be at least 1".to_string(),
            ));
        }
        if !(self.time_window.is_finite() && self.time_window > 0.0) {
            return Err(SplitError::Config(format!(
                "time window must be positive and finite, got {}",
                self.time_window
            )));
        }
        for (name, cone) in [
            ("time cone minus", self.time_cone_minus),
            ("time cone plus", self.time_cone_plus),
        ] {
            if !(cone.is_finite() && cone >= 0.0) {
                return Err(SplitError::Config(format!(
                    "{name} must be non-negative and finite, got {cone}"
                )));
            }
        }
        self.norm.validate()
    }
}

/// Per-readout engine state.
///
/// Owned by exactly one readout; never shared between concurrent splits.
#[derive(Debug, Clone, Default)]
pub struct SplitState {
    /// Distance-table index of every `sensor_index` of the readout.
    sensor_slots: Vec<usize>,
    clusters: Vec<CausalCluster>,
    subevents: Vec<TimeOrderedHits>,
    stats: SplitStatistics,
    latest_time: Option<f64>,
}

impl SplitState {
    /// Live clusters, oldest first.
    #[must_use]
    pub fn clusters(&self) -> &[CausalCluster] {
        &self.clusters
    }

    /// Subevent candidates collected so far, ordered by earliest hit.
    #[must_use]
    pub fn subevents(&self) -> &[TimeOrderedHits] {
        &self.subevents
    }

    /// Counters gathered so far.
    #[must_use]
    pub fn statistics(&self) -> &SplitStatistics {
        &self.stats
    }

    /// Consumes the state, returning the subevent candidates.
    #[must_use]
    pub fn into_subevents(self) -> Vec<TimeOrderedHits> {
        self.subevents
    }

    /// Adds a subevent candidate, merging every candidate it overlaps.
    ///
    /// Candidates are kept ordered by earliest hit time, then by the sensor
    /// index of that hit. Empty candidates are ignored.
    pub fn add_sub_event(&mut self, hits: TimeOrderedHits) {
        let mut merged = hits;
        let mut i = 0;
        while i < self.subevents.len() {
            if sets_intersect(&self.subevents[i], &merged) {
                let other = self.subevents.remove(i);
                merged.extend(other);
                self.stats.subevent_merges += 1;
            } else {
                i += 1;
            }
        }

        let Some(first) = merged.first().copied() else {
            return;
        };
        let position = self
            .subevents
            .partition_point(|candidate| compare_first(candidate, &first) != Ordering::Greater);
        log::trace!(
            "subevent candidate of {} hits starting at {} inserted at {}",
            merged.len(),
            first.time,
            position
        );
        self.subevents.insert(position, merged);
    }
}

fn compare_first(candidate: &TimeOrderedHits, first: &TimeOrdered) -> Ordering {
    match candidate.first() {
        Some(head) => head
            .time
            .total_cmp(&first.time)
            .then(head.sensor_index.cmp(&first.sensor_index)),
        None => Ordering::Less,
    }
}

/// Result of splitting one readout.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutcome<P = hivesplit_core::Pulse> {
    /// Subevents in time order.
    pub subevents: Vec<SubEventRecord<P>>,
    /// Counters gathered while splitting.
    pub statistics: SplitStatistics,
}

impl<P> SplitOutcome<P> {
    /// Number of subevents found.
    #[must_use]
    pub fn subevent_count(&self) -> usize {
        self.subevents.len()
    }
}

/// Causal-cluster splitter bound to one detector's distance table.
#[derive(Debug, Clone)]
pub struct HiveSplitter<N = PropagationNorm> {
    config: SplitterConfig<N>,
    table: Arc<DistanceTable>,
}

impl HiveSplitter {
    /// Builds the distance table for `geometry` and a splitter using it.
    ///
    /// # Errors
    /// Fails on invalid configuration or geometry.
    pub fn from_geometry(
        config: SplitterConfig,
        geometry: &Geometry,
        connectivity: &ConnectivityConfig,
    ) -> Result<Self> {
        let table = DistanceTable::from_geometry(geometry, connectivity)?;
        Self::new(config, Arc::new(table))
    }
}

impl<N: CausalNorm> HiveSplitter<N> {
    /// Creates a splitter.
    ///
    /// # Errors
    /// Returns [`SplitError::Config`] if the configuration is invalid.
    pub fn new(config: SplitterConfig<N>, table: Arc<DistanceTable>) -> Result<Self> {
        config.validate()?;
        if config.multiplicity_mode == MultiplicityMode::DistinctSensors
            && config.multiplicity > table.len()
        {
            log::warn!(
                "multiplicity {} exceeds the {} sensors of the detector; no subevent can form",
                config.multiplicity,
                table.len()
            );
        }
        Ok(Self { config, table })
    }

    /// The splitter configuration.
    #[must_use]
    pub fn config(&self) -> &SplitterConfig<N> {
        &self.config
    }

    /// The shared distance table.
    #[must_use]
    pub fn table(&self) -> &Arc<DistanceTable> {
        &self.table
    }

    /// Creates the state for a readout whose pulse map has the given keys, in
    /// key order.
    ///
    /// # Errors
    /// Returns [`SplitError::UnknownSensor`] if a key is not in the table.
    pub fn create_state(&self, keys: &[SensorKey]) -> Result<SplitState> {
        let sensor_slots = keys
            .iter()
            .map(|&key| {
                self.table
                    .index_of(key)
                    .ok_or(SplitError::UnknownSensor(key))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SplitState {
            sensor_slots,
            ..SplitState::default()
        })
    }

    fn check_hit(state: &SplitState, hit: &Hit) -> Result<()> {
        if (hit.sensor_index as usize) < state.sensor_slots.len() {
            Ok(())
        } else {
            Err(hivesplit_core::Error::MissingSensor {
                index: hit.sensor_index,
                available: state.sensor_slots.len(),
            }
            .into())
        }
    }

    /// Returns true if two hits of the readout behind `state` are causally
    /// connected. The argument order does not matter.
    ///
    /// # Errors
    /// Fails if a hit refers to a sensor index the readout does not have.
    pub fn causally_connected(&self, state: &SplitState, a: &Hit, b: &Hit) -> Result<bool> {
        Self::check_hit(state, a)?;
        Self::check_hit(state, b)?;
        Ok(self.connected(&state.sensor_slots, a, b))
    }

    fn connected(&self, slots: &[usize], a: &Hit, b: &Hit) -> bool {
        let (early, late) = if a.time <= b.time { (a, b) } else { (b, a) };
        let Some(distance) = self.table.get(
            slots[early.sensor_index as usize],
            slots[late.sensor_index as usize],
        ) else {
            return false;
        };
        within_time_cone(
            &self.config.norm,
            distance,
            late.time - early.time,
            self.config.time_cone_minus,
            self.config.time_cone_plus,
        )
    }

    /// Feeds the next hit, in time order, into the engine.
    ///
    /// With a multiplicity of 1 every hit is its own subevent and no clusters
    /// are kept.
    ///
    /// # Errors
    /// Fails if the hit refers to a sensor index the readout does not have,
    /// or with [`SplitError::OutOfOrder`] if it is earlier than the previous
    /// hit.
    pub fn add_hit(&self, state: &mut SplitState, hit: Hit) -> Result<()> {
        Self::check_hit(state, &hit)?;
        if let Some(previous) = state.latest_time {
            if hit.time.total_cmp(&previous) == Ordering::Less {
                return Err(SplitError::OutOfOrder {
                    time: hit.time,
                    previous,
                });
            }
        }
        state.latest_time = Some(hit.time);
        let threshold = self.config.multiplicity;
        let mode = self.config.multiplicity_mode;
        state.stats.hits_processed += 1;

        if threshold == 1 {
            state.add_sub_event(TimeOrderedHits::from([TimeOrdered(hit)]));
            return Ok(());
        }

        // Age every cluster to the new hit.
        let horizon = hit.time - self.config.time_window;
        let mut exhausted = Vec::new();
        state.clusters.retain_mut(|cluster| {
            cluster.advance(horizon);
            if cluster.is_empty() {
                exhausted.push(cluster.take_completed());
                false
            } else {
                true
            }
        });
        for completed in exhausted {
            if !completed.is_empty() {
                log::trace!("cluster exhausted with {} completed hits", completed.len());
                state.add_sub_event(completed);
            }
        }

        // Offer the hit to every surviving cluster.
        let mut joined = false;
        let mut forks = Vec::new();
        let slots = &state.sensor_slots;
        for cluster in &mut state.clusters {
            let mut connected: TimeOrderedHits = cluster
                .hits()
                .iter()
                .filter(|other| self.connected(slots, &hit, other))
                .copied()
                .collect();
            if connected.is_empty() {
                continue;
            }
            joined = true;
            if connected.len() == cluster.len() {
                cluster.insert(hit, threshold, mode);
            } else {
                connected.insert(TimeOrdered(hit));
                forks.push(CausalCluster::from_hits(connected, &hit, threshold, mode));
            }
        }

        // Keep only forks that no other cluster already covers.
        let mut accepted: Vec<CausalCluster> = Vec::new();
        for fork in forks {
            let redundant = state
                .clusters
                .iter()
                .chain(&accepted)
                .any(|other| is_subset(fork.hits(), other.hits()));
            if redundant {
                state.stats.clusters_discarded += 1;
                continue;
            }
            let before = accepted.len();
            accepted.retain(|other| !is_subset(other.hits(), fork.hits()));
            state.stats.clusters_discarded += before - accepted.len();
            accepted.push(fork);
        }
        if !accepted.is_empty() {
            log::trace!("hit {:?} forked {} clusters", hit.identity(), accepted.len());
        }
        state.stats.clusters_spawned += accepted.len();
        state.clusters.extend(accepted);

        if !joined {
            let hits = TimeOrderedHits::from([TimeOrdered(hit)]);
            state
                .clusters
                .push(CausalCluster::from_hits(hits, &hit, threshold, mode));
            state.stats.clusters_spawned += 1;
        }
        Ok(())
    }

    /// Flushes every live cluster as if time had advanced past the window.
    pub fn finalize(&self, state: &mut SplitState) {
        for mut cluster in std::mem::take(&mut state.clusters) {
            cluster.flush();
            let completed = cluster.take_completed();
            if !completed.is_empty() {
                state.add_sub_event(completed);
            }
        }
        state.stats.subevents_found = state.subevents.len();
    }

    /// Splits one readout into subevents.
    ///
    /// # Errors
    /// Fails if the readout holds a sensor the table does not cover.
    pub fn split<P: PulseRecord>(&self, pulses: &PulseMap<P>) -> Result<SplitOutcome<P>> {
        let mut state = self.create_state(&sensor_keys(pulses))?;
        let hits = retrieval_ordered_to_time_ordered(&extract_hits(pulses, self.config.extraction));

        for hit in &hits {
            self.add_hit(&mut state, **hit)?;
        }
        self.finalize(&mut state);

        let use_all_hits = self.config.extraction.collapses_sensors();
        let subevents = state
            .subevents
            .iter()
            .enumerate()
            .map(|(index, hits)| -> Result<SubEventRecord<P>> {
                let (start_time, stop_time) =
                    time_span(hits).ok_or(hivesplit_core::Error::EmptySubEvent)?;
                let pulses =
                    revert_hits(&time_ordered_to_retrieval_ordered(hits), pulses, use_all_hits)?;
                Ok(SubEventRecord {
                    index,
                    pulses,
                    start_time,
                    stop_time,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "split {} hits into {} subevents ({} clusters spawned, {} merges)",
            state.stats.hits_processed,
            subevents.len(),
            state.stats.clusters_spawned,
            state.stats.subevent_merges
        );
        Ok(SplitOutcome {
            subevents,
            statistics: state.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivesplit_core::Pulse;
    use hivesplit_geometry::{Position, RingLimitTable, RingLimits, VerticalLimit, Zone, ZonePair};

    fn limits(rings: usize, extent: f64) -> RingLimitTable {
        RingLimitTable::new().with(
            ZonePair::new(Zone::Sparse, Zone::Sparse),
            RingLimits::absolute(vec![VerticalLimit::symmetric(extent); rings]),
        )
    }

    /// `n` sensors on one string, 10 apart vertically, all mutually connected.
    fn column(n: u32) -> Arc<DistanceTable> {
        let mut geometry = Geometry::new();
        for module in 1..=n {
            geometry.insert(
                SensorKey::new(1, module),
                Position::new(0.0, 0.0, -10.0 * f64::from(module)),
                Zone::Sparse,
            );
        }
        let config = ConnectivityConfig::default().with_ring_limits(limits(1, 1000.0));
        Arc::new(DistanceTable::from_geometry(&geometry, &config).unwrap())
    }

    /// Strings 1, 2, 3 in a row, 100 apart; only neighbouring strings connect.
    fn chain() -> Arc<DistanceTable> {
        let mut geometry = Geometry::new();
        for string in 1..=3 {
            geometry.insert(
                SensorKey::new(string, 1),
                Position::new(100.0 * f64::from(string), 0.0, 0.0),
                Zone::Sparse,
            );
        }
        let config = ConnectivityConfig::default()
            .with_neighbor_radius(110.0)
            .with_ring_limits(limits(2, 50.0));
        Arc::new(DistanceTable::from_geometry(&geometry, &config).unwrap())
    }

    fn static_config(multiplicity: usize) -> SplitterConfig {
        SplitterConfig::default()
            .with_multiplicity(multiplicity)
            .with_time_window(1000.0)
            .with_time_cone(0.0, 100.0)
            .with_norm(PropagationNorm::Static)
    }

    #[test]
    fn test_two_sensor_example() {
        let mut pulses = PulseMap::new();
        pulses.insert(
            SensorKey::new(1, 1),
            vec![Pulse::new(0.0, 1.0), Pulse::new(1.0, 2.0)],
        );
        pulses.insert(SensorKey::new(1, 2), vec![Pulse::new(0.0, 4.0)]);

        let config = SplitterConfig::default()
            .with_multiplicity(2)
            .with_time_window(100.0)
            .with_time_cone(1000.0, 1000.0);
        let splitter = HiveSplitter::new(config, column(2)).unwrap();
        let outcome = splitter.split(&pulses).unwrap();

        assert_eq!(outcome.subevent_count(), 1);
        let subevent = &outcome.subevents[0];
        assert_eq!(subevent.pulse_count(), 3);
        assert_eq!(subevent.pulses, pulses);
        assert!(subevent.start_time.abs() < f64::EPSILON);
        assert!((subevent.stop_time - 1.0).abs() < f64::EPSILON);
        assert_eq!(outcome.statistics.hits_processed, 3);
        assert_eq!(outcome.statistics.subevents_found, 1);
    }

    #[test]
    fn test_multiplicity_one_keeps_connected_hits_apart() {
        let mut pulses = PulseMap::new();
        pulses.insert(
            SensorKey::new(1, 1),
            vec![Pulse::new(0.0, 1.0), Pulse::new(1.0, 2.0)],
        );
        pulses.insert(SensorKey::new(1, 2), vec![Pulse::new(0.0, 4.0)]);

        let config = SplitterConfig::default()
            .with_multiplicity(1)
            .with_time_window(100.0)
            .with_time_cone(1000.0, 1000.0);
        let splitter = HiveSplitter::new(config, column(2)).unwrap();
        let outcome = splitter.split(&pulses).unwrap();

        assert_eq!(outcome.subevent_count(), 3);
        assert_eq!(outcome.statistics.subevents_found, 3);
        assert_eq!(outcome.statistics.subevent_merges, 0);
        let heads: Vec<(SensorKey, f64)> = outcome
            .subevents
            .iter()
            .map(|subevent| {
                assert_eq!(subevent.pulse_count(), 1);
                let (key, series) = subevent.pulses.iter().next().unwrap();
                (*key, series[0].time)
            })
            .collect();
        assert_eq!(
            heads,
            vec![
                (SensorKey::new(1, 1), 0.0),
                (SensorKey::new(1, 2), 0.0),
                (SensorKey::new(1, 1), 1.0),
            ]
        );
    }

    #[test]
    fn test_out_of_order_hit_is_rejected() {
        let splitter = HiveSplitter::new(static_config(2), column(2)).unwrap();
        let mut state = splitter
            .create_state(&[SensorKey::new(1, 1), SensorKey::new(1, 2)])
            .unwrap();
        splitter.add_hit(&mut state, Hit::new(0, 0, 5.0, 1.0)).unwrap();
        splitter.add_hit(&mut state, Hit::new(1, 0, 5.0, 1.0)).unwrap();
        assert!(matches!(
            splitter.add_hit(&mut state, Hit::new(0, 1, 4.0, 1.0)),
            Err(SplitError::OutOfOrder { time, previous })
                if (time - 4.0).abs() < f64::EPSILON && (previous - 5.0).abs() < f64::EPSILON
        ));
        assert_eq!(state.statistics().hits_processed, 2);
        assert_eq!(state.clusters()[0].len(), 2);
    }

    #[test]
    fn test_end_hit_is_recorded() {
        let splitter = HiveSplitter::new(static_config(2), column(3)).unwrap();
        let mut state = splitter
            .create_state(&[SensorKey::new(1, 1), SensorKey::new(1, 2)])
            .unwrap();
        splitter.add_hit(&mut state, Hit::new(0, 0, 0.0, 1.0)).unwrap();
        assert!(!state.clusters()[0].multiplicity_met());
        splitter.add_hit(&mut state, Hit::new(1, 0, 5.0, 1.0)).unwrap();
        assert!(state.clusters()[0].multiplicity_met());
        assert_eq!(state.clusters()[0].end_hit(), Some((1, 0)));
    }

    #[test]
    fn test_fork_and_merge() {
        // A on string 1, B on string 2, C on string 3: A-B and B-C connect,
        // A-C does not.
        let splitter = HiveSplitter::new(static_config(2), chain()).unwrap();
        let keys = [SensorKey::new(1, 1), SensorKey::new(2, 1), SensorKey::new(3, 1)];
        let mut state = splitter.create_state(&keys).unwrap();
        let a = Hit::new(0, 0, 0.0, 1.0);
        let b = Hit::new(1, 0, 1.0, 1.0);
        let c = Hit::new(2, 0, 2.0, 1.0);

        assert!(splitter.causally_connected(&state, &a, &b).unwrap());
        assert!(!splitter.causally_connected(&state, &c, &a).unwrap());

        for hit in [a, b, c] {
            splitter.add_hit(&mut state, hit).unwrap();
        }
        // {A, B} plus the fork {B, C}
        assert_eq!(state.clusters().len(), 2);
        assert_eq!(state.clusters()[1].len(), 2);
        assert_eq!(state.clusters()[1].end_hit(), Some((2, 0)));

        splitter.finalize(&mut state);
        let stats = *state.statistics();
        assert_eq!(stats.clusters_spawned, 2);
        assert_eq!(stats.clusters_discarded, 0);
        assert_eq!(stats.subevent_merges, 1);
        assert_eq!(stats.subevents_found, 1);
        assert_eq!(state.subevents()[0].len(), 3);
    }

    #[test]
    fn test_redundant_fork_is_discarded() {
        let splitter = HiveSplitter::new(static_config(2), chain()).unwrap();
        let keys = [SensorKey::new(1, 1), SensorKey::new(2, 1), SensorKey::new(3, 1)];
        let mut state = splitter.create_state(&keys).unwrap();

        // A and C start separate clusters, B joins both, E (on C's sensor)
        // forks {B, E} off {A, B} which {C, B, E} already covers.
        let hits = [
            Hit::new(0, 0, 0.0, 1.0),
            Hit::new(2, 0, 1.0, 1.0),
            Hit::new(1, 0, 2.0, 1.0),
            Hit::new(2, 1, 3.0, 1.0),
        ];
        for hit in hits {
            splitter.add_hit(&mut state, hit).unwrap();
        }
        assert_eq!(state.clusters().len(), 2);
        assert_eq!(state.statistics().clusters_discarded, 1);

        splitter.finalize(&mut state);
        assert_eq!(state.statistics().subevent_merges, 1);
        assert_eq!(state.subevents().len(), 1);
        assert_eq!(state.subevents()[0].len(), 4);
    }

    #[test]
    fn test_window_aging_closes_subevents() {
        let mut pulses = PulseMap::new();
        pulses.insert(SensorKey::new(1, 1), vec![Pulse::new(0.0, 1.0)]);
        pulses.insert(SensorKey::new(1, 2), vec![Pulse::new(1.0, 1.0)]);
        pulses.insert(SensorKey::new(1, 3), vec![Pulse::new(10_000.0, 1.0)]);
        pulses.insert(SensorKey::new(1, 4), vec![Pulse::new(10_001.0, 1.0)]);

        let splitter = HiveSplitter::new(static_config(2), column(4)).unwrap();
        let mut state = splitter.create_state(&sensor_keys(&pulses)).unwrap();
        let hits =
            retrieval_ordered_to_time_ordered(&extract_hits(&pulses, ExtractionMode::AllHits));
        for hit in &hits {
            splitter.add_hit(&mut state, **hit).unwrap();
        }
        // the first pair aged out and was handed over before finalize
        assert_eq!(state.subevents().len(), 1);
        assert_eq!(state.clusters().len(), 1);

        let outcome = splitter.split(&pulses).unwrap();
        assert_eq!(outcome.subevent_count(), 2);
        assert!(outcome.subevents[0].start_time.abs() < f64::EPSILON);
        assert!((outcome.subevents[1].start_time - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(outcome.subevents[1].index, 1);
    }

    #[test]
    fn test_multiplicity_modes() {
        let mut pulses = PulseMap::new();
        pulses.insert(
            SensorKey::new(1, 1),
            vec![Pulse::new(0.0, 1.0), Pulse::new(4.0, 1.0)],
        );

        let sensors = HiveSplitter::new(static_config(2), column(1)).unwrap();
        assert_eq!(sensors.split(&pulses).unwrap().subevent_count(), 0);

        let hits = HiveSplitter::new(
            static_config(2).with_multiplicity_mode(MultiplicityMode::Hits),
            column(1),
        )
        .unwrap();
        assert_eq!(hits.split(&pulses).unwrap().subevent_count(), 1);
    }

    #[test]
    fn test_unreachable_multiplicity_yields_nothing() {
        let mut pulses = PulseMap::new();
        for module in 1..=3 {
            pulses.insert(SensorKey::new(1, module), vec![Pulse::new(0.0, 1.0)]);
        }
        let splitter = HiveSplitter::new(static_config(10), column(3)).unwrap();
        let outcome = splitter.split(&pulses).unwrap();
        assert_eq!(outcome.subevent_count(), 0);
        assert_eq!(outcome.statistics.hits_processed, 3);
    }

    #[test]
    fn test_first_hit_only_restores_whole_sensors() {
        let mut pulses = PulseMap::new();
        pulses.insert(
            SensorKey::new(1, 1),
            vec![Pulse::new(0.0, 1.0), Pulse::new(2.0, 1.0)],
        );
        pulses.insert(SensorKey::new(1, 2), vec![Pulse::new(1.0, 1.0)]);

        let config = static_config(2).with_extraction(ExtractionMode::FirstHitOnly);
        let splitter = HiveSplitter::new(config, column(2)).unwrap();
        let outcome = splitter.split(&pulses).unwrap();
        assert_eq!(outcome.statistics.hits_processed, 2);
        assert_eq!(outcome.subevent_count(), 1);
        assert_eq!(outcome.subevents[0].pulses, pulses);
        assert!((outcome.subevents[0].stop_time - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_sensor_is_fatal() {
        let mut pulses = PulseMap::new();
        pulses.insert(SensorKey::new(9, 1), vec![Pulse::new(0.0, 1.0)]);
        let splitter = HiveSplitter::new(static_config(1), column(2)).unwrap();
        assert!(matches!(
            splitter.split(&pulses),
            Err(SplitError::UnknownSensor(key)) if key == SensorKey::new(9, 1)
        ));

        let mut state = splitter.create_state(&[SensorKey::new(1, 1)]).unwrap();
        assert!(matches!(
            splitter.add_hit(&mut state, Hit::new(3, 0, 0.0, 1.0)),
            Err(SplitError::Core(hivesplit_core::Error::MissingSensor { index: 3, .. }))
        ));
    }

    #[test]
    fn test_invalid_config() {
        for config in [
            static_config(0),
            static_config(1).with_time_window(0.0),
            static_config(1).with_time_cone(-1.0, 0.0),
            static_config(1).with_time_cone(0.0, f64::NAN),
        ] {
            assert!(matches!(
                HiveSplitter::new(config, column(1)),
                Err(SplitError::Config(_))
            ));
        }
        let bad_norm =
            SplitterConfig::default().with_norm(PropagationNorm::LightCone { speed: -1.0 });
        assert!(HiveSplitter::new(bad_norm, column(1)).is_err());
    }

    #[test]
    fn test_add_sub_event_orders_and_merges() {
        let mut state = SplitState::default();
        let set = |hits: &[Hit]| -> TimeOrderedHits {
            hits.iter().copied().map(TimeOrdered).collect()
        };
        let a = Hit::new(0, 0, 5.0, 1.0);
        let b = Hit::new(1, 0, 1.0, 1.0);
        let c = Hit::new(2, 0, 1.0, 1.0);
        let d = Hit::new(3, 0, 9.0, 1.0);

        state.add_sub_event(set(&[a]));
        state.add_sub_event(set(&[c]));
        state.add_sub_event(set(&[b]));
        state.add_sub_event(TimeOrderedHits::new());
        let heads: Vec<u32> = state
            .subevents()
            .iter()
            .map(|s| s.first().unwrap().sensor_index)
            .collect();
        assert_eq!(heads, vec![1, 2, 0]);

        // bridges the candidates holding a and c
        state.add_sub_event(set(&[a, c, d]));
        assert_eq!(state.subevents().len(), 2);
        assert_eq!(state.statistics().subevent_merges, 2);
        assert_eq!(state.subevents()[0].len(), 1);
        assert_eq!(state.subevents()[1].len(), 3);
    }
}

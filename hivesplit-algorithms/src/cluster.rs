//! Causal clusters: sliding windows of mutually connected hits.

use hivesplit_core::{Hit, TimeOrdered, TimeOrderedHits};
use std::collections::BTreeMap;

/// What counts towards a cluster's multiplicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiplicityMode {
    /// Number of distinct sensors among the live hits.
    #[default]
    DistinctSensors,
    /// Number of live hits.
    Hits,
}

/// A cluster of hits inside the live time window.
///
/// A cluster grows until its multiplicity first reaches the threshold. From
/// then on, hits aging out of the window are collected in `completed`. Once
/// the window is empty the cluster is exhausted and removed by its owner.
#[derive(Debug, Clone, Default)]
pub struct CausalCluster {
    hits: TimeOrderedHits,
    sensor_hits: BTreeMap<u32, usize>,
    completed: TimeOrderedHits,
    end_hit: Option<(u32, u32)>,
    multiplicity_met: bool,
}

impl CausalCluster {
    /// Builds a cluster from `hits`; `trigger` is the hit that caused it.
    pub(crate) fn from_hits(
        hits: TimeOrderedHits,
        trigger: &Hit,
        threshold: usize,
        mode: MultiplicityMode,
    ) -> Self {
        let mut sensor_hits = BTreeMap::new();
        for hit in &hits {
            *sensor_hits.entry(hit.sensor_index).or_insert(0) += 1;
        }
        let mut cluster = Self {
            hits,
            sensor_hits,
            ..Self::default()
        };
        cluster.check_multiplicity(trigger, threshold, mode);
        cluster
    }

    /// Live hits in time order.
    #[must_use]
    pub fn hits(&self) -> &TimeOrderedHits {
        &self.hits
    }

    /// Hits that aged out after the multiplicity was met.
    #[must_use]
    pub fn completed(&self) -> &TimeOrderedHits {
        &self.completed
    }

    /// Identity of the hit that first met the multiplicity.
    #[must_use]
    pub fn end_hit(&self) -> Option<(u32, u32)> {
        self.end_hit
    }

    /// Returns true once the multiplicity threshold has been reached.
    #[must_use]
    pub fn multiplicity_met(&self) -> bool {
        self.multiplicity_met
    }

    /// Number of live hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if no hit is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Current multiplicity under `mode`.
    #[must_use]
    pub fn multiplicity(&self, mode: MultiplicityMode) -> usize {
        match mode {
            MultiplicityMode::DistinctSensors => self.sensor_hits.len(),
            MultiplicityMode::Hits => self.hits.len(),
        }
    }

    fn check_multiplicity(&mut self, trigger: &Hit, threshold: usize, mode: MultiplicityMode) {
        if !self.multiplicity_met && self.multiplicity(mode) >= threshold {
            self.multiplicity_met = true;
            self.end_hit = Some(trigger.identity());
        }
    }

    pub(crate) fn insert(&mut self, hit: Hit, threshold: usize, mode: MultiplicityMode) {
        if self.hits.insert(TimeOrdered(hit)) {
            *self.sensor_hits.entry(hit.sensor_index).or_insert(0) += 1;
        }
        self.check_multiplicity(&hit, threshold, mode);
    }

    /// Drops hits older than `horizon`, keeping them in `completed` if the
    /// multiplicity was met.
    pub(crate) fn advance(&mut self, horizon: f64) {
        while self.hits.first().is_some_and(|hit| hit.time < horizon) {
            let Some(oldest) = self.hits.pop_first() else {
                break;
            };
            if let Some(count) = self.sensor_hits.get_mut(&oldest.sensor_index) {
                *count -= 1;
                if *count == 0 {
                    self.sensor_hits.remove(&oldest.sensor_index);
                }
            }
            if self.multiplicity_met {
                self.completed.insert(oldest);
            }
        }
    }

    /// Moves every live hit to `completed` if the multiplicity was met, as if
    /// time had advanced past the whole window.
    pub(crate) fn flush(&mut self) {
        self.advance(f64::INFINITY);
    }

    pub(crate) fn take_completed(&mut self) -> TimeOrderedHits {
        std::mem::take(&mut self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(hits: &[Hit]) -> TimeOrderedHits {
        hits.iter().copied().map(TimeOrdered).collect()
    }

    #[test]
    fn test_multiplicity_met_once() {
        let a = Hit::new(0, 0, 0.0, 1.0);
        let b = Hit::new(1, 0, 1.0, 1.0);
        let c = Hit::new(2, 0, 2.0, 1.0);

        let mut cluster =
            CausalCluster::from_hits(set(&[a]), &a, 2, MultiplicityMode::default());
        assert!(!cluster.multiplicity_met());
        cluster.insert(b, 2, MultiplicityMode::DistinctSensors);
        assert!(cluster.multiplicity_met());
        assert_eq!(cluster.end_hit(), Some((1, 0)));
        cluster.insert(c, 2, MultiplicityMode::DistinctSensors);
        assert_eq!(cluster.end_hit(), Some((1, 0)));
        assert_eq!(cluster.len(), 3);
    }

    #[test]
    fn test_multiplicity_modes() {
        let a = Hit::new(0, 0, 0.0, 1.0);
        let a2 = Hit::new(0, 1, 1.0, 1.0);
        let hits = set(&[a, a2]);

        let sensors =
            CausalCluster::from_hits(hits.clone(), &a2, 2, MultiplicityMode::DistinctSensors);
        assert_eq!(sensors.multiplicity(MultiplicityMode::DistinctSensors), 1);
        assert!(!sensors.multiplicity_met());

        let raw = CausalCluster::from_hits(hits, &a2, 2, MultiplicityMode::Hits);
        assert!(raw.multiplicity_met());
        assert_eq!(raw.end_hit(), Some((0, 1)));
    }

    #[test]
    fn test_advance_before_multiplicity_discards() {
        let a = Hit::new(0, 0, 0.0, 1.0);
        let b = Hit::new(1, 0, 5.0, 1.0);
        let mut cluster =
            CausalCluster::from_hits(set(&[a, b]), &b, 3, MultiplicityMode::default());
        cluster.advance(1.0);
        assert_eq!(cluster.len(), 1);
        assert_eq!(cluster.multiplicity(MultiplicityMode::DistinctSensors), 1);
        assert!(cluster.completed().is_empty());
    }

    #[test]
    fn test_advance_after_multiplicity_completes() {
        let a = Hit::new(0, 0, 0.0, 1.0);
        let b = Hit::new(1, 0, 5.0, 1.0);
        let mut cluster =
            CausalCluster::from_hits(set(&[a, b]), &b, 2, MultiplicityMode::default());
        assert!(cluster.multiplicity_met());

        // a hit exactly on the horizon stays live
        cluster.advance(5.0);
        assert_eq!(cluster.len(), 1);
        assert_eq!(cluster.completed().len(), 1);

        cluster.flush();
        assert!(cluster.is_empty());
        let completed = cluster.take_completed();
        assert_eq!(completed.len(), 2);
        assert!(cluster.completed().is_empty());
    }
}

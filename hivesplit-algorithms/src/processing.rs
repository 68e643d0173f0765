//! Batch helpers that split many readouts against one detector.

use crate::causal::CausalNorm;
use crate::error::Result;
use crate::splitter::{HiveSplitter, SplitOutcome};
use hivesplit_core::{PulseMap, PulseRecord, SplitStatistics};
use rayon::prelude::*;

/// Results of splitting a batch of readouts.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<P = hivesplit_core::Pulse> {
    /// One outcome per readout, in input order.
    pub readouts: Vec<SplitOutcome<P>>,
    /// Counters summed over all readouts.
    pub statistics: SplitStatistics,
}

/// Splits independent readouts in parallel.
///
/// Each readout gets its own engine state; only the distance table is
/// shared. Results keep the input order.
///
/// # Errors
/// Returns the first error of any readout.
pub fn split_readouts<P, N>(
    splitter: &HiveSplitter<N>,
    readouts: &[PulseMap<P>],
) -> Result<BatchOutcome<P>>
where
    P: PulseRecord,
    N: CausalNorm,
{
    let outcomes = readouts
        .par_iter()
        .map(|pulses| splitter.split(pulses))
        .collect::<Result<Vec<_>>>()?;

    let mut statistics = SplitStatistics::default();
    for outcome in &outcomes {
        statistics.accumulate(&outcome.statistics);
    }
    log::debug!(
        "split {} readouts into {} subevents",
        outcomes.len(),
        statistics.subevents_found
    );

    Ok(BatchOutcome {
        readouts: outcomes,
        statistics,
    })
}

/// Splits readouts one after another on the calling thread.
///
/// # Errors
/// Returns the first error of any readout.
pub fn split_readouts_sequential<P, N>(
    splitter: &HiveSplitter<N>,
    readouts: &[PulseMap<P>],
) -> Result<BatchOutcome<P>>
where
    P: PulseRecord,
    N: CausalNorm,
{
    let outcomes = readouts
        .iter()
        .map(|pulses| splitter.split(pulses))
        .collect::<Result<Vec<_>>>()?;

    let mut statistics = SplitStatistics::default();
    for outcome in &outcomes {
        statistics.accumulate(&outcome.statistics);
    }

    Ok(BatchOutcome {
        readouts: outcomes,
        statistics,
    })
}

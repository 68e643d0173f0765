//! hivesplit-algorithms: Causal-cluster splitting of detector readouts.
//!
//! This crate turns one detector-wide readout into subevents, groups of
//! pulses that are causally and temporally coherent:
//! - **Causal norms** - travel-time models behind the connectivity test
//! - **Causal clusters** - sliding windows that fork on partial connectivity
//! - **Splitter** - the per-readout state machine and subevent collection
//! - **Batch processing** - independent readouts split in parallel
//!
#![warn(missing_docs)]

mod causal;
mod cluster;
mod error;
mod processing;
mod splitter;

pub use causal::{
    within_time_cone, CausalNorm, PropagationNorm, ICE_GROUP_INDEX, SPEED_OF_LIGHT,
};
pub use cluster::{CausalCluster, MultiplicityMode};
pub use error::{Result, SplitError};
pub use processing::{split_readouts, split_readouts_sequential, BatchOutcome};
pub use splitter::{HiveSplitter, SplitOutcome, SplitState, SplitterConfig};

// Re-export core types for convenience
pub use hivesplit_core::{ExtractionMode, SplitStatistics, SubEventRecord};

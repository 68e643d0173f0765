//! hivesplit-core: Hit model and pulse-map plumbing for subevent splitting.
//!
//! This crate provides the compact hit representation with its retrieval and
//! time orderings, sorted set algebra over hit sets, and lossless conversion
//! to and from native per-sensor pulse maps.
//!

pub mod error;
pub mod extraction;
pub mod hit;
pub mod pulse;
pub mod subevent;

pub use error::{Error, Result};
pub use extraction::{extract_hits, revert_hits, ExtractionMode};
pub use hit::{
    identical, is_subset, retrieval_ordered_to_time_ordered, sets_intersect,
    time_ordered_to_retrieval_ordered, time_span, unite, Hit, RetrievalOrdered,
    RetrievalOrderedHits, TimeOrdered, TimeOrderedHits,
};
pub use pulse::{pulse_count, sensor_keys, Pulse, PulseMap, PulseRecord, SensorKey};
pub use subevent::{SplitStatistics, SubEventRecord};

//! hivesplit-geometry: detector geometry, honeycomb rings and sensor connectivity.
//!
//! This crate answers one question for the splitting engine: may two sensors
//! see light from the same particle, and if so, how far apart are they?
//!
//! # Key Components
//!
//! - [`Geometry`] - Sensor positions and zones, loadable from JSON
//! - [`Honeycomb`] - Per-string ring registry derived from the string layout
//! - [`Topology`] - Zone classification of every sensor
//! - [`RingLimitTable`] - Vertical limits per ring and zone combination
//! - [`DistanceTable`] - Precomputed symmetric pair distances
//!
//! # Build Pipeline
//!
//! 1. Load or assemble a [`Geometry`]
//! 2. Derive the [`Honeycomb`] from averaged string positions
//! 3. Evaluate every sensor pair against the [`RingLimitTable`] in parallel

pub mod detector;
pub mod distance;
pub mod error;
pub mod honeycomb;
pub mod limits;
pub mod topology;

pub use detector::{Geometry, Position, SensorGeometry};
pub use distance::{ConnectivityConfig, DistanceTable};
pub use error::{Error, Result};
pub use honeycomb::Honeycomb;
pub use limits::{LimitUnit, RingLimitTable, RingLimits, VerticalLimit};
pub use topology::{Topology, Zone, ZonePair};

//! Geometry-specific error types.

use crate::topology::ZonePair;
use hivesplit_core::SensorKey;
use thiserror::Error;

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Geometry-specific error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Ring index beyond the configured maximum.
    #[error("ring {ring} requested, but the registry is limited to {max} rings")]
    RingOutOfRange { ring: usize, max: usize },

    /// Malformed ring registration.
    #[error("invalid ring registration: {0}")]
    InvalidRing(String),

    /// No ring limits apply to a zone combination.
    #[error("no ring limits configured for zone pair {0}")]
    MissingRingLimits(ZonePair),

    /// Sensor not part of the geometry.
    #[error("sensor {0} is not part of the geometry")]
    UnknownSensor(SensorKey),

    /// Invalid geometry description.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

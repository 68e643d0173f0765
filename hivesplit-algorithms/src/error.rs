//! Engine error types.

use hivesplit_core::SensorKey;
use thiserror::Error;

/// Result type for splitting operations.
pub type Result<T> = std::result::Result<T, SplitError>;

/// Errors raised while configuring or running the splitter.
#[derive(Error, Debug)]
pub enum SplitError {
    /// Invalid splitter configuration.
    #[error("invalid splitter configuration: {0}")]
    Config(String),

    /// A readout holds a sensor the distance table does not cover.
    #[error("sensor {0} is not covered by the distance table")]
    UnknownSensor(SensorKey),

    /// A hit arrived earlier than the one before it.
    #[error("hit at {time} arrived after a hit at {previous}")]
    OutOfOrder {
        /// Time of the rejected hit.
        time: f64,
        /// Time of the latest accepted hit.
        previous: f64,
    },

    /// Hit model error, usually a provenance violation.
    #[error(transparent)]
    Core(#[from] hivesplit_core::Error),

    /// Geometry or connectivity error.
    #[error(transparent)]
    Geometry(#[from] hivesplit_geometry::Error),
}

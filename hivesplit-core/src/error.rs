//! Error types for hivesplit-core.

use thiserror::Error;

/// Result type alias for hivesplit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for hivesplit operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A hit refers to a sensor slot that the pulse map does not have.
    #[error("hit references sensor index {index}, but the pulse map holds {available} sensors")]
    MissingSensor { index: u32, available: usize },

    /// A hit refers to a pulse ordinal that the sensor does not have.
    #[error("hit references pulse {pulse} on sensor index {sensor}, which holds {available} pulses")]
    MissingPulse {
        sensor: u32,
        pulse: u32,
        available: usize,
    },

    /// Operation requires at least one hit.
    #[error("cannot compute the time span of an empty subevent")]
    EmptySubEvent,
}

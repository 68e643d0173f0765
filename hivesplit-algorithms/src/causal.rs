//! Causal propagation norms.
//!
//! A norm turns the distance between two sensors into the interval of travel
//! times a signal may plausibly need to cover it. Two hits are causally
//! connected when their time difference lies inside that interval widened by
//! the configured time cone.

use crate::error::{Result, SplitError};

/// Speed of light in vacuum, in metres per nanosecond.
pub const SPEED_OF_LIGHT: f64 = 0.299_792_458;

/// Group refractive index of deep glacial ice.
pub const ICE_GROUP_INDEX: f64 = 1.356;

/// Strategy mapping a sensor distance to an expected travel-time interval.
pub trait CausalNorm: Send + Sync + std::fmt::Debug {
    /// Expected `(earliest, latest)` travel time across `distance`.
    fn travel_time(&self, distance: f64) -> (f64, f64);

    /// Checks the norm's parameters.
    ///
    /// # Errors
    /// Returns [`SplitError::Config`] for unusable parameters.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Built-in propagation norms, strictest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropagationNorm {
    /// Straight-line propagation at a single constant speed.
    LightCone {
        /// Propagation speed.
        speed: f64,
    },
    /// Propagation anywhere between a fast and a slow speed.
    Bracketed {
        /// Fastest allowed speed, giving the earliest arrival.
        fast_speed: f64,
        /// Slowest allowed speed, giving the latest arrival.
        slow_speed: f64,
    },
    /// Distance only gates connectivity; the expected travel time is zero.
    Static,
}

impl Default for PropagationNorm {
    fn default() -> Self {
        Self::vacuum_light()
    }
}

impl PropagationNorm {
    /// Straight-line propagation at the vacuum speed of light.
    #[must_use]
    pub fn vacuum_light() -> Self {
        Self::LightCone {
            speed: SPEED_OF_LIGHT,
        }
    }

    /// Propagation between the vacuum speed of light and the group velocity
    /// in ice.
    #[must_use]
    pub fn ice_bracket() -> Self {
        Self::Bracketed {
            fast_speed: SPEED_OF_LIGHT,
            slow_speed: SPEED_OF_LIGHT / ICE_GROUP_INDEX,
        }
    }
}

fn check_speed(name: &str, speed: f64) -> Result<()> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(SplitError::Config(format!(
            "{name} must be positive and finite, got {speed}"
        )))
    }
}

impl CausalNorm for PropagationNorm {
    #[inline]
    fn travel_time(&self, distance: f64) -> (f64, f64) {
        match *self {
            Self::LightCone { speed } => {
                let t = distance / speed;
                (t, t)
            }
            Self::Bracketed {
                fast_speed,
                slow_speed,
            } => (distance / fast_speed, distance / slow_speed),
            Self::Static => (0.0, 0.0),
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Self::LightCone { speed } => check_speed("light-cone speed", speed),
            Self::Bracketed {
                fast_speed,
                slow_speed,
            } => {
                check_speed("fast speed", fast_speed)?;
                check_speed("slow speed", slow_speed)?;
                if slow_speed > fast_speed {
                    return Err(SplitError::Config(format!(
                        "slow speed {slow_speed} exceeds fast speed {fast_speed}"
                    )));
                }
                Ok(())
            }
            Self::Static => Ok(()),
        }
    }
}

/// Returns true if a time difference `dt` (later minus earlier hit) fits the
/// travel-time interval of `distance` widened by `[-cone_minus, +cone_plus]`.
#[inline]
#[must_use]
pub fn within_time_cone<N: CausalNorm + ?Sized>(
    norm: &N,
    distance: f64,
    dt: f64,
    cone_minus: f64,
    cone_plus: f64,
) -> bool {
    let (earliest, latest) = norm.travel_time(distance);
    earliest - cone_minus <= dt && dt <= latest + cone_plus
}

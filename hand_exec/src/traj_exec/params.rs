//! Parameters structure for the trajectory executor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use comms_if::eqpt::hand::NUM_HAND_AXES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the trajectory executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Rate of the control loop.
    ///
    /// Units: Hz
    pub control_rate_hz: f64,

    /// Maximum absolute distance on any axis between the hand and the first
    /// waypoint for a goal to be accepted.
    ///
    /// Units: radians
    pub start_point_threshold: f64,

    /// Maximum absolute masked error on any axis during execution. Exceeding
    /// it aborts the goal.
    ///
    /// Units: radians
    pub execution_waypoint_threshold: f64,

    /// Masked error on every axis below which an intermediate waypoint is
    /// considered reached.
    ///
    /// Units: radians
    pub waypoint_tolerance: f64,

    /// As `waypoint_tolerance` but for the last waypoint of the trajectory.
    ///
    /// Units: radians
    pub final_waypoint_tolerance: f64,

    /// Proportional gain of each DOF, in the hand's actuation order.
    ///
    /// Units: 1/second
    pub gain: [f64; NUM_HAND_AXES],

    /// Maximum absolute velocity demand on any DOF.
    ///
    /// Units: radians/second
    pub max_vel: f64,
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("control_rate_hz must be positive and finite, found {0}")]
    InvalidControlRate(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Period of the control loop.
    pub fn control_period(&self) -> Result<Duration, ParamsError> {
        let rate = self.control_rate_hz;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ParamsError::InvalidControlRate(rate));
        }

        Ok(Duration::from_secs_f64(1.0 / rate))
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            control_rate_hz: 10.0,
            start_point_threshold: 0.1,
            execution_waypoint_threshold: 2.0,
            waypoint_tolerance: 0.15,
            final_waypoint_tolerance: 0.03,
            gain: [0.4; NUM_HAND_AXES],
            max_vel: 0.4,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

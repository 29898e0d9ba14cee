//! # Trajectory Following Action
//!
//! Goal, feedback and result definitions for the long running follow-trajectory action.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Result error codes, following the follow-joint-trajectory convention.
pub mod error_code {
    pub const SUCCESSFUL: i32 = 0;
    pub const INVALID_GOAL: i32 = -1;
    pub const INVALID_JOINTS: i32 = -2;
    pub const OLD_HEADER_TIMESTAMP: i32 = -3;
    pub const PATH_TOLERANCE_VIOLATED: i32 = -4;
    pub const GOAL_TOLERANCE_VIOLATED: i32 = -5;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single timed point of a joint trajectory.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrajPoint {
    /// Target positions in the planner's ordering (spread, finger 1, finger 2, finger 3).
    ///
    /// Units: radians
    pub positions: Vec<f64>,

    /// Time from the start of the trajectory at which this point should be reached.
    ///
    /// Units: seconds
    pub time_from_start_s: f64,
}

/// Goal of the follow-trajectory action.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FollowTrajGoal {
    /// Joint names as given by the planner, informational only
    #[serde(default)]
    pub joint_names: Vec<String>,

    /// Ordered trajectory points
    pub points: Vec<TrajPoint>,
}

/// Actual state reported in the feedback.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrajActual {
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
    pub accelerations: Vec<f64>,
    pub time_from_start_s: f64,
}

/// Feedback published on every control tick.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FollowTrajFeedback {
    pub joint_names: Vec<String>,
    pub desired: TrajPoint,
    pub actual: TrajActual,
}

/// Terminal result of the action.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowTrajResult {
    /// One of the [`error_code`] values
    pub error_code: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FollowTrajResult {
    pub fn success() -> Self {
        Self {
            error_code: error_code::SUCCESSFUL,
        }
    }

    pub fn with_code(error_code: i32) -> Self {
        Self { error_code }
    }

    pub fn is_success(&self) -> bool {
        self.error_code == error_code::SUCCESSFUL
    }
}

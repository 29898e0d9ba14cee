//! # Trajectory Executor
//!
//! Drives the hand along a multi-waypoint joint trajectory using a
//! proportional velocity controller, with tactile contacts masking the DOFs
//! of fingers which have touched something.
//!
//! A goal moves through the following states:
//!
//! ```text
//! Idle -> Validating -> Executing(0) -> .. -> Executing(n-1) -> Succeeded -> Idle
//!              |               |
//!              v               +-> Aborted | Preempted -> Idle
//!            Idle (rejected)
//! ```

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod clock;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

use crate::hand_if::HandIfError;
use comms_if::action::{error_code, FollowTrajResult};
use comms_if::eqpt::hand::NUM_HAND_AXES;

pub use clock::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// State of the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Idle,
    Validating,

    /// Executing towards the waypoint at the given index
    Executing(usize),

    Aborted,
    Preempted,
    Succeeded,
}

/// How a goal which passed validation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TrajOutcome {
    /// All waypoints were reached or timed out
    Succeeded,

    /// The masked error exceeded the execution threshold.
    ///
    /// The error is given in the planner's waypoint ordering.
    Aborted {
        waypoint: usize,
        error: [f64; NUM_HAND_AXES],
    },

    /// The client cancelled the goal or the executable is shutting down
    Preempted { waypoint: usize },

    /// The hand was too far from the first waypoint to start
    Rejected(StartConditionViolation),
}

/// Errors which stop a goal from being executed at all.
#[derive(Debug, Error)]
pub enum TrajExecError {
    #[error("Invalid goal: {0}")]
    InvalidGoal(GoalError),

    #[error("No hand joint state has been received")]
    NoJointState,

    #[error("Could not put the hand into velocity mode: {0}")]
    ModeSetFailed(HandIfError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GoalError {
    #[error("The trajectory contains no points")]
    Empty,

    #[error("Point {point} has {found} positions, expected {}", NUM_HAND_AXES)]
    WrongAxisCount { point: usize, found: usize },

    #[error("Point {point} has an invalid time from start ({time_s} s)")]
    InvalidTime { point: usize, time_s: f64 },

    /// `axis` is in the planner's waypoint ordering.
    #[error("Point {point} has a non-finite position on axis {axis}")]
    InvalidPosition { point: usize, axis: usize },
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Distance between the hand and the first waypoint when a goal was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct StartConditionViolation {
    /// Current minus first waypoint, in the planner's waypoint ordering
    pub error: [f64; NUM_HAND_AXES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajOutcome {
    /// Terminal action result for this outcome.
    ///
    /// Rejected goals produce no result.
    pub fn result(&self) -> Option<FollowTrajResult> {
        match self {
            TrajOutcome::Succeeded => Some(FollowTrajResult::success()),
            TrajOutcome::Aborted { .. } => Some(FollowTrajResult::with_code(
                error_code::PATH_TOLERANCE_VIOLATED,
            )),
            TrajOutcome::Preempted { .. } => None,
            TrajOutcome::Rejected(_) => None,
        }
    }

    /// The executor state this outcome leaves the goal in.
    pub fn terminal_state(&self) -> ExecState {
        match self {
            TrajOutcome::Succeeded => ExecState::Succeeded,
            TrajOutcome::Aborted { .. } => ExecState::Aborted,
            TrajOutcome::Preempted { .. } => ExecState::Preempted,
            TrajOutcome::Rejected(_) => ExecState::Idle,
        }
    }
}

impl TrajExecError {
    /// Result code reported to the client for this error.
    pub fn error_code(&self) -> i32 {
        match self {
            TrajExecError::InvalidGoal(_) => error_code::INVALID_GOAL,
            TrajExecError::NoJointState => error_code::INVALID_JOINTS,
            TrajExecError::ModeSetFailed(_) => error_code::INVALID_JOINTS,
        }
    }
}

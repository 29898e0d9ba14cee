//! # Coordinate Mapper
//!
//! Translation between the planner's waypoint axis ordering and the hand's
//! native actuation ordering.
//!
//! | Index | Planner (waypoint) | Hand (DOF) |
//! |-------|--------------------|------------|
//! | 0     | spread             | spread     |
//! | 1     | finger 1           | finger 3   |
//! | 2     | finger 2           | finger 1   |
//! | 3     | finger 3           | finger 2   |
//!
//! Values in the two orderings must never be compared without going through
//! this module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector4;
use serde::{Deserialize, Serialize};

// Internal
use comms_if::eqpt::hand::NUM_HAND_AXES;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

// Indices of the DOFs in the hand's actuation order
pub const SPREAD_DOF_INDEX: usize = 0;
pub const F3_DOF_INDEX: usize = 1;
pub const F1_DOF_INDEX: usize = 2;
pub const F2_DOF_INDEX: usize = 3;

// Indices of the DOFs in waypoints provided by the planner
pub const SPREAD_WAYPOINT_INDEX: usize = 0;
pub const F1_WAYPOINT_INDEX: usize = 1;
pub const F2_WAYPOINT_INDEX: usize = 2;
pub const F3_WAYPOINT_INDEX: usize = 3;

// Indices of the DOFs in a joint state message from the hand driver
pub const SPREAD_JOINT_INDEX: usize = 6;
pub const F1_JOINT_INDEX: usize = 1;
pub const F2_JOINT_INDEX: usize = 2;
pub const F3_JOINT_INDEX: usize = 3;

/// Minimum number of positions a hand joint state message must carry.
pub const MIN_JOINT_POSITIONS: usize = SPREAD_JOINT_INDEX + 1;

/// For each DOF index, the waypoint index it is read from.
const WAYPOINT_TO_DOF: [usize; NUM_HAND_AXES] = [
    SPREAD_WAYPOINT_INDEX,
    F3_WAYPOINT_INDEX,
    F1_WAYPOINT_INDEX,
    F2_WAYPOINT_INDEX,
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A vector of per-DOF values in the hand's actuation order.
pub type DofVec = Vector4<f64>;

/// Position of each DOF of the hand.
///
/// Units: radians
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DofState {
    pub spread: f64,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoordMapError {
    #[error("Expected {} axes but found {0}", NUM_HAND_AXES)]
    WrongAxisCount(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DofState {
    /// Convert into a vector in the hand's actuation order.
    pub fn to_vec(&self) -> DofVec {
        let mut v = DofVec::zeros();
        v[SPREAD_DOF_INDEX] = self.spread;
        v[F1_DOF_INDEX] = self.f1;
        v[F2_DOF_INDEX] = self.f2;
        v[F3_DOF_INDEX] = self.f3;
        v
    }

    /// Build from a vector in the hand's actuation order.
    pub fn from_vec(v: &DofVec) -> Self {
        Self {
            spread: v[SPREAD_DOF_INDEX],
            f1: v[F1_DOF_INDEX],
            f2: v[F2_DOF_INDEX],
            f3: v[F3_DOF_INDEX],
        }
    }

    /// Convert into the planner's waypoint ordering.
    pub fn to_waypoint(&self) -> [f64; NUM_HAND_AXES] {
        dof_to_waypoint(&self.to_vec())
    }

    /// Extract the DOF positions from a hand joint state position array.
    ///
    /// Returns `None` if the array is too short to hold all DOFs.
    pub fn from_joint_positions(position: &[f64]) -> Option<Self> {
        if position.len() < MIN_JOINT_POSITIONS {
            return None;
        }

        Some(Self {
            spread: position[SPREAD_JOINT_INDEX],
            f1: position[F1_JOINT_INDEX],
            f2: position[F2_JOINT_INDEX],
            f3: position[F3_JOINT_INDEX],
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map waypoint positions (planner ordering) into a DOF vector (hand ordering).
pub fn waypoint_to_dof(positions: &[f64]) -> Result<DofVec, CoordMapError> {
    if positions.len() != NUM_HAND_AXES {
        return Err(CoordMapError::WrongAxisCount(positions.len()));
    }

    Ok(DofVec::from_fn(|i, _| positions[WAYPOINT_TO_DOF[i]]))
}

/// Map a DOF vector (hand ordering) into waypoint positions (planner ordering).
pub fn dof_to_waypoint(dof: &DofVec) -> [f64; NUM_HAND_AXES] {
    let mut wp = [0f64; NUM_HAND_AXES];
    for (dof_index, wp_index) in WAYPOINT_TO_DOF.iter().enumerate() {
        wp[*wp_index] = dof[dof_index];
    }
    wp
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

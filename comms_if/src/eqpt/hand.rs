//! # Hand Equipment Messages
//!
//! Joint state feed, velocity commands and driver service requests for the Barrett hand.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of independently actuated axes on the hand (spread + three finger flexions).
pub const NUM_HAND_AXES: usize = 4;

/// Name of the first joint in every joint state message published by the hand driver.
///
/// Other equipment shares the joint state topic, so this is used to pick out hand messages.
pub const HAND_JOINT_ID: &str = "bh_j23_joint";

/// Joint names of a velocity command, in the hand's native actuation order
/// (spread, finger 3, finger 1, finger 2).
pub const CMD_JOINT_NAMES: [&str; NUM_HAND_AXES] = [
    "bh_j11_joint",
    "bh_j32_joint",
    "bh_j12_joint",
    "bh_j22_joint",
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A named joint state update, as published on the shared joint state feed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct JointState {
    /// Joint names, the first entry identifies the publishing equipment
    pub name: Vec<String>,

    /// Joint positions.
    ///
    /// Units: radians
    pub position: Vec<f64>,

    /// Joint velocities.
    ///
    /// Units: radians/second
    pub velocity: Vec<f64>,

    /// Joint efforts
    pub effort: Vec<f64>,
}

/// A command sent to the hand driver.
///
/// The hand is always driven in velocity mode by the trajectory executor so the position and
/// effort fields are kept at zero.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HandCommand {
    /// Names of the commanded joints, see [`CMD_JOINT_NAMES`]
    pub name: Vec<String>,

    /// Position demand, always zero.
    pub position: [f64; NUM_HAND_AXES],

    /// Velocity demand in the hand's native actuation order.
    ///
    /// Units: radians/second
    pub velocity: [f64; NUM_HAND_AXES],

    /// Effort demand, always zero.
    pub effort: [f64; NUM_HAND_AXES],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Control modes supported by the hand driver.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Position,
    Velocity,
}

/// One-shot actions supported by the hand driver's action service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandAction {
    /// Initialise (home) the hand
    InitHand,

    /// Close all fingers
    CloseGrasp,

    /// Open all fingers
    OpenGrasp,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HandCommand {
    /// Build a pure velocity command from the given velocity vector (hand native order).
    pub fn velocity(velocity: [f64; NUM_HAND_AXES]) -> Self {
        Self {
            name: CMD_JOINT_NAMES.iter().map(|n| n.to_string()).collect(),
            position: [0.0; NUM_HAND_AXES],
            velocity,
            effort: [0.0; NUM_HAND_AXES],
        }
    }
}

impl JointState {
    /// Returns true if this message was published by the hand with the given leading joint name.
    pub fn is_from(&self, joint_id: &str) -> bool {
        self.name.first().map(|n| n == joint_id).unwrap_or(false)
    }
}

//! # Tactile Sensor Messages

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Raw per-taxel pressure readings from the hand's tactile pads.
///
/// The driver publishes empty arrays for the first few messages after start up.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TactileArray {
    pub finger1: Vec<f64>,
    pub finger2: Vec<f64>,
    pub finger3: Vec<f64>,
    pub palm: Vec<f64>,
}

/// Broadcast of the frame names of all tactile contacts registered since the last reset.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TactileContactFrames {
    pub tactile_frames: Vec<String>,
}

/// Response to a boolean flag service request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SetBoolResponse {
    pub success: bool,
    pub message: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TactileArray {
    /// True if this reading carries no finger data.
    ///
    /// Only finger 1 is checked as the driver fills all pads at once.
    pub fn is_empty(&self) -> bool {
        self.finger1.is_empty()
    }
}

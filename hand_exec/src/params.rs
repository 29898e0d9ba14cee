//! Hand executable parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::sim_hand::SimParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the hand executable itself. Module parameters live in their
/// own files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandExecParams {
    /// Leading joint name of joint state messages published by the hand
    pub hand_joint_id: String,

    /// Period of the main (telecommand) loop.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Period at which the hand publishes its joint state and tactile feeds.
    ///
    /// Units: seconds
    pub feed_period_s: f64,

    /// Rate of the contact frame broadcast.
    ///
    /// Units: Hz
    pub broadcast_rate_hz: f64,

    /// Simulated hand
    pub sim: SimParams,
}

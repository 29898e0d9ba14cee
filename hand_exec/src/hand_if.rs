//! # Hand collaborator interfaces
//!
//! The executor talks to the outside world only through these traits. The
//! transport behind them (a driver node, a simulator, a test double) is not
//! known to the rest of the crate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use thiserror::Error;

use comms_if::{
    action::FollowTrajFeedback,
    eqpt::{
        hand::{ControlMode, HandAction, HandCommand},
        tactile::TactileContactFrames,
    },
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Interface to the hand driver.
pub trait HandIf {
    /// Set the driver's control mode. Blocks until the driver has acknowledged.
    fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), HandIfError>;

    /// Request a one-shot action from the driver.
    fn send_action(&mut self, action: HandAction) -> Result<(), HandIfError>;

    /// Send a joint command.
    fn send_command(&mut self, cmd: &HandCommand) -> Result<(), HandIfError>;
}

/// Sink for the contact frame broadcast.
pub trait ContactFramePub: Send + Sync {
    fn publish(&self, frames: &TactileContactFrames);
}

/// The executor's view of the goal it is running.
pub trait GoalHandle {
    /// True if the client has asked for this goal to be cancelled.
    fn is_preempt_requested(&self) -> bool;

    fn publish_feedback(&mut self, feedback: &FollowTrajFeedback);
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandIfError {
    #[error("The hand driver rejected the request: {0}")]
    Rejected(String),

    #[error("No response from the hand driver")]
    Timeout,
}

//! # Communications interface crate.
//!
//! Provides all common message definitions exchanged between the hand executable and its
//! collaborators (hand driver, planner, tactile sensors).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands which can be sent to the hand executable
pub mod tc;

/// Command, feed and response definitions for equipment (the hand)
pub mod eqpt;

/// Trajectory following action definitions (goal, feedback, result)
pub mod action;

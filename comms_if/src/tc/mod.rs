//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. Telecommands are the requests the hand executable accepts from
//! its clients: trajectory goals, preemption and the tactile control services.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use crate::action::FollowTrajGoal;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. a request sent to the hand executable by a client.
///
/// Serialised as `{"type": "<TYPE>", "payload": <payload>}`, where commands
/// without data omit the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tc {
    /// Follow the given joint trajectory
    FollowTraj(FollowTrajGoal),

    /// Request preemption of the executing trajectory
    Preempt,

    /// Rezero the tactile sensors and re-enable all fingers
    ResetTactile,

    /// Set whether tactile contacts are ignored during execution
    SetIgnoreTactile(bool),
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

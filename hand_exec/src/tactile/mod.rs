//! Tactile fusion module
//!
//! Turns raw taxel readings into the per-DOF activation mask which gates the
//! velocity commands, and the set of contact frames touched so far.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod frame_map;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// Internal
use crate::coord_map::{DofVec, F1_DOF_INDEX, F2_DOF_INDEX, F3_DOF_INDEX};
use comms_if::eqpt::hand::NUM_HAND_AXES;
pub use frame_map::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of tactile fingers on the hand.
pub const NUM_FINGERS: usize = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-DOF gate on velocity commands, in the hand's actuation order.
///
/// An entry can only be switched off. The only way to switch entries back on
/// is to build a new mask with [`ActivationMask::all_active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivationMask([bool; NUM_HAND_AXES]);

/// Unique names of the frames in which tactile contact has been detected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactFrameSet(BTreeSet<String>);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The tactile fingers of the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Finger {
    F1,
    F2,
    F3,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Finger {
    pub const ALL: [Finger; NUM_FINGERS] = [Finger::F1, Finger::F2, Finger::F3];

    /// Index of the DOF flexing this finger.
    pub fn dof_index(&self) -> usize {
        match self {
            Finger::F1 => F1_DOF_INDEX,
            Finger::F2 => F2_DOF_INDEX,
            Finger::F3 => F3_DOF_INDEX,
        }
    }

    /// One-based finger number, as used in frame and topic names.
    pub fn number(&self) -> usize {
        match self {
            Finger::F1 => 1,
            Finger::F2 => 2,
            Finger::F3 => 3,
        }
    }
}

impl ActivationMask {
    pub fn all_active() -> Self {
        Self([true; NUM_HAND_AXES])
    }

    /// Disable the DOF at the given index. Has no effect if already disabled.
    pub fn disable(&mut self, dof_index: usize) {
        self.0[dof_index] = false;
    }

    pub fn is_active(&self, dof_index: usize) -> bool {
        self.0[dof_index]
    }

    pub fn as_array(&self) -> [bool; NUM_HAND_AXES] {
        self.0
    }

    /// The mask as a vector of 1.0 (active) and 0.0 (disabled) for elementwise masking.
    pub fn as_vec(&self) -> DofVec {
        DofVec::from_fn(|i, _| if self.0[i] { 1.0 } else { 0.0 })
    }
}

impl Default for ActivationMask {
    fn default() -> Self {
        Self::all_active()
    }
}

impl ContactFrameSet {
    /// Add a frame, returning true if it wasn't already present.
    pub fn insert(&mut self, frame: String) -> bool {
        self.0.insert(frame)
    }

    pub fn contains(&self, frame: &str) -> bool {
        self.0.contains(frame)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The frame names in sorted order.
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

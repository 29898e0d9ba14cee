//! # Shared State Store
//!
//! Latest hand joint state (and the DOF state translated from it) plus the
//! latest raw tactile reading. Written by the feed handlers and read by the
//! trajectory executor, each access taking the lock only for the copy in or
//! out.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use parking_lot::Mutex;

// Internal
use crate::coord_map::{DofState, MIN_JOINT_POSITIONS};
use comms_if::eqpt::{hand::JointState, tactile::TactileArray};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lock guarded store of the latest feed data.
#[derive(Debug)]
pub struct StateStore {
    /// Leading joint name identifying messages from the hand
    joint_id: String,

    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    joint_state: Option<JointState>,
    dof_state: Option<DofState>,
    tactile: Option<TactileArray>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StateStore {
    /// Create an empty store which accepts joint states led by `joint_id`.
    pub fn new(joint_id: &str) -> Self {
        Self {
            joint_id: joint_id.to_string(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Update the joint state from a message on the shared joint state feed.
    ///
    /// Messages from other equipment are ignored. Returns true if the store
    /// was updated.
    pub fn update_joint_state(&self, js: &JointState) -> bool {
        if !js.is_from(&self.joint_id) {
            return false;
        }

        let dof = match DofState::from_joint_positions(&js.position) {
            Some(d) => d,
            None => {
                warn!(
                    "Hand joint state has {} positions, at least {} are required. Message ignored.",
                    js.position.len(),
                    MIN_JOINT_POSITIONS
                );
                return false;
            }
        };

        let mut inner = self.inner.lock();
        inner.joint_state = Some(js.clone());
        inner.dof_state = Some(dof);

        true
    }

    /// Latest DOF state, or `None` if no hand joint state has arrived yet.
    pub fn dof_state(&self) -> Option<DofState> {
        self.inner.lock().dof_state
    }

    pub fn joint_state(&self) -> Option<JointState> {
        self.inner.lock().joint_state.clone()
    }

    /// Replace the tactile snapshot. Empty readings are not stored.
    pub fn update_tactile(&self, reading: &TactileArray) -> bool {
        if reading.is_empty() {
            return false;
        }

        self.inner.lock().tactile = Some(reading.clone());
        true
    }

    pub fn tactile_snapshot(&self) -> Option<TactileArray> {
        self.inner.lock().tactile.clone()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

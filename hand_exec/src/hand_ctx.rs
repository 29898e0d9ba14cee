//! # Hand context
//!
//! Everything the feed handlers, the control surface and the trajectory
//! executor share. Built once at start up and handed around in an `Arc`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

// Internal
use crate::{
    coord_map::DofState,
    state_store::StateStore,
    tactile::{self, ActivationMask, FusionReport, TactileFusion},
};
use comms_if::eqpt::{hand::JointState, tactile::TactileArray};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct HandCtx {
    pub store: StateStore,

    tactile: Mutex<TactileFusion>,

    shutdown: AtomicBool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HandCtx {
    pub fn new(joint_id: &str, tactile_params: tactile::Params) -> Self {
        Self {
            store: StateStore::new(joint_id),
            tactile: Mutex::new(TactileFusion::new(tactile_params)),
            shutdown: AtomicBool::new(false),
        }
    }

    // ---- FEED HANDLERS ----

    /// Handle a message from the joint state feed.
    pub fn on_joint_state(&self, js: &JointState) -> bool {
        self.store.update_joint_state(js)
    }

    /// Handle a raw tactile reading.
    ///
    /// Fusion is skipped while tactile contacts are ignored, but non-empty
    /// snapshots are still kept. A reset issued while ignoring therefore
    /// baselines against current data rather than a stale or empty reading.
    pub fn on_tactile(&self, reading: &TactileArray) -> FusionReport {
        if !self.store.update_tactile(reading) {
            trace!("Empty tactile reading discarded");
        }

        // Store lock is released before the fusion lock is taken
        self.tactile.lock().proc(reading)
    }

    // ---- TACTILE CONTROL ----

    /// Rezero the tactile sensors against the latest snapshot, clear the
    /// contact set and re-enable every DOF.
    pub fn reset_tactile(&self) {
        let snapshot = self.store.tactile_snapshot();
        self.tactile.lock().reset(snapshot.as_ref());
    }

    pub fn set_ignore_tactile(&self, ignore: bool) {
        self.tactile.lock().set_ignore(ignore);
    }

    pub fn is_ignoring_tactile(&self) -> bool {
        self.tactile.lock().is_ignoring()
    }

    pub fn mask(&self) -> ActivationMask {
        self.tactile.lock().mask()
    }

    /// Sorted names of the frames in contact since the last reset.
    pub fn contact_frames(&self) -> Vec<String> {
        self.tactile.lock().contact_frames().to_vec()
    }

    // ---- STATE ----

    pub fn dof_state(&self) -> Option<DofState> {
        self.store.dof_state()
    }

    // ---- SHUTDOWN ----

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

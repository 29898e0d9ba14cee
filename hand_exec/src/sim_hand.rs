//! # Simulated hand
//!
//! A kinematic stand-in for the hand driver. Velocity commands are integrated
//! into the DOF positions and a simple contact model presses taxels when a
//! finger reaches a configured angle, at which point the finger is blocked.
//!
//! The simulator is shared between the thread feeding the context and the
//! executor's `HandIf`, so cloning a `SimHand` gives another handle to the
//! same hand.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Internal
use crate::{
    coord_map::{
        DofState, DofVec, F1_JOINT_INDEX, F2_JOINT_INDEX, F3_JOINT_INDEX, SPREAD_JOINT_INDEX,
    },
    hand_ctx::HandCtx,
    hand_if::{HandIf, HandIfError},
    tactile::Finger,
};
use comms_if::eqpt::{
    hand::{ControlMode, HandAction, HandCommand, JointState, HAND_JOINT_ID},
    tactile::TactileArray,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Joint names of the simulated joint state message. Positions of the
/// proximal and spread joints sit at the indices the coordinate mapper reads.
const JOINT_NAMES: [&str; 8] = [
    HAND_JOINT_ID,
    "bh_j12_joint",
    "bh_j22_joint",
    "bh_j32_joint",
    "bh_j33_joint",
    "bh_j13_joint",
    "bh_j11_joint",
    "bh_j21_joint",
];

/// Ratio between distal and proximal joint angles.
const DISTAL_COUPLING: f64 = 1.0 / 3.0;

/// Finger angle reached by the close grasp action.
///
/// Units: radians
const CLOSED_FINGER_RAD: f64 = 2.4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Number of taxels on each pad.
    pub num_taxels: usize,

    /// Pressure reported by every taxel with nothing touching it.
    pub tactile_bias: f64,

    /// Number of initial steps for which the tactile pads report nothing.
    pub num_empty_tactile_steps: usize,

    /// Objects the fingers can touch.
    #[serde(default)]
    pub contacts: Vec<SimContact>,
}

/// An object which stops a finger at a given angle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimContact {
    pub finger: Finger,

    /// Finger angle at which the object is touched.
    ///
    /// Units: radians
    pub angle_rad: f64,

    /// Indices of the taxels pressed by the object.
    pub taxels: Vec<usize>,

    /// Pressure added to the pressed taxels.
    pub pressure: f64,
}

/// Handle to a simulated hand.
#[derive(Debug, Clone)]
pub struct SimHand {
    inner: Arc<Mutex<SimInner>>,
}

#[derive(Debug)]
struct SimInner {
    params: SimParams,
    dof: DofVec,
    vel: DofVec,
    mode: ControlMode,
    num_steps: usize,
    last_command: Option<HandCommand>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            num_taxels: 24,
            tactile_bias: 0.0,
            num_empty_tactile_steps: 0,
            contacts: Vec::new(),
        }
    }
}

impl SimHand {
    pub fn new(params: SimParams) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimInner {
                params,
                dof: DofVec::zeros(),
                vel: DofVec::zeros(),
                mode: ControlMode::Position,
                num_steps: 0,
                last_command: None,
            })),
        }
    }

    /// Advance the simulation by `dt`, returning the feed messages for the
    /// new state.
    pub fn step(&self, dt: Duration) -> (JointState, TactileArray) {
        let mut inner = self.inner.lock();

        if inner.mode == ControlMode::Velocity {
            let delta = inner.vel * dt.as_secs_f64();
            inner.dof += delta;
        }
        inner.block_fingers();
        inner.num_steps += 1;

        (inner.joint_state(), inner.tactile())
    }

    /// Step the simulation every `period` on a background thread, feeding the
    /// joint state and tactile readings into the context until it is shut
    /// down.
    pub fn spawn_feed(
        &self,
        ctx: Arc<HandCtx>,
        period: Duration,
    ) -> std::io::Result<JoinHandle<()>> {
        let sim = self.clone();

        thread::Builder::new()
            .name("sim_feed".into())
            .spawn(move || {
                while !ctx.is_shutdown() {
                    let (js, tactile) = sim.step(period);
                    ctx.on_joint_state(&js);
                    ctx.on_tactile(&tactile);
                    thread::sleep(period);
                }
                debug!("Sim hand feed stopped");
            })
    }

    pub fn dof_state(&self) -> DofState {
        DofState::from_vec(&self.inner.lock().dof)
    }

    /// Place the hand at the given state and stop it.
    pub fn set_dof_state(&self, state: DofState) {
        let mut inner = self.inner.lock();
        inner.dof = state.to_vec();
        inner.vel = DofVec::zeros();
    }

    pub fn mode(&self) -> ControlMode {
        self.inner.lock().mode
    }

    pub fn last_command(&self) -> Option<HandCommand> {
        self.inner.lock().last_command.clone()
    }
}

impl SimInner {
    /// Fingers which have reached an object can't flex any further.
    fn block_fingers(&mut self) {
        for c in self.params.contacts.iter() {
            let i = c.finger.dof_index();
            if self.dof[i] > c.angle_rad {
                self.dof[i] = c.angle_rad;
            }
        }
    }

    fn joint_state(&self) -> JointState {
        let state = DofState::from_vec(&self.dof);

        let mut position = vec![0.0; JOINT_NAMES.len()];
        position[SPREAD_JOINT_INDEX] = state.spread;
        position[F1_JOINT_INDEX] = state.f1;
        position[F2_JOINT_INDEX] = state.f2;
        position[F3_JOINT_INDEX] = state.f3;

        // Distal joints and the second spread joint are coupled
        position[0] = state.f2 * DISTAL_COUPLING;
        position[4] = state.f3 * DISTAL_COUPLING;
        position[5] = state.f1 * DISTAL_COUPLING;
        position[7] = state.spread;

        JointState {
            name: JOINT_NAMES.iter().map(|n| n.to_string()).collect(),
            velocity: vec![0.0; position.len()],
            effort: vec![0.0; position.len()],
            position,
        }
    }

    fn tactile(&self) -> TactileArray {
        if self.num_steps <= self.params.num_empty_tactile_steps {
            return TactileArray::default();
        }

        let pad = vec![self.params.tactile_bias; self.params.num_taxels];
        let mut array = TactileArray {
            finger1: pad.clone(),
            finger2: pad.clone(),
            finger3: pad.clone(),
            palm: pad,
        };

        for c in self.params.contacts.iter() {
            if self.dof[c.finger.dof_index()] < c.angle_rad {
                continue;
            }

            let taxels = match c.finger {
                Finger::F1 => &mut array.finger1,
                Finger::F2 => &mut array.finger2,
                Finger::F3 => &mut array.finger3,
            };

            for t in c.taxels.iter() {
                if let Some(v) = taxels.get_mut(*t) {
                    *v += c.pressure;
                }
            }
        }

        array
    }
}

impl HandIf for SimHand {
    fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), HandIfError> {
        let mut inner = self.inner.lock();
        if inner.mode != mode {
            debug!("Sim hand mode changed to {:?}", mode);
        }
        inner.mode = mode;
        inner.vel = DofVec::zeros();
        Ok(())
    }

    fn send_action(&mut self, action: HandAction) -> Result<(), HandIfError> {
        let mut inner = self.inner.lock();
        inner.vel = DofVec::zeros();

        let finger_angle = match action {
            HandAction::InitHand => {
                inner.dof = DofVec::zeros();
                None
            }
            HandAction::CloseGrasp => Some(CLOSED_FINGER_RAD),
            HandAction::OpenGrasp => Some(0.0),
        };

        if let Some(angle) = finger_angle {
            for f in Finger::ALL.iter() {
                inner.dof[f.dof_index()] = angle;
            }
        }
        inner.block_fingers();

        info!("Sim hand performed {:?}", action);
        Ok(())
    }

    fn send_command(&mut self, cmd: &HandCommand) -> Result<(), HandIfError> {
        let mut inner = self.inner.lock();

        if inner.mode != ControlMode::Velocity {
            return Err(HandIfError::Rejected(format!(
                "velocity command received in {:?} mode",
                inner.mode
            )));
        }

        inner.vel = DofVec::from_column_slice(&cmd.velocity);
        inner.last_command = Some(cmd.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

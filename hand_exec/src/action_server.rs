//! # Follow trajectory action server
//!
//! Goals are queued and executed one at a time on a worker thread which owns
//! the trajectory executor. The active goal can be preempted from any thread.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{channel, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use comms_if::action::{FollowTrajFeedback, FollowTrajGoal, FollowTrajResult};
use log::{info, trace, warn};
use parking_lot::Mutex;

use crate::{
    hand_if::{GoalHandle, HandIf},
    traj_exec::{Clock, TrajExec, TrajOutcome},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The action server.
#[derive(Debug)]
pub struct ActionServer {
    worker_jh: JoinHandle<()>,

    worker_sender: Sender<WorkerSignal>,
    report_receiver: Receiver<GoalReport>,

    /// Preempt flag of the goal currently executing
    active_preempt: Arc<Mutex<Option<Arc<AtomicBool>>>>,

    /// Goals submitted but not yet reported
    num_pending: Arc<AtomicUsize>,

    next_id: u64,
}

/// Terminal report of a goal.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalReport {
    pub id: u64,
    pub status: GoalStatus,
}

/// Handle given to the executor for the goal it is running.
struct ServerGoalHandle {
    id: u64,
    preempt: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Final status of a goal as seen by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalStatus {
    Succeeded(FollowTrajResult),
    Aborted(FollowTrajResult),
    Preempted,

    /// The goal was not started. No result is sent to the client.
    Rejected,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionServerError {
    #[error("Could not start the action server thread: {0}")]
    SpawnFailed(std::io::Error),

    #[error("The action server thread has stopped")]
    WorkerStopped,

    #[error("The action server thread panicked")]
    WorkerPanicked,
}

#[derive(Debug)]
enum WorkerSignal {
    /// Execute a goal
    Goal(u64, FollowTrajGoal),

    /// Stop once the queued goals are done
    Stop,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActionServer {
    /// Start the server, moving the executor onto its worker thread.
    pub fn spawn<H, C>(exec: TrajExec<H, C>) -> Result<Self, ActionServerError>
    where
        H: HandIf + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (worker_sender, worker_receiver) = channel();
        let (report_sender, report_receiver) = channel();
        let active_preempt = Arc::new(Mutex::new(None));
        let num_pending = Arc::new(AtomicUsize::new(0));

        let worker_jh = {
            let active_preempt = active_preempt.clone();
            let num_pending = num_pending.clone();

            thread::Builder::new()
                .name("action_server".into())
                .spawn(move || {
                    worker_thread(
                        exec,
                        worker_receiver,
                        report_sender,
                        active_preempt,
                        num_pending,
                    )
                })
                .map_err(ActionServerError::SpawnFailed)?
        };

        Ok(Self {
            worker_jh,
            worker_sender,
            report_receiver,
            active_preempt,
            num_pending,
            next_id: 0,
        })
    }

    /// Queue a goal for execution, returning its ID.
    pub fn submit(&mut self, goal: FollowTrajGoal) -> Result<u64, ActionServerError> {
        let id = self.next_id;
        self.next_id += 1;

        self.num_pending.fetch_add(1, Ordering::SeqCst);
        if self.worker_sender.send(WorkerSignal::Goal(id, goal)).is_err() {
            self.num_pending.fetch_sub(1, Ordering::SeqCst);
            return Err(ActionServerError::WorkerStopped);
        }

        Ok(id)
    }

    /// Request preemption of the executing goal. Returns false if no goal is
    /// executing.
    pub fn preempt(&self) -> bool {
        match self.active_preempt.lock().as_ref() {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// True if every submitted goal has been reported.
    pub fn is_idle(&self) -> bool {
        self.num_pending.load(Ordering::SeqCst) == 0
    }

    /// All reports received since the last call.
    pub fn take_reports(&self) -> Vec<GoalReport> {
        self.report_receiver.try_iter().collect()
    }

    /// Wait up to `timeout` for the next report.
    pub fn recv_report_timeout(&self, timeout: Duration) -> Option<GoalReport> {
        match self.report_receiver.recv_timeout(timeout) {
            Ok(r) => Some(r),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stop the server once the queued goals have been processed.
    ///
    /// Raise the hand context's shutdown signal first to preempt the active
    /// goal and skip the queued ones.
    pub fn stop(self) -> Result<Vec<GoalReport>, ActionServerError> {
        // The worker may already have stopped, in which case join tells us why
        self.worker_sender.send(WorkerSignal::Stop).ok();

        self.worker_jh
            .join()
            .map_err(|_| ActionServerError::WorkerPanicked)?;

        Ok(self.report_receiver.try_iter().collect())
    }
}

impl GoalHandle for ServerGoalHandle {
    fn is_preempt_requested(&self) -> bool {
        self.preempt.load(Ordering::SeqCst)
    }

    fn publish_feedback(&mut self, feedback: &FollowTrajFeedback) {
        match serde_json::to_string(feedback) {
            Ok(s) => trace!("Goal {} feedback: {}", self.id, s),
            Err(e) => warn!("Could not serialise feedback for goal {}: {}", self.id, e),
        }
    }
}

impl From<TrajOutcome> for GoalStatus {
    fn from(outcome: TrajOutcome) -> Self {
        match outcome.result() {
            Some(r) if r.is_success() => GoalStatus::Succeeded(r),
            Some(r) => GoalStatus::Aborted(r),
            None => match outcome {
                TrajOutcome::Preempted { .. } => GoalStatus::Preempted,
                _ => GoalStatus::Rejected,
            },
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn worker_thread<H: HandIf, C: Clock>(
    mut exec: TrajExec<H, C>,
    receiver: Receiver<WorkerSignal>,
    report_sender: Sender<GoalReport>,
    active_preempt: Arc<Mutex<Option<Arc<AtomicBool>>>>,
    num_pending: Arc<AtomicUsize>,
) {
    while let Ok(signal) = receiver.recv() {
        let (id, goal) = match signal {
            WorkerSignal::Stop => break,
            WorkerSignal::Goal(id, goal) => (id, goal),
        };

        let status = if exec.ctx().is_shutdown() {
            info!("Shutting down, goal {} skipped", id);
            GoalStatus::Preempted
        } else {
            info!("Goal {} accepted", id);

            let preempt = Arc::new(AtomicBool::new(false));
            *active_preempt.lock() = Some(preempt.clone());

            let mut handle = ServerGoalHandle { id, preempt };
            let status = match exec.execute(&goal, &mut handle) {
                Ok(outcome) => GoalStatus::from(outcome),
                Err(e) => GoalStatus::Aborted(FollowTrajResult::with_code(e.error_code())),
            };

            *active_preempt.lock() = None;
            status
        };

        info!("Goal {} finished: {:?}", id, status);

        if report_sender.send(GoalReport { id, status }).is_err() {
            warn!("No receiver for the report of goal {}", id);
        }
        num_pending.fetch_sub(1, Ordering::SeqCst);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        hand_ctx::HandCtx,
        hand_if::ContactFramePub,
        sim_hand::{SimHand, SimParams},
        tactile,
        traj_exec::{MonotonicClock, Params},
    };
    use comms_if::{
        action::{error_code, TrajPoint},
        eqpt::{hand::HAND_JOINT_ID, tactile::TactileContactFrames},
    };

    struct NullPub;

    impl ContactFramePub for NullPub {
        fn publish(&self, _frames: &TactileContactFrames) {}
    }

    /// Server over a simulated hand which is never stepped, so the hand stays
    /// where it starts.
    fn server() -> (ActionServer, Arc<HandCtx>) {
        let ctx = Arc::new(HandCtx::new(HAND_JOINT_ID, tactile::Params::default()));
        let sim = SimHand::new(SimParams::default());
        let (js, _) = sim.step(Duration::from_secs(0));
        ctx.on_joint_state(&js);

        let params = Params {
            control_rate_hz: 200.0,
            ..Default::default()
        };
        let exec = TrajExec::new(
            params,
            ctx.clone(),
            sim,
            MonotonicClock::new(),
            Arc::new(NullPub),
        )
        .unwrap();

        (ActionServer::spawn(exec).unwrap(), ctx)
    }

    fn goal(points: &[([f64; 4], f64)]) -> FollowTrajGoal {
        FollowTrajGoal {
            joint_names: vec![],
            points: points
                .iter()
                .map(|(p, t)| TrajPoint {
                    positions: p.to_vec(),
                    time_from_start_s: *t,
                })
                .collect(),
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn test_goal_statuses() {
        let (mut server, _ctx) = server();

        // Already at the only waypoint
        let ok = server.submit(goal(&[([0.0; 4], 0.0)])).unwrap();
        // Too far from the start
        let rej = server.submit(goal(&[([0.5, 0.0, 0.0, 0.0], 1.0)])).unwrap();
        // Malformed
        let bad = server.submit(FollowTrajGoal::default()).unwrap();

        let reports: Vec<_> = (0..3)
            .map(|_| server.recv_report_timeout(WAIT).unwrap())
            .collect();

        assert_eq!(
            reports,
            vec![
                GoalReport {
                    id: ok,
                    status: GoalStatus::Succeeded(FollowTrajResult::success())
                },
                GoalReport {
                    id: rej,
                    status: GoalStatus::Rejected
                },
                GoalReport {
                    id: bad,
                    status: GoalStatus::Aborted(FollowTrajResult::with_code(
                        error_code::INVALID_GOAL
                    ))
                },
            ]
        );
        assert!(server.is_idle());
        assert!(server.stop().unwrap().is_empty());
    }

    #[test]
    fn test_preempt_active_goal() {
        let (mut server, _ctx) = server();
        assert!(!server.preempt());

        // The hand never moves so this runs until its deadline
        let id = server
            .submit(goal(&[([0.0; 4], 0.0), ([0.0, 0.5, 0.0, 0.0], 60.0)]))
            .unwrap();

        thread::sleep(Duration::from_millis(100));
        assert!(!server.is_idle());
        assert!(server.preempt());

        let report = server.recv_report_timeout(WAIT).unwrap();
        assert_eq!(
            report,
            GoalReport {
                id,
                status: GoalStatus::Preempted
            }
        );
        assert!(server.is_idle());
        server.stop().unwrap();
    }

    #[test]
    fn test_shutdown_skips_queued_goals() {
        let (mut server, ctx) = server();

        let long = goal(&[([0.0; 4], 0.0), ([0.0, 0.5, 0.0, 0.0], 60.0)]);
        server.submit(long.clone()).unwrap();
        server.submit(long).unwrap();

        thread::sleep(Duration::from_millis(50));
        ctx.request_shutdown();

        let reports = server.stop().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.status == GoalStatus::Preempted));
    }
}

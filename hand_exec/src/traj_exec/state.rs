//! Trajectory executor state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;

// Internal
use super::*;
use crate::{
    coord_map::{dof_to_waypoint, waypoint_to_dof, DofState, DofVec},
    ctrl_surface::broadcast_contact_frames,
    hand_ctx::HandCtx,
    hand_if::{ContactFramePub, GoalHandle, HandIf},
    tactile::ActivationMask,
};
use comms_if::{
    action::{FollowTrajFeedback, FollowTrajGoal, TrajActual, TrajPoint},
    eqpt::hand::{ControlMode, HandCommand, CMD_JOINT_NAMES, NUM_HAND_AXES},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The trajectory executor.
///
/// Runs one goal at a time on the calling thread. Between ticks it only
/// waits on the clock, and never holds a lock of the hand context.
pub struct TrajExec<H: HandIf, C: Clock> {
    params: Params,

    period: Duration,

    ctx: Arc<HandCtx>,

    hand_if: H,

    clock: C,

    frames_pub: Arc<dyn ContactFramePub>,

    state: ExecState,
}

/// What a single tick decided to do.
enum TickAction {
    /// A velocity demand was sent, wait for the next tick
    Commanded,

    /// Move on to the next waypoint straight away
    Advance,

    /// Stop executing with the given outcome
    Stop(TrajOutcome),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<H: HandIf, C: Clock> TrajExec<H, C> {
    /// Create a new executor, failing if the control rate can't give a period.
    pub fn new(
        params: Params,
        ctx: Arc<HandCtx>,
        hand_if: H,
        clock: C,
        frames_pub: Arc<dyn ContactFramePub>,
    ) -> Result<Self, ParamsError> {
        let period = params.control_period()?;

        Ok(Self {
            params,
            period,
            ctx,
            hand_if,
            clock,
            frames_pub,
            state: ExecState::Idle,
        })
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn ctx(&self) -> &Arc<HandCtx> {
        &self.ctx
    }

    pub fn hand_if(&self) -> &H {
        &self.hand_if
    }

    pub fn hand_if_mut(&mut self) -> &mut H {
        &mut self.hand_if
    }

    /// Execute a trajectory goal to completion.
    ///
    /// Goals which can't be started at all return an error, in which case the
    /// hand has not been commanded. Otherwise the outcome says how execution
    /// ended. The executor is always back in `Idle` when this returns.
    pub fn execute<G: GoalHandle>(
        &mut self,
        goal: &FollowTrajGoal,
        handle: &mut G,
    ) -> Result<TrajOutcome, TrajExecError> {
        self.set_state(ExecState::Validating);

        let result = self.run(goal, handle);

        match &result {
            Ok(outcome) => {
                self.set_state(outcome.terminal_state());
                info!("Trajectory finished: {:?}", outcome);
            }
            Err(e) => warn!("Trajectory not executed: {}", e),
        }
        self.set_state(ExecState::Idle);

        result
    }

    fn run<G: GoalHandle>(
        &mut self,
        goal: &FollowTrajGoal,
        handle: &mut G,
    ) -> Result<TrajOutcome, TrajExecError> {
        // ---- VALIDATION ----

        let targets = validate_goal(goal).map_err(TrajExecError::InvalidGoal)?;

        self.hand_if
            .set_control_mode(ControlMode::Velocity)
            .map_err(TrajExecError::ModeSetFailed)?;

        let current = self.ctx.dof_state().ok_or(TrajExecError::NoJointState)?;

        let start_error = current.to_vec() - targets[0];
        if start_error.amax() > self.params.start_point_threshold {
            let violation = StartConditionViolation {
                error: dof_to_waypoint(&start_error),
            };
            warn!(
                "Hand is too far from the start of the trajectory (error {:?}), goal rejected",
                violation.error
            );
            return Ok(TrajOutcome::Rejected(violation));
        }

        info!(
            "Executing trajectory with {} waypoints over {:.2} s",
            targets.len(),
            goal.points[targets.len() - 1].time_from_start_s
        );

        // ---- EXECUTION ----

        let period = self.period;
        let start_time = self.clock.now();
        let mut index = 0;

        while index < targets.len() {
            self.set_state(ExecState::Executing(index));

            let tick_start = self.clock.now();
            let elapsed = tick_start.checked_sub(start_time).unwrap_or_default();

            match self.tick(goal, &targets, index, elapsed, handle)? {
                TickAction::Commanded => self.sleep_until(tick_start + period),
                TickAction::Advance => index += 1,
                TickAction::Stop(outcome) => return Ok(outcome),
            }
        }

        Ok(TrajOutcome::Succeeded)
    }

    /// Run one control tick towards the waypoint at `index`.
    fn tick<G: GoalHandle>(
        &mut self,
        goal: &FollowTrajGoal,
        targets: &[DofVec],
        index: usize,
        elapsed: Duration,
        handle: &mut G,
    ) -> Result<TickAction, TrajExecError> {
        broadcast_contact_frames(&self.ctx, self.frames_pub.as_ref());

        let current = self.ctx.dof_state().ok_or(TrajExecError::NoJointState)?;
        let mask = self.ctx.mask();
        let error = masked_error(&current, &targets[index], &mask);
        let max_error = error.amax();

        if max_error > self.params.execution_waypoint_threshold {
            let error = dof_to_waypoint(&error);
            warn!(
                "Deviation from waypoint {} exceeds {} (error {:?}), aborting",
                index, self.params.execution_waypoint_threshold, error
            );
            return Ok(TickAction::Stop(TrajOutcome::Aborted {
                waypoint: index,
                error,
            }));
        }

        let is_final = index + 1 == targets.len();
        let tolerance = if is_final {
            self.params.final_waypoint_tolerance
        } else {
            self.params.waypoint_tolerance
        };

        if max_error <= tolerance {
            debug!("Waypoint {} reached at {:.2} s", index, elapsed.as_secs_f64());
            return Ok(TickAction::Advance);
        }

        let point = &goal.points[index];
        if elapsed.as_secs_f64() > point.time_from_start_s {
            warn!(
                "Waypoint {} not reached by {:.2} s (error {:.3}), moving on",
                index, point.time_from_start_s, max_error
            );
            return Ok(TickAction::Advance);
        }

        if handle.is_preempt_requested() || self.ctx.is_shutdown() {
            info!("Trajectory preempted at waypoint {}", index);
            return Ok(TickAction::Stop(TrajOutcome::Preempted { waypoint: index }));
        }

        let vel = control_law(&error, &mask, &self.params);
        trace!("Waypoint {} error {:?} vel {:?}", index, error.as_slice(), vel.as_slice());

        let mut demand = [0f64; NUM_HAND_AXES];
        demand.copy_from_slice(vel.as_slice());
        if let Err(e) = self.hand_if.send_command(&HandCommand::velocity(demand)) {
            warn!("Could not send velocity command: {}", e);
        }

        handle.publish_feedback(&feedback(point, &current));

        Ok(TickAction::Commanded)
    }

    /// Wait until `deadline`, or return immediately if it has already passed.
    fn sleep_until(&self, deadline: Duration) {
        let now = self.clock.now();
        match deadline.checked_sub(now) {
            Some(remaining) if remaining > Duration::from_secs(0) => self.clock.sleep(remaining),
            _ => warn!(
                "Control tick overran by {:.3} s",
                now.checked_sub(deadline).unwrap_or_default().as_secs_f64()
            ),
        }
    }

    fn set_state(&mut self, state: ExecState) {
        if self.state != state {
            trace!("TrajExec {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Check a goal can be executed, returning its waypoints mapped into the
/// hand's actuation order.
pub fn validate_goal(goal: &FollowTrajGoal) -> Result<Vec<DofVec>, GoalError> {
    if goal.points.is_empty() {
        return Err(GoalError::Empty);
    }

    goal.points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if !p.time_from_start_s.is_finite() || p.time_from_start_s < 0.0 {
                return Err(GoalError::InvalidTime {
                    point: i,
                    time_s: p.time_from_start_s,
                });
            }

            let target = waypoint_to_dof(&p.positions).map_err(|_| GoalError::WrongAxisCount {
                point: i,
                found: p.positions.len(),
            })?;

            // NaN compares false against every threshold, so it must not reach the loop
            match p.positions.iter().position(|x| !x.is_finite()) {
                Some(axis) => Err(GoalError::InvalidPosition { point: i, axis }),
                None => Ok(target),
            }
        })
        .collect()
}

/// Current minus target, with the DOFs disabled by the mask zeroed.
pub fn masked_error(current: &DofState, target: &DofVec, mask: &ActivationMask) -> DofVec {
    (current.to_vec() - target).component_mul(&mask.as_vec())
}

/// Proportional velocity demand for the given masked error.
///
/// The demand is clamped to the maximum velocity and disabled DOFs are always
/// given zero.
pub fn control_law(error: &DofVec, mask: &ActivationMask, params: &Params) -> DofVec {
    let gain = DofVec::from_column_slice(&params.gain);

    (-gain.component_mul(error))
        .map(|v| v.max(-params.max_vel).min(params.max_vel))
        .component_mul(&mask.as_vec())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the feedback for a tick.
///
/// The hand driver reports no velocity or acceleration for the DOFs, the
/// actual velocities and accelerations carry the positions instead.
fn feedback(point: &TrajPoint, current: &DofState) -> FollowTrajFeedback {
    let actual = current.to_waypoint().to_vec();

    FollowTrajFeedback {
        joint_names: CMD_JOINT_NAMES.iter().map(|n| n.to_string()).collect(),
        desired: point.clone(),
        actual: TrajActual {
            positions: actual.clone(),
            velocities: actual.clone(),
            accelerations: actual,
            time_from_start_s: point.time_from_start_s,
        },
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        coord_map::{F1_DOF_INDEX, F2_DOF_INDEX, SPREAD_DOF_INDEX},
        hand_if::HandIfError,
        sim_hand::{SimContact, SimHand, SimParams},
        tactile::{self, Finger},
    };
    use comms_if::{
        action::{error_code, FollowTrajResult},
        eqpt::{
            hand::{HandAction, HAND_JOINT_ID},
            tactile::TactileContactFrames,
        },
    };
    use parking_lot::Mutex;
    use std::cell::Cell;

    const PERIOD: Duration = Duration::from_millis(100);

    /// Virtual clock which steps the simulated hand while "sleeping".
    struct SimClock {
        now: Cell<Duration>,
        sim: SimHand,
        ctx: Arc<HandCtx>,
    }

    impl Clock for SimClock {
        fn now(&self) -> Duration {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.now.set(self.now.get() + duration);

            let (js, tactile) = self.sim.step(duration);
            self.ctx.on_joint_state(&js);
            self.ctx.on_tactile(&tactile);
        }
    }

    /// Records everything sent to the hand.
    struct TestHand {
        sim: SimHand,
        modes: Vec<ControlMode>,
        commands: Vec<HandCommand>,
        fail_mode_set: bool,
    }

    impl HandIf for TestHand {
        fn set_control_mode(&mut self, mode: ControlMode) -> Result<(), HandIfError> {
            if self.fail_mode_set {
                return Err(HandIfError::Timeout);
            }
            self.modes.push(mode);
            self.sim.set_control_mode(mode)
        }

        fn send_action(&mut self, action: HandAction) -> Result<(), HandIfError> {
            self.sim.send_action(action)
        }

        fn send_command(&mut self, cmd: &HandCommand) -> Result<(), HandIfError> {
            self.commands.push(cmd.clone());
            self.sim.send_command(cmd)
        }
    }

    /// Goal handle which requests preemption after a number of feedbacks.
    #[derive(Default)]
    struct TestGoal {
        feedback: Vec<FollowTrajFeedback>,
        preempt_after: Option<usize>,
    }

    impl GoalHandle for TestGoal {
        fn is_preempt_requested(&self) -> bool {
            self.preempt_after
                .map(|n| self.feedback.len() >= n)
                .unwrap_or(false)
        }

        fn publish_feedback(&mut self, feedback: &FollowTrajFeedback) {
            self.feedback.push(feedback.clone());
        }
    }

    #[derive(Default)]
    struct CountingPub {
        count: Mutex<usize>,
    }

    impl ContactFramePub for CountingPub {
        fn publish(&self, _frames: &TactileContactFrames) {
            *self.count.lock() += 1;
        }
    }

    struct Rig {
        exec: TrajExec<TestHand, SimClock>,
        ctx: Arc<HandCtx>,
        sim: SimHand,
        frames_pub: Arc<CountingPub>,
    }

    fn rig(sim_params: SimParams) -> Rig {
        let ctx = Arc::new(HandCtx::new(HAND_JOINT_ID, tactile::Params::default()));
        let sim = SimHand::new(sim_params);

        // Prime the feeds
        let (js, tactile) = sim.step(Duration::from_secs(0));
        ctx.on_joint_state(&js);
        ctx.on_tactile(&tactile);

        let clock = SimClock {
            now: Cell::new(Duration::from_secs(0)),
            sim: sim.clone(),
            ctx: ctx.clone(),
        };
        let hand = TestHand {
            sim: sim.clone(),
            modes: vec![],
            commands: vec![],
            fail_mode_set: false,
        };
        let frames_pub = Arc::new(CountingPub::default());

        let exec = TrajExec::new(
            Params::default(),
            ctx.clone(),
            hand,
            clock,
            frames_pub.clone(),
        )
        .unwrap();

        Rig {
            exec,
            ctx,
            sim,
            frames_pub,
        }
    }

    /// Goal starting at the origin and moving to `target` (waypoint order).
    fn goal_to(target: [f64; 4], time_s: f64) -> FollowTrajGoal {
        FollowTrajGoal {
            joint_names: vec![],
            points: vec![
                TrajPoint {
                    positions: vec![0.0; 4],
                    time_from_start_s: 0.0,
                },
                TrajPoint {
                    positions: target.to_vec(),
                    time_from_start_s: time_s,
                },
            ],
        }
    }

    #[test]
    fn test_control_law() {
        let params = Params::default();
        let mask = ActivationMask::all_active();

        // Hand at zero, finger 1 targeted at 0.5
        let target = waypoint_to_dof(&[0.0, 0.5, 0.0, 0.0]).unwrap();
        let error = masked_error(&DofState::default(), &target, &mask);
        let vel = control_law(&error, &mask, &params);
        assert!((vel[F1_DOF_INDEX] - 0.2).abs() < 1e-12);
        assert_eq!(vel[SPREAD_DOF_INDEX], 0.0);

        // Large errors are clamped
        let error = DofVec::new(5.0, -5.0, 0.5, 0.0);
        let vel = control_law(&error, &mask, &params);
        assert_eq!(vel[0], -0.4);
        assert_eq!(vel[1], 0.4);

        // Disabled DOFs are never driven
        let mut mask = ActivationMask::all_active();
        mask.disable(F1_DOF_INDEX);
        let vel = control_law(&DofVec::new(0.0, 0.0, -1.0, 0.0), &mask, &params);
        assert_eq!(vel[F1_DOF_INDEX], 0.0);
    }

    #[test]
    fn test_validate_goal() {
        assert_eq!(
            validate_goal(&FollowTrajGoal::default()),
            Err(GoalError::Empty)
        );

        let mut goal = goal_to([0.0, 0.5, 0.0, 0.0], 2.0);
        goal.points[1].positions.pop();
        assert_eq!(
            validate_goal(&goal),
            Err(GoalError::WrongAxisCount { point: 1, found: 3 })
        );

        let goal = goal_to([0.0, 0.5, 0.0, 0.0], -1.0);
        assert!(matches!(
            validate_goal(&goal),
            Err(GoalError::InvalidTime { point: 1, .. })
        ));

        let goal = goal_to([0.0, 0.5, 0.0, 0.0], f64::NAN);
        assert!(validate_goal(&goal).is_err());

        let targets = validate_goal(&goal_to([0.1, 0.2, 0.3, 0.4], 2.0)).unwrap();
        assert_eq!(targets[1], DofVec::new(0.1, 0.4, 0.2, 0.3));
    }

    #[test]
    fn test_reaches_single_finger_target() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal::default();

        let outcome = r
            .exec
            .execute(&goal_to([0.0, 0.5, 0.0, 0.0], 10.0), &mut goal)
            .unwrap();

        assert_eq!(outcome, TrajOutcome::Succeeded);
        assert_eq!(outcome.result(), Some(FollowTrajResult::success()));
        assert_eq!(r.exec.state(), ExecState::Idle);
        assert_eq!(r.exec.hand_if().modes, vec![ControlMode::Velocity]);

        // First command drives finger 1 at 0.2 and nothing else
        let cmds = &r.exec.hand_if().commands;
        let first = cmds[0].velocity;
        assert!((first[F1_DOF_INDEX] - 0.2).abs() < 1e-12);
        assert_eq!(first[SPREAD_DOF_INDEX], 0.0);
        assert_eq!(first[F2_DOF_INDEX], 0.0);
        assert_eq!(cmds[0].position, [0.0; 4]);
        assert_eq!(cmds[0].effort, [0.0; 4]);

        // Error shrinks every tick
        let f1: Vec<f64> = goal.feedback.iter().map(|f| f.actual.positions[1]).collect();
        assert_eq!(f1.len(), cmds.len());
        for pair in f1.windows(2) {
            assert!(pair[1] > pair[0]);
        }

        // Accepted within the final tolerance
        assert!((r.sim.dof_state().f1 - 0.5).abs() <= 0.03);
        assert!(cmds.len() < 100);

        // One broadcast per tick, including the tick the first waypoint was reached
        assert!(*r.frames_pub.count.lock() >= cmds.len() + 1);
    }

    #[test]
    fn test_feedback_contents() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal {
            preempt_after: Some(1),
            ..Default::default()
        };

        r.exec
            .execute(&goal_to([0.0, 0.5, 0.0, 0.0], 10.0), &mut goal)
            .unwrap();

        let fb = &goal.feedback[0];
        assert_eq!(fb.joint_names[0], "bh_j11_joint");
        assert_eq!(fb.desired.positions, vec![0.0, 0.5, 0.0, 0.0]);
        assert_eq!(fb.actual.positions, vec![0.0; 4]);
        assert_eq!(fb.actual.velocities, fb.actual.positions);
        assert_eq!(fb.actual.accelerations, fb.actual.positions);
        assert_eq!(fb.actual.time_from_start_s, 10.0);
    }

    #[test]
    fn test_waypoint_timeout_advances() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal::default();

        let outcome = r
            .exec
            .execute(&goal_to([0.0, 0.5, 0.0, 0.0], 1.0), &mut goal)
            .unwrap();

        // Not reached in time, but running out of waypoints still succeeds
        assert_eq!(outcome, TrajOutcome::Succeeded);
        let n = r.exec.hand_if().commands.len();
        assert!(n >= 10 && n <= 12, "{} commands", n);
        assert!(r.sim.dof_state().f1 < 0.47);
    }

    #[test]
    fn test_deviation_aborts() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal::default();

        let outcome = r
            .exec
            .execute(&goal_to([0.0, 2.1, 0.0, 0.0], 5.0), &mut goal)
            .unwrap();

        match outcome {
            TrajOutcome::Aborted { waypoint, error } => {
                assert_eq!(waypoint, 1);
                assert!((error[1] + 2.1).abs() < 1e-12);
            }
            o => panic!("Expected abort, got {:?}", o),
        }
        assert_eq!(
            outcome.result(),
            Some(FollowTrajResult::with_code(
                error_code::PATH_TOLERANCE_VIOLATED
            ))
        );
        assert!(r.exec.hand_if().commands.is_empty());
        assert!(goal.feedback.is_empty());
        assert_eq!(r.exec.state(), ExecState::Idle);
    }

    #[test]
    fn test_deviation_aborts_mid_trajectory() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal::default();

        let mut traj = goal_to([0.0, 0.5, 0.0, 0.0], 10.0);
        traj.points.push(TrajPoint {
            positions: vec![0.0, 0.5, 2.7, 0.0],
            time_from_start_s: 20.0,
        });

        let outcome = r.exec.execute(&traj, &mut goal).unwrap();

        assert!(matches!(outcome, TrajOutcome::Aborted { waypoint: 2, .. }));

        // Every command was sent while heading for waypoint 1
        let n = r.exec.hand_if().commands.len();
        assert_eq!(n, goal.feedback.len());
        assert!(r.exec.hand_if().commands[n - 1].velocity[F2_DOF_INDEX] == 0.0);
    }

    #[test]
    fn test_preempt_between_ticks() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal {
            preempt_after: Some(5),
            ..Default::default()
        };

        let outcome = r
            .exec
            .execute(&goal_to([0.0, 0.5, 0.0, 0.0], 10.0), &mut goal)
            .unwrap();

        assert_eq!(outcome, TrajOutcome::Preempted { waypoint: 1 });
        assert_eq!(outcome.result(), None);
        assert_eq!(r.exec.hand_if().commands.len(), 5);

        // Detected on the tick right after the request
        assert_eq!(r.exec.clock.now(), PERIOD * 5);
    }

    #[test]
    fn test_shutdown_preempts() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal::default();
        r.ctx.request_shutdown();

        let outcome = r
            .exec
            .execute(&goal_to([0.0, 0.5, 0.0, 0.0], 10.0), &mut goal)
            .unwrap();

        assert_eq!(outcome, TrajOutcome::Preempted { waypoint: 1 });
        assert!(r.exec.hand_if().commands.is_empty());
    }

    #[test]
    fn test_start_condition_rejects() {
        let mut r = rig(SimParams::default());
        r.sim.set_dof_state(DofState {
            f2: 0.15,
            ..Default::default()
        });
        let (js, _) = r.sim.step(Duration::from_secs(0));
        r.ctx.on_joint_state(&js);

        let mut goal = TestGoal::default();
        let outcome = r
            .exec
            .execute(&goal_to([0.0, 0.5, 0.0, 0.0], 10.0), &mut goal)
            .unwrap();

        match &outcome {
            TrajOutcome::Rejected(v) => assert!((v.error[2] - 0.15).abs() < 1e-12),
            o => panic!("Expected rejection, got {:?}", o),
        }
        assert_eq!(outcome.result(), None);

        // Mode was still set, but nothing moved
        assert_eq!(r.exec.hand_if().modes, vec![ControlMode::Velocity]);
        assert!(r.exec.hand_if().commands.is_empty());
        assert_eq!(*r.frames_pub.count.lock(), 0);
    }

    #[test]
    fn test_mode_set_failure_propagates() {
        let mut r = rig(SimParams::default());
        r.exec.hand_if_mut().fail_mode_set = true;

        let mut goal = TestGoal::default();
        let res = r
            .exec
            .execute(&goal_to([0.0, 0.5, 0.0, 0.0], 10.0), &mut goal);

        match res {
            Err(e @ TrajExecError::ModeSetFailed(_)) => {
                assert_eq!(e.error_code(), error_code::INVALID_JOINTS)
            }
            r => panic!("Expected mode set failure, got {:?}", r),
        }
        assert!(r.exec.hand_if().commands.is_empty());
        assert_eq!(r.exec.state(), ExecState::Idle);
    }

    #[test]
    fn test_invalid_goal_leaves_hand_alone() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal::default();

        let res = r.exec.execute(&FollowTrajGoal::default(), &mut goal);
        match res {
            Err(e @ TrajExecError::InvalidGoal(GoalError::Empty)) => {
                assert_eq!(e.error_code(), error_code::INVALID_GOAL)
            }
            r => panic!("Expected invalid goal, got {:?}", r),
        }
        assert!(r.exec.hand_if().modes.is_empty());
    }

    #[test]
    fn test_non_finite_position_rejected() {
        let mut r = rig(SimParams::default());
        let mut goal = TestGoal::default();

        let traj = goal_to([0.0, f64::NAN, 0.0, 0.0], 10.0);
        assert_eq!(
            validate_goal(&traj),
            Err(GoalError::InvalidPosition { point: 1, axis: 1 })
        );

        match r.exec.execute(&traj, &mut goal) {
            Err(e @ TrajExecError::InvalidGoal(GoalError::InvalidPosition { .. })) => {
                assert_eq!(e.error_code(), error_code::INVALID_GOAL)
            }
            r => panic!("Expected invalid goal, got {:?}", r),
        }
        assert!(r.exec.hand_if().modes.is_empty());
        assert!(r.exec.hand_if().commands.is_empty());
        assert_eq!(r.exec.state(), ExecState::Idle);

        let traj = goal_to([f64::INFINITY, 0.0, 0.0, 0.0], 10.0);
        assert_eq!(
            validate_goal(&traj),
            Err(GoalError::InvalidPosition { point: 1, axis: 0 })
        );
    }

    #[test]
    fn test_bad_control_rate_refused() {
        let ctx = Arc::new(HandCtx::new(HAND_JOINT_ID, tactile::Params::default()));
        let sim = SimHand::new(SimParams::default());
        let clock = SimClock {
            now: Cell::new(Duration::from_secs(0)),
            sim: sim.clone(),
            ctx: ctx.clone(),
        };
        let hand = TestHand {
            sim,
            modes: vec![],
            commands: vec![],
            fail_mode_set: false,
        };
        let params = Params {
            control_rate_hz: 0.0,
            ..Default::default()
        };

        let res = TrajExec::new(params, ctx, hand, clock, Arc::new(CountingPub::default()));
        assert!(matches!(res, Err(ParamsError::InvalidControlRate(_))));
    }

    #[test]
    fn test_no_joint_state() {
        let ctx = Arc::new(HandCtx::new(HAND_JOINT_ID, tactile::Params::default()));
        let sim = SimHand::new(SimParams::default());
        let clock = SimClock {
            now: Cell::new(Duration::from_secs(0)),
            sim: sim.clone(),
            ctx: ctx.clone(),
        };
        let hand = TestHand {
            sim,
            modes: vec![],
            commands: vec![],
            fail_mode_set: false,
        };
        let mut exec = TrajExec::new(
            Params::default(),
            ctx,
            hand,
            clock,
            Arc::new(CountingPub::default()),
        )
        .unwrap();

        let res = exec.execute(&goal_to([0.0; 4], 1.0), &mut TestGoal::default());
        assert!(matches!(res, Err(TrajExecError::NoJointState)));
    }

    #[test]
    fn test_contact_masks_finger() {
        let mut r = rig(SimParams {
            contacts: vec![SimContact {
                finger: Finger::F1,
                angle_rad: 0.2,
                taxels: vec![4, 5],
                pressure: 1.0,
            }],
            ..Default::default()
        });
        r.ctx.set_ignore_tactile(false);

        // Finger 1 is blocked at 0.2 and later asked to go far past the
        // execution threshold, which is fine once it is masked
        let mut traj = goal_to([0.0, 0.5, 0.5, 0.0], 10.0);
        traj.points.push(TrajPoint {
            positions: vec![0.0, 2.5, 0.5, 0.0],
            time_from_start_s: 12.0,
        });

        let mut goal = TestGoal::default();
        let outcome = r.exec.execute(&traj, &mut goal).unwrap();

        assert_eq!(outcome, TrajOutcome::Succeeded);
        assert!(!r.ctx.mask().is_active(F1_DOF_INDEX));
        assert_eq!(
            r.ctx.contact_frames(),
            vec![
                "bh_finger_1_tactile_04_link".to_string(),
                "bh_finger_1_tactile_05_link".to_string()
            ]
        );

        // Finger 1 stopped being driven once contact was made
        let last = r.exec.hand_if().commands.last().unwrap();
        assert_eq!(last.velocity[F1_DOF_INDEX], 0.0);
        assert_eq!(r.sim.dof_state().f1, 0.2);
        assert!((r.sim.dof_state().f2 - 0.5).abs() <= 0.03);
    }
}

//! Main hand executable entry point.
//!
//! # Architecture
//!
//! The executable runs the following threads:
//!
//!     - Hand feed: steps the simulated hand and passes its joint state and
//!       tactile readings to the hand context
//!     - Contact broadcast: publishes the contact frame set at a fixed rate
//!     - Action server: executes trajectory goals one at a time
//!     - Main: releases telecommands from the script at their scheduled times
//!
//! Everything stops when the script is finished and all goals are done, or
//! when Ctrl-C is pressed.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use hand_lib::{
    action_server::{ActionServer, GoalStatus},
    ctrl_surface::ContactBroadcaster,
    hand_ctx::HandCtx,
    hand_if::{ContactFramePub, HandIf},
    params::HandExecParams,
    sim_hand::SimHand,
    tactile,
    traj_exec::{self, MonotonicClock, TrajExec},
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{error, info, warn};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use comms_if::eqpt::{hand::HandAction, tactile::TactileContactFrames};
use util::{
    logger::{logger_init, LevelFilter},
    params,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Barrett hand trajectory execution controller
#[derive(Debug, StructOpt)]
#[structopt(name = "hand_exec")]
struct Args {
    /// Path to the telecommand script to run
    #[structopt(parse(from_os_str))]
    script: PathBuf,
}

/// Contact frame sink which logs the set whenever it changes.
#[derive(Default)]
struct LogFramePub {
    last: Mutex<Vec<String>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ContactFramePub for LogFramePub {
    fn publish(&self, frames: &TactileContactFrames) {
        let mut last = self.last.lock();
        if *last != frames.tactile_frames {
            info!("Tactile contact frames: {:?}", frames.tactile_frames);
            *last = frames.tactile_frames.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("hand_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Barrett Hand Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: HandExecParams =
        params::load("hand_exec.toml").wrap_err("Could not load hand_exec params")?;
    let traj_params: traj_exec::Params =
        params::load("traj_exec.toml").wrap_err("Could not load traj_exec params")?;
    let tactile_params: tactile::Params =
        params::load("tactile.toml").wrap_err("Could not load tactile params")?;

    // Rates and periods are turned into durations, which can't be negative
    for (name, value) in [
        ("cycle_period_s", exec_params.cycle_period_s),
        ("feed_period_s", exec_params.feed_period_s),
        ("broadcast_rate_hz", exec_params.broadcast_rate_hz),
    ]
    .iter()
    {
        if !(value.is_finite() && *value > 0.0) {
            return Err(eyre!("Parameter {} must be positive, found {}", name, value));
        }
    }

    info!("Exec parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", args.script);

    let mut si = ScriptInterpreter::new(&args.script).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        si.get_duration(),
        si.get_num_tcs()
    );

    // ---- INITIALISE CONTEXT ----

    let ctx = Arc::new(HandCtx::new(&exec_params.hand_joint_id, tactile_params));

    {
        let ctx = ctx.clone();
        ctrlc::set_handler(move || {
            warn!("Ctrl-C received, shutting down");
            ctx.request_shutdown();
        })
        .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- INITIALISE HAND ----

    let mut sim = SimHand::new(exec_params.sim.clone());

    // A failed init isn't fatal, goals will be rejected if the hand is out of place
    match sim.send_action(HandAction::InitHand) {
        Ok(()) => info!("Hand initialised"),
        Err(e) => error!("Could not initialise the hand: {}", e),
    }

    let feed_jh = sim
        .spawn_feed(ctx.clone(), Duration::from_secs_f64(exec_params.feed_period_s))
        .wrap_err("Failed to start the hand feed")?;

    // ---- START SERVICES ----

    let frames_pub: Arc<dyn ContactFramePub> = Arc::new(LogFramePub::default());

    let broadcaster = ContactBroadcaster::spawn(
        ctx.clone(),
        frames_pub.clone(),
        Duration::from_secs_f64(1.0 / exec_params.broadcast_rate_hz),
    )
    .wrap_err("Failed to start the contact frame broadcaster")?;

    let exec = TrajExec::new(
        traj_params,
        ctx.clone(),
        sim,
        MonotonicClock::new(),
        frames_pub,
    )
    .wrap_err("Invalid traj_exec params")?;
    let mut server = ActionServer::spawn(exec).wrap_err("Failed to start the action server")?;

    info!("Initialisation complete\n");

    // ---- MAIN LOOP ----

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let script_start_s = session::get_elapsed_seconds();

    info!("Begining main loop\n");

    while !ctx.is_shutdown() {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- TELECOMMAND PROCESSING ----

        match si.get_pending_tcs(session::get_elapsed_seconds() - script_start_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&ctx, &mut server, tc)
                        .wrap_err("Failed to process a telecommand")?;
                }
            }
            // Exit once the script and every goal it submitted are done
            PendingTcs::EndOfScript => {
                if server.is_idle() {
                    info!("End of TC script reached, stopping");
                    break;
                }
            }
        }

        log_reports(&server);

        // ---- CYCLE MANAGEMENT ----

        match cycle_period.checked_sub(cycle_start_instant.elapsed()) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_start_instant.elapsed().as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }
    }

    // ---- SHUTDOWN ----

    ctx.request_shutdown();

    for report in server.stop().wrap_err("Action server failed")? {
        info!("Goal {} finished during shutdown: {:?}", report.id, report.status);
    }
    broadcaster
        .join()
        .map_err(|_| eyre!("Contact frame broadcaster panicked"))?;
    feed_jh
        .join()
        .map_err(|_| eyre!("Hand feed thread panicked"))?;

    info!("End of execution");

    Ok(())
}

/// Log the terminal status of every goal reported since the last cycle.
fn log_reports(server: &ActionServer) {
    for report in server.take_reports() {
        match report.status {
            GoalStatus::Succeeded(r) => {
                info!("Goal {} succeeded (code {})", report.id, r.error_code)
            }
            GoalStatus::Aborted(r) => warn!("Goal {} aborted (code {})", report.id, r.error_code),
            GoalStatus::Preempted => info!("Goal {} preempted", report.id),
            GoalStatus::Rejected => warn!("Goal {} rejected, no result sent", report.id),
        }
    }
}

//! # Telecommand processor module
//!
//! The telecommand processor handles the TCs coming from the script.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use comms_if::tc::Tc;
use hand_lib::{
    action_server::{ActionServer, ActionServerError},
    ctrl_surface,
    hand_ctx::HandCtx,
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
pub(crate) fn exec(
    ctx: &HandCtx,
    server: &mut ActionServer,
    tc: &Tc,
) -> Result<(), ActionServerError> {
    match tc {
        Tc::FollowTraj(goal) => {
            let id = server.submit(goal.clone())?;
            info!(
                "Submitted trajectory with {} points as goal {}",
                goal.points.len(),
                id
            );
        }
        Tc::Preempt => {
            if !server.preempt() {
                warn!("Preempt requested but no goal is executing");
            }
        }
        Tc::ResetTactile => {
            debug!("Recieved ResetTactile command");
            ctrl_surface::reset_tactile_state(ctx);
        }
        Tc::SetIgnoreTactile(ignore) => {
            let response = ctrl_surface::set_ignore_tactile_state(ctx, *ignore);
            debug!("SetIgnoreTactile response: {:?}", response);
        }
    }

    Ok(())
}

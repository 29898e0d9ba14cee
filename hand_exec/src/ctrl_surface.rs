//! # Control and query surface
//!
//! Tactile service handlers and the periodic contact frame broadcast.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Internal
use crate::{hand_ctx::HandCtx, hand_if::ContactFramePub};
use comms_if::eqpt::tactile::{SetBoolResponse, TactileContactFrames};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Background thread publishing the contact frame set at a fixed rate.
pub struct ContactBroadcaster {
    handle: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Rezero the tactile sensors and re-enable every DOF. Always succeeds.
pub fn reset_tactile_state(ctx: &HandCtx) {
    ctx.reset_tactile();
    info!("Tactile state reset");
}

/// Set whether tactile contacts are ignored. Always succeeds.
pub fn set_ignore_tactile_state(ctx: &HandCtx, ignore: bool) -> SetBoolResponse {
    ctx.set_ignore_tactile(ignore);
    info!("Ignore tactile set to {}", ignore);

    SetBoolResponse {
        success: true,
        message: String::from("Flag set correctly"),
    }
}

/// Publish the current contact frame set once.
pub fn broadcast_contact_frames(ctx: &HandCtx, publisher: &dyn ContactFramePub) {
    publisher.publish(&TactileContactFrames {
        tactile_frames: ctx.contact_frames(),
    });
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ContactBroadcaster {
    /// Start broadcasting every `period` until the context is shut down.
    pub fn spawn(
        ctx: Arc<HandCtx>,
        publisher: Arc<dyn ContactFramePub>,
        period: Duration,
    ) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name("contact_broadcast".into())
            .spawn(move || {
                debug!("Contact frame broadcaster started");

                while !ctx.is_shutdown() {
                    broadcast_contact_frames(&ctx, publisher.as_ref());
                    thread::sleep(period);
                }

                debug!("Contact frame broadcaster stopped");
            })?;

        Ok(Self { handle })
    }

    /// Wait for the broadcaster to stop. The context must already be shut down.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::tactile::{self, ActivationMask};
    use comms_if::eqpt::{hand::HAND_JOINT_ID, tactile::TactileArray};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingPub {
        msgs: Mutex<Vec<TactileContactFrames>>,
    }

    impl ContactFramePub for RecordingPub {
        fn publish(&self, frames: &TactileContactFrames) {
            self.msgs.lock().push(frames.clone());
        }
    }

    fn ctx() -> Arc<HandCtx> {
        Arc::new(HandCtx::new(HAND_JOINT_ID, tactile::Params::default()))
    }

    #[test]
    fn test_set_ignore_response() {
        let ctx = ctx();
        for flag in [false, false, true, true].iter() {
            let resp = set_ignore_tactile_state(&ctx, *flag);
            assert!(resp.success);
            assert_eq!(resp.message, "Flag set correctly");
            assert_eq!(ctx.is_ignoring_tactile(), *flag);
        }
    }

    #[test]
    fn test_reset_clears_contacts() {
        let ctx = ctx();
        set_ignore_tactile_state(&ctx, false);
        ctx.on_tactile(&TactileArray {
            finger1: vec![0.0; 24],
            finger2: vec![2.0; 24],
            finger3: vec![0.0; 24],
            palm: vec![0.0; 24],
        });
        assert!(!ctx.contact_frames().is_empty());

        reset_tactile_state(&ctx);
        reset_tactile_state(&ctx);
        assert!(ctx.contact_frames().is_empty());
        assert_eq!(ctx.mask(), ActivationMask::all_active());
    }

    #[test]
    fn test_broadcaster_lifecycle() {
        let ctx = ctx();
        let publisher = Arc::new(RecordingPub::default());

        set_ignore_tactile_state(&ctx, false);
        let mut r = TactileArray {
            finger1: vec![0.0; 24],
            finger2: vec![0.0; 24],
            finger3: vec![0.0; 24],
            palm: vec![0.0; 24],
        };
        r.finger3[7] = 1.0;
        ctx.on_tactile(&r);

        let bc = ContactBroadcaster::spawn(
            ctx.clone(),
            publisher.clone(),
            Duration::from_millis(5),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(60));
        ctx.request_shutdown();
        bc.join().unwrap();

        let msgs = publisher.msgs.lock();
        assert!(msgs.len() >= 2);

        // Unconditional on change, every message carries the full set
        for m in msgs.iter() {
            assert_eq!(m.tactile_frames, vec!["bh_finger_3_tactile_07_link".to_string()]);
        }
    }
}

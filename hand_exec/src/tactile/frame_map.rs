//! Taxel to contact frame name mapping

use super::Finger;

/// Name of the frame attached to the given taxel of a finger pad.
pub fn taxel_frame_name(finger: Finger, taxel: usize) -> String {
    format!("bh_finger_{}_tactile_{:02}_link", finger.number(), taxel)
}

//! Parameters structure for the tactile fusion engine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for tactile fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// A taxel whose baselined reading is strictly greater than this value
    /// registers a contact.
    ///
    /// Units: normalised pressure
    pub contact_threshold: f64,

    /// Number of taxels on each finger pad and on the palm. Used to size the
    /// baseline before the first reset.
    pub num_taxels: usize,

    /// Initial value of the ignore flag. When true tactile readings are
    /// discarded until a client enables tactile safety.
    pub ignore_by_default: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            contact_threshold: 0.7,
            num_taxels: 24,
            ignore_by_default: true,
        }
    }
}

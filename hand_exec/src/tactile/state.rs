//! Tactile fusion state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};

// Internal
use super::{taxel_frame_name, ActivationMask, ContactFrameSet, Finger, Params};
use comms_if::eqpt::tactile::TactileArray;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tactile fusion engine.
///
/// Baselines raw taxel readings and registers contacts. A contact on a finger
/// disables that finger's DOF in the activation mask until the next reset.
#[derive(Debug, Clone)]
pub struct TactileFusion {
    params: Params,

    /// Per-taxel offsets subtracted from every reading
    baseline: TactileArray,

    mask: ActivationMask,

    contact_frames: ContactFrameSet,

    /// While set all readings are discarded
    ignore: bool,
}

/// Summary of what a single reading changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusionReport {
    /// True if the reading was discarded (empty or ignoring)
    pub discarded: bool,

    /// Fingers which registered a contact in this reading
    pub contacted: Vec<Finger>,

    /// Fingers whose DOF was disabled by this reading
    pub newly_disabled: Vec<Finger>,

    /// Number of frames added to the contact set by this reading
    pub num_new_frames: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TactileFusion {
    pub fn new(params: Params) -> Self {
        let baseline = zero_baseline(params.num_taxels);
        let ignore = params.ignore_by_default;

        Self {
            params,
            baseline,
            mask: ActivationMask::all_active(),
            contact_frames: ContactFrameSet::default(),
            ignore,
        }
    }

    /// Process a raw tactile reading.
    ///
    /// Empty readings, and all readings while ignoring, are discarded without
    /// any change of state.
    pub fn proc(&mut self, reading: &TactileArray) -> FusionReport {
        if self.ignore || reading.is_empty() {
            return FusionReport {
                discarded: true,
                ..Default::default()
            };
        }

        let mut report = FusionReport::default();

        for finger in Finger::ALL.iter() {
            let raw = finger_taxels(reading, *finger);
            let base = finger_taxels(&self.baseline, *finger);

            let mut contact = false;

            for (taxel, value) in raw.iter().enumerate() {
                // Baseline entries past the end of the stored baseline count as zero
                let offset = base.get(taxel).copied().unwrap_or(0.0);

                if value - offset > self.params.contact_threshold {
                    contact = true;
                    if self.contact_frames.insert(taxel_frame_name(*finger, taxel)) {
                        report.num_new_frames += 1;
                    }
                }
            }

            if contact {
                report.contacted.push(*finger);

                if self.mask.is_active(finger.dof_index()) {
                    self.mask.disable(finger.dof_index());
                    report.newly_disabled.push(*finger);
                    info!("Contact on {:?}, DOF {} disabled", finger, finger.dof_index());
                }
            }
        }

        report
    }

    /// Rezero the sensors against the given snapshot and re-enable every DOF.
    ///
    /// With no snapshot (or an empty one) the baseline returns to zero.
    pub fn reset(&mut self, snapshot: Option<&TactileArray>) {
        self.baseline = match snapshot {
            Some(s) if !s.is_empty() => s.clone(),
            _ => zero_baseline(self.params.num_taxels),
        };
        self.mask = ActivationMask::all_active();
        self.contact_frames = ContactFrameSet::default();

        debug!("Tactile state reset");
    }

    pub fn set_ignore(&mut self, ignore: bool) {
        self.ignore = ignore;
    }

    pub fn is_ignoring(&self) -> bool {
        self.ignore
    }

    pub fn mask(&self) -> ActivationMask {
        self.mask
    }

    pub fn contact_frames(&self) -> &ContactFrameSet {
        &self.contact_frames
    }

    pub fn baseline(&self) -> &TactileArray {
        &self.baseline
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn finger_taxels(array: &TactileArray, finger: Finger) -> &[f64] {
    match finger {
        Finger::F1 => &array.finger1,
        Finger::F2 => &array.finger2,
        Finger::F3 => &array.finger3,
    }
}

fn zero_baseline(num_taxels: usize) -> TactileArray {
    TactileArray {
        finger1: vec![0.0; num_taxels],
        finger2: vec![0.0; num_taxels],
        finger3: vec![0.0; num_taxels],
        palm: vec![0.0; num_taxels],
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

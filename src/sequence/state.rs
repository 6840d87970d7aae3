//! Sequencer state and lifecycle phase.

use serde::Serialize;

use crate::sample::SampleId;

/// Lifecycle phase derived from the sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Not homed since startup, nothing positioned
    Uninitialized,
    /// Homed, no current sample
    Ready,
    /// Sitting on a sample slot
    Positioned,
    /// `advance` ran past the last slot
    Complete,
}

/// Process-lifetime sequencing state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequencerState {
    /// Slot the stage was last positioned on.
    pub current_sample: Option<SampleId>,
    /// Set by a successful homing run.
    pub initialized: bool,
    /// Set when `advance` finds the sequence exhausted.
    pub complete: bool,
}

impl SequencerState {
    /// Phase implied by the flags.
    pub fn phase(&self) -> Phase {
        match (self.current_sample, self.initialized, self.complete) {
            (Some(_), _, true) => Phase::Complete,
            (Some(_), _, false) => Phase::Positioned,
            (None, true, _) => Phase::Ready,
            (None, false, _) => Phase::Uninitialized,
        }
    }

    /// Record arrival at a slot.
    pub(crate) fn position_at(&mut self, sample: SampleId) {
        self.current_sample = Some(sample);
        self.complete = false;
    }

    /// Forget the current slot ahead of homing.
    pub(crate) fn clear(&mut self) {
        self.current_sample = None;
        self.initialized = false;
        self.complete = false;
    }
}

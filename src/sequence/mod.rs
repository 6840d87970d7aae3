//! Sequence module for microscope-stage.
//!
//! Tracks the current sample and walks the canonical LPF/HPF acquisition
//! order on top of the drive engine.

mod sequencer;
mod state;

pub use sequencer::{Advance, Configured, FocusDirection, Sequencer, Synced};
pub use state::{Phase, SequencerState};

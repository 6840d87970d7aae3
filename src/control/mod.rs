//! Control module for microscope-stage.
//!
//! Thread-safe request handlers over the sequencer, and the request/response
//! types exchanged with a transport.

mod controller;
mod protocol;

pub use controller::StageController;
pub use protocol::{
    AdvanceOutcome, CompletionReport, ConfigurationReport, ConfigurationSummary, Failure,
    PositionReport, Report, Request, Response, SampleReport, StatusReport,
};

//! Sample module for microscope-stage.
//!
//! Provides sample identifiers, the canonical acquisition order, and the
//! read-only position registry.

mod id;
mod registry;

pub use id::{FieldType, SampleId, SampleKey, SAMPLES_PER_FIELD, TOTAL_SAMPLES};
pub use registry::SampleRegistry;

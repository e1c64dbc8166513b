//! The segment-driven dubbing pipeline.
//!
//! [`DubbingController`] drives the two-phase job state machine: an analysis
//! phase (acquire, extract, segment, transcribe, translate) and a finalize
//! phase (synthesize, reconstruct, mux). Review-mode jobs suspend between
//! the phases at `AwaitingReview`; direct-mode jobs auto-approve their own
//! translations and run straight through.

pub mod config;
pub mod controller;
pub mod error;
pub mod segments;
pub mod source;

pub use config::DubbingConfig;
pub use controller::{DubbingController, Services, StartOutcome};
pub use error::{PipelineError, PipelineResult};
pub use source::VideoSource;

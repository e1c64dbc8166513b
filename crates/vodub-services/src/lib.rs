//! External collaborator interfaces for the dubbing pipeline.
//!
//! Transcription, translation and speech synthesis are black-box services
//! behind narrow async traits. The controller never knows whether a call is
//! local or networked, only that it may suspend and may fail; every adapter
//! enforces its own timeout and surfaces failures as ordinary errors.

pub mod config;
pub mod error;
pub mod synthesize;
pub mod transcribe;
pub mod translate;

pub use config::ServicesConfig;
pub use error::{ServiceError, ServiceResult};
pub use synthesize::{HttpSynthesizer, SpeechSynthesizer, Voice, VoiceCatalog, VoiceGender};
pub use transcribe::{HttpTranscriber, TranscriptionService};
pub use translate::{HttpTranslator, TranslationService};

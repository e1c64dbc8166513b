//! Filesystem persistence for dubbing jobs.
//!
//! Each job owns a private working area (its [`JobArena`]): the original
//! video, the extracted master audio, per-segment chunks, synthesized clips
//! and the combined track all live under one directory keyed by job id. The
//! job record itself is `manifest.json` inside that directory and survives
//! process restarts between the analysis phase and the finalize call.

pub mod arena;
pub mod error;
pub mod store;

pub use arena::{chunk_wav_name, tts_chunk_name, JobArena};
pub use error::{StoreError, StoreResult};
pub use store::{is_final_video_filename, JobStore};

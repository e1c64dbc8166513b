//! FFmpeg CLI wrapper for the dubbing pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and execution
//! - ffprobe media inspection
//! - Audio extraction and segment slicing
//! - Amplitude-based silence segmentation
//! - PCM timeline reconstruction (silence gaps + synthesized clips)
//! - Audio/video remuxing
//! - Remote video download via yt-dlp

pub mod command;
pub mod download;
pub mod error;
pub mod extract;
pub mod mux;
pub mod probe;
pub mod silence;
pub mod timeline;

pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use download::download_video;
pub use error::{MediaError, MediaResult};
pub use extract::{extract_audio, slice_clip, PIPELINE_SAMPLE_RATE};
pub use mux::replace_audio;
pub use probe::{probe_media, MediaInfo};
pub use silence::{detect_speech_ranges, segment_audio_file, SilenceConfig, SpeechRange};
pub use timeline::Timeline;

//! Segment model: one detected interval of speech in the source audio.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One detected speech interval, with its own transcription / translation /
/// synthesis lifecycle.
///
/// Timing fields are fixed at segmentation and never change afterwards. Text
/// fields are enriched during analysis; `translated_text` is the only field a
/// reviewer may replace. Text is always a concrete string in persisted form,
/// empty when the corresponding step failed or produced nothing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// 0-based position in the timeline. Stable identity key for review edits.
    pub index: usize,

    /// Interval start in the original audio track (milliseconds).
    pub start_ms: u64,

    /// Interval end in the original audio track (milliseconds).
    pub end_ms: u64,

    /// Gap between this segment's start and the previous segment's end
    /// (track start for the first segment).
    pub silence_before_ms: u64,

    /// File name of the exported chunk inside the job's chunks directory,
    /// e.g. `chunk_3.wav`. Empty when the export failed.
    pub original_audio_chunk_ref: String,

    /// Transcription result. Empty when transcription failed or heard nothing.
    #[serde(default)]
    pub transcribed_text: String,

    /// Translation result. In review mode a reviewer edit supersedes this
    /// at synthesis time.
    #[serde(default)]
    pub translated_text: String,

    /// Human-readable transcription outcome. Diagnostic only.
    #[serde(default)]
    pub transcription_status: String,

    /// Human-readable translation outcome. Diagnostic only.
    #[serde(default)]
    pub translation_status: String,

    /// File name of the synthesized clip, present only after a successful
    /// synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesized_audio_ref: Option<String>,
}

impl Segment {
    /// Create a segment straight out of the silence segmenter, before any
    /// transcription has run.
    pub fn detected(index: usize, start_ms: u64, end_ms: u64, silence_before_ms: u64) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
            silence_before_ms,
            original_audio_chunk_ref: String::new(),
            transcribed_text: String::new(),
            translated_text: String::new(),
            transcription_status: String::new(),
            translation_status: String::new(),
            synthesized_audio_ref: None,
        }
    }

    /// Duration of the original speech interval in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Whether the chunk export succeeded for this segment.
    pub fn has_chunk(&self) -> bool {
        !self.original_audio_chunk_ref.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_segment_is_empty() {
        let seg = Segment::detected(2, 1000, 4000, 500);
        assert_eq!(seg.duration_ms(), 3000);
        assert!(seg.transcribed_text.is_empty());
        assert!(seg.synthesized_audio_ref.is_none());
        assert!(!seg.has_chunk());
    }

    #[test]
    fn test_serde_defaults_for_missing_text() {
        // A manifest written before synthesis carries no synthesized ref and
        // may omit empty text fields.
        let json = r#"{
            "index": 0,
            "start_ms": 0,
            "end_ms": 1200,
            "silence_before_ms": 0,
            "original_audio_chunk_ref": "chunk_0.wav"
        }"#;
        let seg: Segment = serde_json::from_str(json).unwrap();
        assert_eq!(seg.transcribed_text, "");
        assert_eq!(seg.translated_text, "");
        assert!(seg.synthesized_audio_ref.is_none());
    }
}

//! Shared data models for the vodub dubbing backend.
//!
//! The [`Job`] struct is the durable contract between the analysis phase and
//! the finalize phase: it is what the store persists as `manifest.json` and
//! what the API returns as review data.

pub mod job;
pub mod locale;
pub mod segment;

pub use job::{Job, JobId, JobIdError, JobMode, JobPhase, JobStatus, VoicePreference};
pub use locale::TargetLocale;
pub use segment::Segment;

/// Replace every character outside `[A-Za-z0-9_.-]` with an underscore and
/// strip leading dots. Used for job ids and user-supplied file names so they
/// can never escape their directory.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    // A name of only separators/dots collapses to something usable.
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_name("my_video-1.mp4"), "my_video-1.mp4");
    }

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_name("a/b\\c d"), "a_b_c_d");
    }

    #[test]
    fn test_sanitize_strips_leading_dots() {
        assert_eq!(sanitize_name("../../etc/passwd"), "_.._etc_passwd");
        assert!(!sanitize_name("..").starts_with('.'));
    }

    #[test]
    fn test_sanitize_empty() {
        assert_eq!(sanitize_name(""), "unnamed");
    }
}

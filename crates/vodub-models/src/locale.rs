//! Target language configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The language/region pair a job dubs into.
///
/// `language` is the translation target (ISO 639-1), `tag` the BCP 47 tag
/// used for voice selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TargetLocale {
    pub language: String,
    pub tag: String,
}

impl TargetLocale {
    pub fn new(language: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            tag: tag.into(),
        }
    }
}

impl Default for TargetLocale {
    fn default() -> Self {
        Self::new("ta", "ta-IN")
    }
}

impl std::fmt::Display for TargetLocale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag)
    }
}

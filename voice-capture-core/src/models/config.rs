use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stable logical identifier for a session participant.
///
/// Distinct from the transient synchronization-source id (`ssrc: u32`)
/// carried in packet headers; the two are bridged by
/// [`VoiceSource::lookup_speaker`](crate::traits::voice_source::VoiceSource).
pub type SpeakerId = u64;

/// Session-wide stop and admission rules, fixed at session creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Speakers whose packets are admitted. Empty = allow all.
    #[serde(default)]
    pub allowed_speakers: HashSet<SpeakerId>,

    /// Recording time budget in seconds. 0 = unlimited.
    #[serde(default)]
    pub time_budget_secs: u64,

    /// Total admitted-byte budget across all speakers. 0 = unlimited.
    #[serde(default)]
    pub byte_budget: u64,
}

/// Configuration for a capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Directory where per-speaker recording files are written.
    pub output_directory: PathBuf,

    /// Extension used while a stream is still being written (default: "pcm").
    /// The format hook may rename it after finalization.
    #[serde(default = "default_interim_extension")]
    pub interim_extension: String,

    #[serde(default)]
    pub filters: FilterConfig,
}

fn default_interim_extension() -> String {
    "pcm".to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            interim_extension: default_interim_extension(),
            filters: FilterConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_config_defaults_are_unlimited() {
        let config = FilterConfig::default();
        assert!(config.allowed_speakers.is_empty());
        assert_eq!(config.time_budget_secs, 0);
        assert_eq!(config.byte_budget, 0);
    }

    #[test]
    fn capture_config_roundtrips_through_json() {
        let config = CaptureConfig {
            output_directory: PathBuf::from("/tmp/recordings"),
            interim_extension: "pcm".into(),
            filters: FilterConfig {
                allowed_speakers: HashSet::from([42, 77]),
                time_budget_secs: 30,
                byte_budget: 1024,
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: CaptureConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let back: CaptureConfig =
            serde_json::from_str(r#"{"output_directory": "/tmp/out"}"#).unwrap();
        assert_eq!(back.interim_extension, "pcm");
        assert_eq!(back.filters, FilterConfig::default());
    }
}

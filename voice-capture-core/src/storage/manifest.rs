use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::config::SpeakerId;
use crate::models::error::CaptureError;
use crate::models::outcome::FinalizedStream;

/// JSON sidecar describing a completed capture session.
///
/// Written as `session_<id>.manifest.json` in the output directory once the
/// session has finalized all of its streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionManifest {
    pub id: String,
    /// Negotiated decryption mode the session ran with.
    pub mode: String,
    pub created_at: String,
    pub stopped_at: String,
    pub streams: Vec<ManifestStream>,
}

/// One finalized per-speaker file in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestStream {
    pub speaker_id: SpeakerId,
    pub ssrc: u32,
    pub file_path: String,
    pub bytes_written: u64,
    pub checksum: String,
}

impl SessionManifest {
    pub fn new(id: &str, mode: &str, created_at: &str, finalized: &[FinalizedStream]) -> Self {
        Self {
            id: id.to_string(),
            mode: mode.to_string(),
            created_at: created_at.to_string(),
            stopped_at: chrono::Utc::now().to_rfc3339(),
            streams: finalized
                .iter()
                .map(|s| ManifestStream {
                    speaker_id: s.speaker_id,
                    ssrc: s.ssrc,
                    file_path: s.path.to_string_lossy().into_owned(),
                    bytes_written: s.bytes_written,
                    checksum: s.checksum.clone(),
                })
                .collect(),
        }
    }

    /// Path of this manifest's sidecar under `output_directory`.
    pub fn sidecar_path(&self, output_directory: &Path) -> PathBuf {
        output_directory.join(format!("session_{}.manifest.json", self.id))
    }
}

/// Write the manifest sidecar next to the recording files.
pub fn write_manifest(
    manifest: &SessionManifest,
    output_directory: &Path,
) -> Result<PathBuf, CaptureError> {
    let path = manifest.sidecar_path(output_directory);
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| CaptureError::Storage(format!("failed to serialize manifest: {}", e)))?;
    fs::write(&path, json)
        .map_err(|e| CaptureError::Storage(format!("failed to write manifest: {}", e)))?;
    Ok(path)
}

/// Read a manifest sidecar back.
pub fn read_manifest(path: &Path) -> Result<SessionManifest, CaptureError> {
    let json = fs::read_to_string(path)
        .map_err(|e| CaptureError::Storage(format!("failed to read manifest: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| CaptureError::Storage(format!("failed to parse manifest: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_roundtrips_through_sidecar() {
        let dir = std::env::temp_dir();
        let finalized = vec![FinalizedStream {
            speaker_id: 7,
            ssrc: 12345,
            path: dir.join("12345.pcm"),
            bytes_written: 42,
            checksum: "deadbeef".into(),
        }];

        let manifest = SessionManifest::new(
            "manifest-roundtrip-test",
            "aead_aes256_gcm",
            "2026-01-01T00:00:00+00:00",
            &finalized,
        );

        let path = write_manifest(&manifest, &dir).unwrap();
        let back = read_manifest(&path).unwrap();
        assert_eq!(back, manifest);
        assert_eq!(back.streams.len(), 1);
        assert_eq!(back.streams[0].ssrc, 12345);

        fs::remove_file(&path).ok();
    }
}

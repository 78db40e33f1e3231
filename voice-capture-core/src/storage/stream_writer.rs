use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::config::SpeakerId;
use crate::models::error::CaptureError;
use crate::models::state::StreamState;

/// Append-only recording file for one speaker.
///
/// Created lazily on the speaker's first admitted packet and owned
/// exclusively by the capture session, which is its sole mutator.
///
/// Lifecycle: `open` → any number of `write`s → `finalize` (exactly once,
/// irreversible) → optionally `rename_for_format` by the reformat hook.
pub struct StreamWriter {
    speaker_id: SpeakerId,
    ssrc: u32,
    path: PathBuf,
    file: Option<File>,
    state: StreamState,
    bytes_written: u64,
}

impl StreamWriter {
    /// Open (create or append to) the recording file at `path`.
    pub fn open(speaker_id: SpeakerId, ssrc: u32, path: PathBuf) -> Result<Self, CaptureError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::Storage(format!("failed to create directory: {}", e)))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CaptureError::Storage(format!("failed to open file: {}", e)))?;

        Ok(Self {
            speaker_id,
            ssrc,
            path,
            file: Some(file),
            state: StreamState::Writing,
            bytes_written: 0,
        })
    }

    /// Append decoded audio bytes.
    ///
    /// Transient I/O faults come back as [`CaptureError::Storage`]; the
    /// session decides whether to continue (it does — see
    /// [`CaptureSession::on_packet`](crate::session::capture::CaptureSession::on_packet)).
    pub fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        if self.state.is_finalized() {
            return Err(CaptureError::AlreadyFinalized);
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::Storage("file handle missing".into()))?;
        file.write_all(data)
            .map_err(|e| CaptureError::Storage(format!("write failed: {}", e)))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Close the file and transition to finalized.
    ///
    /// Returns the SHA-256 hex digest of the completed file. Fails with
    /// [`CaptureError::AlreadyFinalized`] on a second call; the handle is
    /// never closed twice.
    pub fn finalize(&mut self) -> Result<String, CaptureError> {
        if self.state.is_finalized() {
            return Err(CaptureError::AlreadyFinalized);
        }

        if let Some(mut file) = self.file.take() {
            file.flush()
                .map_err(|e| CaptureError::Storage(format!("flush failed: {}", e)))?;
        }
        self.state = StreamState::Finalized;

        sha256_file(&self.path)
    }

    /// Swap the file's extension for the target format's, preserving
    /// directory and base name.
    ///
    /// Only legal after [`finalize`](Self::finalize); fails with
    /// [`CaptureError::StillWriting`] otherwise.
    pub fn rename_for_format(&mut self, extension: &str) -> Result<PathBuf, CaptureError> {
        if !self.state.is_finalized() {
            return Err(CaptureError::StillWriting);
        }

        let target = self.path.with_extension(extension);
        fs::rename(&self.path, &target)
            .map_err(|e| CaptureError::Storage(format!("rename failed: {}", e)))?;
        self.path = target.clone();
        Ok(target)
    }

    pub fn speaker_id(&self) -> SpeakerId {
        self.speaker_id
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data = fs::read(path)
        .map_err(|e| CaptureError::Storage(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("voice_capture_test_{}", name))
    }

    #[test]
    fn writes_append_in_order() {
        let path = temp_file_path("append.pcm");
        fs::remove_file(&path).ok();

        let mut writer = StreamWriter::open(1, 100, path.clone()).unwrap();
        writer.write(b"aaa").unwrap();
        writer.write(b"bbb").unwrap();
        assert_eq!(writer.bytes_written(), 6);

        writer.finalize().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"aaabbb");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn write_after_finalize_fails_and_leaves_file_untouched() {
        let path = temp_file_path("sealed.pcm");
        fs::remove_file(&path).ok();

        let mut writer = StreamWriter::open(1, 100, path.clone()).unwrap();
        writer.write(b"data").unwrap();
        writer.finalize().unwrap();

        let err = writer.write(b"more").unwrap_err();
        assert_eq!(err, CaptureError::AlreadyFinalized);
        assert_eq!(fs::read(&path).unwrap(), b"data");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn finalize_twice_fails() {
        let path = temp_file_path("double.pcm");
        fs::remove_file(&path).ok();

        let mut writer = StreamWriter::open(1, 100, path.clone()).unwrap();
        writer.finalize().unwrap();
        assert_eq!(writer.finalize().unwrap_err(), CaptureError::AlreadyFinalized);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn rename_before_finalize_fails() {
        let path = temp_file_path("early.pcm");
        fs::remove_file(&path).ok();

        let mut writer = StreamWriter::open(1, 100, path.clone()).unwrap();
        assert_eq!(
            writer.rename_for_format("wav").unwrap_err(),
            CaptureError::StillWriting
        );
        assert!(writer.path().exists());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn rename_preserves_directory_and_stem() {
        let path = temp_file_path("12345.pcm");
        fs::remove_file(&path).ok();
        fs::remove_file(temp_file_path("12345.wav")).ok();

        let mut writer = StreamWriter::open(1, 12345, path.clone()).unwrap();
        writer.write(b"pcm data").unwrap();
        writer.finalize().unwrap();

        let renamed = writer.rename_for_format("wav").unwrap();
        assert_eq!(renamed, path.with_extension("wav"));
        assert!(!path.exists());
        assert_eq!(fs::read(&renamed).unwrap(), b"pcm data");

        fs::remove_file(&renamed).ok();
    }

    #[test]
    fn finalize_checksum_matches_contents() {
        let path = temp_file_path("digest.pcm");
        fs::remove_file(&path).ok();

        let mut writer = StreamWriter::open(1, 100, path.clone()).unwrap();
        writer.write(b"abc").unwrap();
        let checksum = writer.finalize().unwrap();

        // Well-known SHA-256 of "abc".
        assert_eq!(
            checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        fs::remove_file(&path).ok();
    }

    #[test]
    fn reopening_appends_to_existing_file() {
        let path = temp_file_path("reopen.pcm");
        fs::remove_file(&path).ok();

        let mut first = StreamWriter::open(1, 100, path.clone()).unwrap();
        first.write(b"one").unwrap();
        first.finalize().unwrap();

        let mut second = StreamWriter::open(1, 100, path.clone()).unwrap();
        second.write(b"two").unwrap();
        second.finalize().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"onetwo");

        fs::remove_file(&path).ok();
    }
}

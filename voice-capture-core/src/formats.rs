//! Built-in reformat hooks.

use crate::models::error::CaptureError;
use crate::storage::stream_writer::StreamWriter;
use crate::traits::formatter::StreamFormatter;

/// Rename-only formatter: swaps the interim extension for the target
/// encoding's without touching the audio bytes.
///
/// Suitable when the interim data already is the target encoding (raw PCM
/// dumps, pre-encoded Opus frames). Transcoding formatters live with the
/// encoder they wrap and implement [`StreamFormatter`] the same way.
pub struct ExtensionFormatter {
    encoding: String,
}

impl ExtensionFormatter {
    pub fn new(encoding: &str) -> Self {
        Self {
            encoding: encoding.to_string(),
        }
    }
}

impl StreamFormatter for ExtensionFormatter {
    fn encoding(&self) -> &str {
        &self.encoding
    }

    fn format(&self, writer: &mut StreamWriter) -> Result<(), CaptureError> {
        writer.rename_for_format(&self.encoding).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn renames_only_after_finalize() {
        let path = std::env::temp_dir().join("voice_capture_test_fmt.pcm");
        fs::remove_file(&path).ok();
        fs::remove_file(path.with_extension("wav")).ok();

        let formatter = ExtensionFormatter::new("wav");
        let mut writer = StreamWriter::open(1, 100, path.clone()).unwrap();
        writer.write(b"data").unwrap();

        assert_eq!(
            formatter.format(&mut writer).unwrap_err(),
            CaptureError::StillWriting
        );

        writer.finalize().unwrap();
        formatter.format(&mut writer).unwrap();
        assert_eq!(writer.path(), path.with_extension("wav"));

        fs::remove_file(path.with_extension("wav")).ok();
    }
}

use crate::models::error::CaptureError;
use crate::storage::stream_writer::StreamWriter;

/// Post-finalize reformat hook, invoked once per finalized stream.
///
/// Selected by target encoding name at session construction rather than by
/// subclassing; the session invokes it uniformly without knowing about
/// specific formats. Implementations may transcode externally and then
/// rename via [`StreamWriter::rename_for_format`], or rename only
/// (see [`ExtensionFormatter`](crate::formats::ExtensionFormatter)).
pub trait StreamFormatter: Send + Sync {
    /// Target encoding name (e.g. "wav", "mp3").
    fn encoding(&self) -> &str;

    /// Reformat one finalized stream. The writer is guaranteed finalized.
    fn format(&self, writer: &mut StreamWriter) -> Result<(), CaptureError>;
}

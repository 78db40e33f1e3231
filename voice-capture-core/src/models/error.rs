use thiserror::Error;

/// Errors that can occur while capturing a voice session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The raw payload is too short to contain the 12-byte voice header.
    #[error("malformed packet: {len} bytes, need at least 12")]
    MalformedPacket { len: usize },

    /// The negotiated-mode decryptor rejected the packet.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Write or finalize was attempted on an already finalized stream.
    #[error("stream is already finalized")]
    AlreadyFinalized,

    /// A finalized-only operation was attempted while the stream is writing.
    #[error("stream is still writing")]
    StillWriting,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("format hook failed: {0}")]
    Format(String),
}

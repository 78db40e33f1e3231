use std::path::PathBuf;

use super::config::SpeakerId;
use super::error::CaptureError;

/// Why a packet was not written to a stream.
///
/// Per-packet drops never abort the session; they are logged, reported to the
/// delegate, and surfaced here so admission behavior stays testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The session has already transitioned to stopped.
    SessionStopped,
    /// Payload shorter than the 12-byte header.
    Malformed,
    /// The negotiated-mode decryptor rejected the packet.
    DecryptionFailed,
    /// The voice client could not map the packet's ssrc to a speaker.
    UnknownSpeaker,
    /// The speaker is not on the allow-list.
    SpeakerNotAllowed,
    /// The session-wide byte budget is exhausted.
    ByteBudgetExhausted,
    /// The destination write faulted; the session continues.
    WriteFault,
}

/// Result of routing one raw packet through the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    Written { speaker_id: SpeakerId, bytes: usize },
    Dropped(DropReason),
}

impl PacketOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// One successfully finalized per-speaker stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedStream {
    pub speaker_id: SpeakerId,
    pub ssrc: u32,
    pub path: PathBuf,
    pub bytes_written: u64,
    /// SHA-256 hex digest of the completed file.
    pub checksum: String,
}

/// A stream whose finalize or format step failed during stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFailure {
    pub speaker_id: SpeakerId,
    pub error: CaptureError,
}

/// Batch result of stopping a session.
///
/// Finalize failures are collected here rather than short-circuiting: every
/// owned stream gets exactly one finalize attempt. A second `stop` call
/// returns an empty summary with `already_stopped` set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopSummary {
    pub finalized: Vec<FinalizedStream>,
    pub failures: Vec<StreamFailure>,
    pub already_stopped: bool,
}

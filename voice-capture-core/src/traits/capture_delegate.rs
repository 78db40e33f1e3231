use std::path::Path;

use crate::models::config::SpeakerId;
use crate::models::error::CaptureError;
use crate::models::outcome::{DropReason, StopSummary};

/// Event delegate for capture session notifications.
///
/// Methods may be called from the packet-admission path or from the
/// filter-policy watchdog thread; implementations must be cheap and must not
/// call back into the session.
///
/// The session deliberately keeps recording through dropped packets and
/// write faults; this delegate is what makes that policy observable.
pub trait CaptureDelegate: Send + Sync {
    /// Called for every packet that is not written to a stream.
    fn on_packet_dropped(&self, reason: &DropReason);

    /// Called when a stream write faults and is swallowed.
    fn on_write_fault(&self, speaker_id: SpeakerId, error: &CaptureError);

    /// Called once per stream after it is finalized.
    fn on_stream_finalized(&self, speaker_id: SpeakerId, path: &Path);

    /// Called once when the session completes its stop transition.
    fn on_session_stopped(&self, summary: &StopSummary);
}

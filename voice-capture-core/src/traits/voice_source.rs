use crate::models::config::SpeakerId;

/// Interface to the external voice-session client.
///
/// Supplies the ssrc→speaker mapping and the listen control. The capture
/// session never owns the transport; it only consumes raw payloads handed to
/// [`CaptureSession::on_packet`](crate::session::capture::CaptureSession::on_packet)
/// and calls back into this trait.
pub trait VoiceSource: Send + Sync {
    /// Resolve a packet's synchronization-source id to a speaker.
    ///
    /// Returns `None` while the client has not yet learned the mapping
    /// (e.g. before the first speaking notification); such packets are
    /// dropped.
    fn lookup_speaker(&self, ssrc: u32) -> Option<SpeakerId>;

    /// Ask the client to stop delivering packets.
    ///
    /// Invoked when the filter-policy time budget elapses, before the
    /// session finalizes its streams.
    fn stop_listening(&self);
}

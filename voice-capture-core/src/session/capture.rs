use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{CaptureConfig, SpeakerId};
use crate::models::outcome::{DropReason, FinalizedStream, PacketOutcome, StopSummary, StreamFailure};
use crate::models::state::SessionState;
use crate::protocol::packet::RawPacket;
use crate::session::filters::FilterPolicy;
use crate::storage::manifest::{self, SessionManifest};
use crate::storage::stream_writer::StreamWriter;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::decryptor::PacketDecryptor;
use crate::traits::formatter::StreamFormatter;
use crate::traits::voice_source::VoiceSource;

/// State shared with the filter-policy watchdog thread.
struct SharedState {
    /// Stop latch. Compare-and-swap guarded so the explicit stop call and
    /// the watchdog race to a single winner; the loser observes a no-op.
    stopped: AtomicBool,

    /// Speaker → writer mapping, created lazily on first admitted packet.
    /// Locked only by the sequential admission path and the stop winner.
    streams: Mutex<HashMap<SpeakerId, StreamWriter>>,

    /// Result of the winning stop, for later enumeration.
    summary: Mutex<Option<StopSummary>>,

    /// Hooks live here rather than on the session so the explicit stop call
    /// and the watchdog resolve the same, current values no matter when
    /// they were set.
    delegate: Mutex<Option<Arc<dyn CaptureDelegate>>>,
    formatter: Mutex<Option<Arc<dyn StreamFormatter>>>,
}

/// Everything the stop routine needs besides the shared state, owned by
/// value so the watchdog closure can carry its own copy.
#[derive(Clone)]
struct StopContext {
    output_directory: PathBuf,
    session_id: String,
    mode: String,
    created_at: String,
}

/// One recording session: decodes multiplexed voice packets, demultiplexes
/// them into per-speaker [`StreamWriter`]s under the [`FilterPolicy`]'s
/// admission rules, and drives the finalize-all sequence at session end.
///
/// Packet admission is sequential (packets arrive one at a time from the
/// upstream transport); the only concurrent actor is the time-budget
/// watchdog, and both termination triggers route through the same
/// idempotent stop.
pub struct CaptureSession {
    config: CaptureConfig,
    decryptor: Box<dyn PacketDecryptor>,
    policy: Arc<FilterPolicy>,
    voice: Option<Arc<dyn VoiceSource>>,
    shared: Arc<SharedState>,
    session_id: String,
    created_at: String,
}

impl CaptureSession {
    pub fn new(config: CaptureConfig, decryptor: Box<dyn PacketDecryptor>) -> Self {
        let policy = Arc::new(FilterPolicy::new(config.filters.clone()));
        Self {
            config,
            decryptor,
            policy,
            voice: None,
            shared: Arc::new(SharedState {
                stopped: AtomicBool::new(false),
                streams: Mutex::new(HashMap::new()),
                summary: Mutex::new(None),
                delegate: Mutex::new(None),
                formatter: Mutex::new(None),
            }),
            session_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        *self.shared.delegate.lock() = Some(delegate);
    }

    /// Select the post-finalize reformat hook for the session's target
    /// encoding. Without one, finalized files keep the interim extension.
    /// May be set before or after [`start`](Self::start); whichever stop
    /// path wins uses the hook current at stop time.
    pub fn set_formatter(&mut self, formatter: Arc<dyn StreamFormatter>) {
        *self.shared.formatter.lock() = Some(formatter);
    }

    /// Bind the external voice client and arm the time-budget watchdog.
    ///
    /// When the budget elapses the watchdog asks the client to stop
    /// listening, then runs the same stop routine an explicit [`stop`]
    /// call would.
    ///
    /// [`stop`]: Self::stop
    pub fn start(&mut self, voice: Arc<dyn VoiceSource>) {
        self.voice = Some(Arc::clone(&voice));

        if let Err(e) = std::fs::create_dir_all(&self.config.output_directory) {
            log::warn!(
                "failed to create output directory {:?}: {}",
                self.config.output_directory,
                e
            );
        }

        log::info!(
            "capture session {} started (mode: {})",
            self.session_id,
            self.decryptor.mode()
        );

        let shared = Arc::clone(&self.shared);
        let policy = Arc::clone(&self.policy);
        let ctx = self.stop_context();

        self.policy.start(move || {
            voice.stop_listening();
            let summary = run_stop(&shared, &policy, &ctx);
            for failure in &summary.failures {
                log::error!(
                    "finalize failed for speaker {}: {}",
                    failure.speaker_id,
                    failure.error
                );
            }
        });
    }

    /// Route one raw network payload through decode, admission, and the
    /// owning speaker's stream.
    ///
    /// No per-packet error ever aborts the session: malformed or
    /// undecryptable packets are dropped (real-time stream, stale data has
    /// no value), and write faults are logged and reported to the delegate
    /// while recording continues. No packets are admitted before [`start`]
    /// binds the voice client, and none after the session stops.
    ///
    /// [`start`]: Self::start
    pub fn on_packet(&self, data: &[u8]) -> PacketOutcome {
        if self.shared.stopped.load(Ordering::SeqCst) {
            return self.drop_packet(DropReason::SessionStopped);
        }

        let packet = match RawPacket::decode(data, self.decryptor.as_ref()) {
            Ok(packet) => packet,
            Err(e) => {
                log::warn!("dropping packet: {}", e);
                let reason = match e {
                    crate::models::error::CaptureError::MalformedPacket { .. } => {
                        DropReason::Malformed
                    }
                    _ => DropReason::DecryptionFailed,
                };
                return self.drop_packet(reason);
            }
        };

        let Some(voice) = self.voice.as_ref() else {
            log::debug!("dropping packet from ssrc {}: no voice client bound", packet.ssrc);
            return self.drop_packet(DropReason::UnknownSpeaker);
        };
        let Some(speaker_id) = voice.lookup_speaker(packet.ssrc) else {
            log::debug!("dropping packet from unmapped ssrc {}", packet.ssrc);
            return self.drop_packet(DropReason::UnknownSpeaker);
        };

        if !self.policy.admit(speaker_id) {
            return self.drop_packet(DropReason::SpeakerNotAllowed);
        }

        let mut streams = self.shared.streams.lock();

        // The stop routine sets the latch before taking the streams lock, so
        // holding the lock with the latch clear guarantees this write lands
        // before finalize begins.
        if self.shared.stopped.load(Ordering::SeqCst) {
            drop(streams);
            return self.drop_packet(DropReason::SessionStopped);
        }

        if !self.policy.admit_bytes(packet.plaintext.len()) {
            drop(streams);
            return self.drop_packet(DropReason::ByteBudgetExhausted);
        }

        let writer = match streams.entry(speaker_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(slot) => {
                let path = self.config.output_directory.join(format!(
                    "{}.{}",
                    packet.ssrc, self.config.interim_extension
                ));
                match StreamWriter::open(speaker_id, packet.ssrc, path) {
                    Ok(writer) => {
                        log::info!(
                            "opened stream for speaker {} (ssrc {}) at {:?}",
                            speaker_id,
                            packet.ssrc,
                            writer.path()
                        );
                        slot.insert(writer)
                    }
                    Err(e) => {
                        log::error!("failed to open stream for speaker {}: {}", speaker_id, e);
                        if let Some(delegate) = self.delegate() {
                            delegate.on_write_fault(speaker_id, &e);
                        }
                        drop(streams);
                        return self.drop_packet(DropReason::WriteFault);
                    }
                }
            }
        };

        match writer.write(&packet.plaintext) {
            Ok(()) => {
                // Budget is charged only for bytes that actually landed.
                self.policy.record_bytes(packet.plaintext.len());
                PacketOutcome::Written {
                    speaker_id,
                    bytes: packet.plaintext.len(),
                }
            }
            Err(e) => {
                // Continuity over completeness: one bad chunk must not end
                // the recording.
                log::warn!("write fault for speaker {}: {}", speaker_id, e);
                if let Some(delegate) = self.delegate() {
                    delegate.on_write_fault(speaker_id, &e);
                }
                drop(streams);
                self.drop_packet(DropReason::WriteFault)
            }
        }
    }

    /// Stop the session and finalize every stream exactly once.
    ///
    /// Idempotent: the first caller (explicit or watchdog) wins the latch
    /// and runs finalize-all; any later caller gets an empty summary with
    /// `already_stopped` set and no side effects. Finalize failures are
    /// collected per stream, never short-circuiting the rest.
    pub fn stop(&self) -> StopSummary {
        run_stop(&self.shared, &self.policy, &self.stop_context())
    }

    pub fn state(&self) -> SessionState {
        if self.shared.stopped.load(Ordering::SeqCst) {
            SessionState::Stopped
        } else {
            SessionState::Active
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Per-speaker finalized files, available once the session has stopped.
    pub fn finalized_files(&self) -> Vec<(SpeakerId, PathBuf)> {
        self.shared
            .summary
            .lock()
            .as_ref()
            .map(|summary| {
                summary
                    .finalized
                    .iter()
                    .map(|s| (s.speaker_id, s.path.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn stop_context(&self) -> StopContext {
        StopContext {
            output_directory: self.config.output_directory.clone(),
            session_id: self.session_id.clone(),
            mode: self.decryptor.mode().to_string(),
            created_at: self.created_at.clone(),
        }
    }

    fn delegate(&self) -> Option<Arc<dyn CaptureDelegate>> {
        self.shared.delegate.lock().clone()
    }

    fn drop_packet(&self, reason: DropReason) -> PacketOutcome {
        if let Some(delegate) = self.delegate() {
            delegate.on_packet_dropped(&reason);
        }
        PacketOutcome::Dropped(reason)
    }
}

/// The single stop path, shared by the explicit call and the watchdog.
fn run_stop(shared: &SharedState, policy: &FilterPolicy, ctx: &StopContext) -> StopSummary {
    if shared
        .stopped
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return StopSummary {
            already_stopped: true,
            ..Default::default()
        };
    }
    policy.mark_finished();

    let delegate = shared.delegate.lock().clone();
    let formatter = shared.formatter.lock().clone();

    let writers: Vec<StreamWriter> = {
        let mut streams = shared.streams.lock();
        streams.drain().map(|(_, writer)| writer).collect()
    };

    log::info!(
        "stopping capture session {}: finalizing {} stream(s)",
        ctx.session_id,
        writers.len()
    );

    let mut summary = StopSummary::default();
    for mut writer in writers {
        let speaker_id = writer.speaker_id();
        match writer.finalize() {
            Ok(checksum) => {
                if let Some(delegate) = delegate.as_deref() {
                    delegate.on_stream_finalized(speaker_id, writer.path());
                }
                if let Some(formatter) = formatter.as_deref() {
                    if let Err(e) = formatter.format(&mut writer) {
                        log::error!(
                            "format hook ({}) failed for speaker {}: {}",
                            formatter.encoding(),
                            speaker_id,
                            e
                        );
                        summary.failures.push(StreamFailure {
                            speaker_id,
                            error: e,
                        });
                    }
                }
                summary.finalized.push(FinalizedStream {
                    speaker_id,
                    ssrc: writer.ssrc(),
                    path: writer.path().to_path_buf(),
                    bytes_written: writer.bytes_written(),
                    checksum,
                });
            }
            Err(e) => {
                log::error!("finalize failed for speaker {}: {}", speaker_id, e);
                summary.failures.push(StreamFailure {
                    speaker_id,
                    error: e,
                });
            }
        }
    }

    let manifest =
        SessionManifest::new(&ctx.session_id, &ctx.mode, &ctx.created_at, &summary.finalized);
    if let Err(e) = manifest::write_manifest(&manifest, &ctx.output_directory) {
        log::warn!("failed to write session manifest: {}", e);
    }

    if let Some(delegate) = delegate {
        delegate.on_session_stopped(&summary);
    }

    *shared.summary.lock() = Some(summary.clone());
    summary
}

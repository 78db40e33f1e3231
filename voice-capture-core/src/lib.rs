//! # voice-capture-core
//!
//! Voice-session capture core library.
//!
//! Ingests a real-time multiplexed, encrypted voice stream, demultiplexes it
//! into per-speaker recordings, and drives the finalize/reformat sequence at
//! session end. The surrounding voice client, the encryption algorithm, and
//! any transcoder implement the seam traits and plug into the generic
//! `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! voice-capture-core (this crate)
//! ├── traits/    ← PacketDecryptor, VoiceSource, StreamFormatter, CaptureDelegate
//! ├── models/    ← CaptureError, SessionState, CaptureConfig, PacketOutcome
//! ├── protocol/  ← RawPacket: 12-byte header parse + decrypt dispatch
//! ├── crypto/    ← Aes256GcmDecryptor (aead_aes256_gcm mode)
//! ├── session/   ← FilterPolicy, CaptureSession (orchestrator)
//! ├── storage/   ← StreamWriter, session manifest sidecar
//! └── formats    ← ExtensionFormatter (rename-only reformat hook)
//! ```

pub mod crypto;
pub mod formats;
pub mod models;
pub mod protocol;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use crypto::Aes256GcmDecryptor;
pub use formats::ExtensionFormatter;
pub use models::config::{CaptureConfig, FilterConfig, SpeakerId};
pub use models::error::CaptureError;
pub use models::outcome::{DropReason, FinalizedStream, PacketOutcome, StopSummary, StreamFailure};
pub use models::state::{SessionState, StreamState};
pub use protocol::packet::{RawPacket, VOICE_HEADER_SIZE};
pub use session::capture::CaptureSession;
pub use session::filters::FilterPolicy;
pub use storage::manifest::{read_manifest, write_manifest, ManifestStream, SessionManifest};
pub use storage::stream_writer::StreamWriter;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::decryptor::PacketDecryptor;
pub use traits::formatter::StreamFormatter;
pub use traits::voice_source::VoiceSource;

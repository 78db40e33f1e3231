//! Voice packet wire format.
//!
//! Each datagram is a fixed 12-byte header followed by a variable-length
//! encrypted payload:
//!
//! ```text
//! [0-1]   reserved (ignored)
//! [2-3]   sequence   u16 big-endian
//! [4-7]   timestamp  u32 big-endian
//! [8-11]  ssrc       u32 big-endian
//! [12..]  ciphertext (mode-dependent)
//! ```

use crate::models::error::CaptureError;
use crate::traits::decryptor::PacketDecryptor;

/// Size of the fixed voice packet header in bytes.
pub const VOICE_HEADER_SIZE: usize = 12;

/// One decoded voice packet.
///
/// Ephemeral: produced by [`RawPacket::decode`], consumed by the admission
/// path, never stored. `plaintext` is populated only after a successful
/// decrypt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub sequence: u16,
    pub timestamp: u32,
    /// Synchronization-source id identifying the sender's connection.
    pub ssrc: u32,
    pub header: [u8; VOICE_HEADER_SIZE],
    pub ciphertext: Vec<u8>,
    pub plaintext: Vec<u8>,
}

impl RawPacket {
    /// Parse the header fields out of `data` and decrypt the remainder.
    ///
    /// Pure transform, no side effects. Fails with
    /// [`CaptureError::MalformedPacket`] if `data` is shorter than the
    /// header, or [`CaptureError::DecryptionFailed`] if the decryptor
    /// rejects the payload. Either way the packet is dropped by the caller,
    /// never retried: the stream is real-time and stale data has no value.
    pub fn decode(data: &[u8], decryptor: &dyn PacketDecryptor) -> Result<Self, CaptureError> {
        if data.len() < VOICE_HEADER_SIZE {
            return Err(CaptureError::MalformedPacket { len: data.len() });
        }

        let mut header = [0u8; VOICE_HEADER_SIZE];
        header.copy_from_slice(&data[..VOICE_HEADER_SIZE]);
        let ciphertext = data[VOICE_HEADER_SIZE..].to_vec();

        // Two reserved bytes precede the sequence field.
        let sequence = u16::from_be_bytes([header[2], header[3]]);
        let timestamp = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        let ssrc = u32::from_be_bytes([header[8], header[9], header[10], header[11]]);

        let plaintext = decryptor
            .decrypt(&header, &ciphertext)
            .map_err(CaptureError::DecryptionFailed)?;

        Ok(Self {
            sequence,
            timestamp,
            ssrc,
            header,
            ciphertext,
            plaintext,
        })
    }
}

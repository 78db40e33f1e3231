use crate::protocol::packet::VOICE_HEADER_SIZE;

/// Packet decryption interface for the session's negotiated encryption mode.
///
/// The mode is selected during voice-session negotiation and bound to the
/// capture session at construction; the core calls it blindly and trusts the
/// result. Default implementation is
/// [`Aes256GcmDecryptor`](crate::crypto::Aes256GcmDecryptor).
pub trait PacketDecryptor: Send + Sync {
    /// Decrypt one packet payload.
    ///
    /// `header` is the full 12-byte voice header (authenticated by most
    /// modes), `ciphertext` the remainder of the datagram.
    fn decrypt(
        &self,
        header: &[u8; VOICE_HEADER_SIZE],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, String>;

    /// Negotiated mode identifier (e.g. "aead_aes256_gcm").
    fn mode(&self) -> &str;
}

//! Default decryptor for the `aead_aes256_gcm` negotiation mode.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::protocol::packet::VOICE_HEADER_SIZE;
use crate::traits::decryptor::PacketDecryptor;

/// AES-256-GCM packet decryptor.
///
/// In this mode the 12-byte voice header doubles as the GCM nonce and is
/// additionally authenticated as associated data, so a tampered header fails
/// the tag check. The ciphertext carries the 16-byte tag at its tail (the
/// `aes-gcm` crate's combined format).
pub struct Aes256GcmDecryptor {
    cipher: Aes256Gcm,
}

impl Aes256GcmDecryptor {
    /// Build a decryptor from the 32-byte secret key negotiated for the
    /// session.
    pub fn new(secret_key: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(secret_key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }
}

impl PacketDecryptor for Aes256GcmDecryptor {
    fn decrypt(
        &self,
        header: &[u8; VOICE_HEADER_SIZE],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, String> {
        let nonce = Nonce::from_slice(header);
        self.cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|e| format!("AES-GCM decryption failed: {}", e))
    }

    fn mode(&self) -> &str {
        "aead_aes256_gcm"
    }
}

//! AEAD primitive: ChaCha20-Poly1305 with a 256-bit key and 96-bit nonce.
//!
//! Stateless. `seal` appends the 16-byte Poly1305 tag to the ciphertext;
//! `open` verifies and strips it, failing closed on any mismatch.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{EncryptionKey, Nonce};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key};

/// Size of the authentication tag appended by [`seal`].
pub const TAG_SIZE: usize = 16;

fn cipher_for(key: &EncryptionKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
}

/// Encrypts and authenticates `plaintext`, returning ciphertext ‖ tag.
///
/// The caller guarantees `(key, nonce)` has never been used before.
pub fn seal(key: &EncryptionKey, nonce: &Nonce, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    cipher_for(key)
        .encrypt(chacha20poly1305::Nonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| CryptoError::CryptoUnavailable(format!("seal failed: {e}")))
}

/// Verifies the tag and decrypts. No partial plaintext is ever returned.
pub fn open(key: &EncryptionKey, nonce: &Nonce, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    cipher_for(key)
        .decrypt(chacha20poly1305::Nonce::from_slice(nonce.as_bytes()), sealed)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

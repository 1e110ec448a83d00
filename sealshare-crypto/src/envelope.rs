//! Ciphertext envelope: `nonce (12 bytes) ‖ ciphertext ‖ tag (16 bytes)`.
//!
//! No magic bytes and no length prefix; the nonce length is fixed and
//! everything after it is AEAD payload.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{NONCE_SIZE, Nonce};

/// Packs a nonce and sealed payload into one opaque byte sequence.
pub fn pack(nonce: &Nonce, sealed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(nonce.as_bytes());
    out.extend_from_slice(sealed);
    out
}

/// Splits an envelope into its nonce and sealed payload.
///
/// Only the nonce length is checked here. A 12-byte input unpacks to an
/// empty payload, which then fails tag verification.
pub fn unpack(bytes: &[u8]) -> CryptoResult<(Nonce, &[u8])> {
    if bytes.len() < NONCE_SIZE {
        return Err(CryptoError::MalformedEnvelope {
            len: bytes.len(),
            min: NONCE_SIZE,
        });
    }
    let (nonce, sealed) = bytes.split_at(NONCE_SIZE);
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(nonce);
    Ok((Nonce::from_bytes(nonce_bytes), sealed))
}

/// An encrypted file as stored in the blob store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CiphertextEnvelope(Vec<u8>);

impl CiphertextEnvelope {
    pub fn pack(nonce: &Nonce, sealed: &[u8]) -> Self {
        Self(pack(nonce, sealed))
    }

    /// Wraps bytes fetched from storage. Validation happens on [`Self::unpack`].
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn unpack(&self) -> CryptoResult<(Nonce, &[u8])> {
        unpack(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CiphertextEnvelope {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

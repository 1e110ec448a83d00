//! Per-file encryption: fresh key, fresh nonce, seal, pack.

use crate::cipher::seal;
use crate::envelope::CiphertextEnvelope;
use crate::error::CryptoResult;
use crate::file::PlaintextFile;
use crate::key::{EncryptionKey, Nonce};

/// Output of [`encrypt`]: the envelope to upload and the key to hand to the
/// key custodian.
#[derive(Debug)]
pub struct EncryptedFile {
    pub envelope: CiphertextEnvelope,
    pub key: EncryptionKey,
}

/// Encrypts a file under a newly generated key.
///
/// Fails with `CryptoUnavailable` when the random source or cipher cannot
/// be used. Nothing is persisted here.
pub fn encrypt(file: &PlaintextFile) -> CryptoResult<EncryptedFile> {
    encrypt_bytes(&file.bytes)
}

/// Same as [`encrypt`] for a bare byte buffer.
pub fn encrypt_bytes(plaintext: &[u8]) -> CryptoResult<EncryptedFile> {
    let key = EncryptionKey::generate()?;
    let nonce = Nonce::generate()?;
    let sealed = seal(&key, &nonce, plaintext)?;

    Ok(EncryptedFile {
        envelope: CiphertextEnvelope::pack(&nonce, &sealed),
        key,
    })
}

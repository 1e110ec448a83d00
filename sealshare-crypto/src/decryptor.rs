//! Envelope decryption.

use crate::cipher::open;
use crate::envelope::unpack;
use crate::error::CryptoResult;
use crate::file::PlaintextFile;
use crate::key::EncryptionKey;

/// Unpacks and opens an envelope, returning the plaintext bytes only.
///
/// The envelope does not carry the content type; use [`decrypt_file`] to get
/// the plaintext back together with the content type and name recorded at
/// upload time.
///
/// Returns `MalformedEnvelope` for input shorter than a nonce and
/// `AuthenticationFailed` for a wrong key or any tampering.
pub fn decrypt(envelope: &[u8], key: &EncryptionKey) -> CryptoResult<Vec<u8>> {
    let (nonce, sealed) = unpack(envelope)?;
    open(key, &nonce, sealed)
}

/// Decrypts an envelope back into a file, re-attaching the content type and
/// name recorded at upload time.
pub fn decrypt_file(
    envelope: &[u8],
    key: &EncryptionKey,
    content_type: &str,
    name: &str,
) -> CryptoResult<PlaintextFile> {
    let bytes = decrypt(envelope, key)?;
    Ok(PlaintextFile::new(bytes, content_type, name))
}

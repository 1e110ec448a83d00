//! Envelope encryption for SealShare.
//!
//! Every uploaded file gets its own key:
//! - ChaCha20-Poly1305 for authenticated encryption (256-bit key, 96-bit nonce)
//! - A fresh random key per file, zeroized on drop
//! - A fresh random nonce per seal operation
//!
//! # Envelope format
//!
//! ```text
//! [0, 12)    nonce
//! [12, len)  ciphertext ‖ 16-byte Poly1305 tag
//! ```
//!
//! The envelope is self-contained: the matching key is the only other input
//! needed to decrypt it. Keys travel as standard base64 text.

mod cipher;
mod decryptor;
mod encryptor;
pub mod envelope;
mod error;
mod file;
mod key;

pub use cipher::{TAG_SIZE, open, seal};
pub use decryptor::{decrypt, decrypt_file};
pub use encryptor::{EncryptedFile, encrypt, encrypt_bytes};
pub use envelope::CiphertextEnvelope;
pub use error::{CryptoError, CryptoResult};
pub use file::PlaintextFile;
pub use key::{EncryptionKey, KEY_SIZE, NONCE_SIZE, Nonce};

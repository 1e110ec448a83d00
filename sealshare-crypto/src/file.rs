use std::fmt;

/// A file in the clear, as the user picked it or as it comes out of decryption.
#[derive(Clone, PartialEq, Eq)]
pub struct PlaintextFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub name: String,
}

impl PlaintextFile {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            name: name.into(),
        }
    }
}

// Plaintext contents stay out of logs.
impl fmt::Debug for PlaintextFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaintextFile")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("name", &self.name)
            .finish()
    }
}

//! Document-level types.

use encoding_rs::Encoding;
use std::path::Path;

use crate::error::{Error, Result};

/// Raw document bytes as handed over by the caller.
///
/// Created once from external input and consumed by the byte decoder.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    encoding_hint: Option<&'static Encoding>,
}

impl RawDocument {
    /// Wrap raw bytes without an encoding hint.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            encoding_hint: None,
        }
    }

    /// Read a document fully into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        Ok(Self::new(std::fs::read(path)?))
    }

    /// Attach a declared encoding that is tried before the candidate list.
    pub fn with_encoding_hint(mut self, encoding: &'static Encoding) -> Self {
        self.encoding_hint = Some(encoding);
        self
    }

    /// Attach an encoding hint by WHATWG label (e.g. `"shift_jis"`).
    pub fn with_encoding_label(self, label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| Error::UnsupportedEncoding(label.to_string()))?;
        Ok(self.with_encoding_hint(encoding))
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The declared encoding, if any.
    pub fn encoding_hint(&self) -> Option<&'static Encoding> {
        self.encoding_hint
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the document has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for RawDocument {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for RawDocument {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes)
    }
}

/// Text produced by the byte decoder.
///
/// The encoding tag is diagnostic only; no later stage looks at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// Decoded content
    pub text: String,
    /// Encoding that produced the text
    pub encoding: &'static Encoding,
    /// Whether the lossy fallback was used
    pub lossy: bool,
}

impl DecodedText {
    /// Name of the encoding used (e.g. "UTF-8", "Shift_JIS").
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Take ownership of the text buffer.
    pub fn into_text(self) -> String {
        self.text
    }
}

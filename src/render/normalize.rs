//! Final whitespace normalization.

use unicode_normalization::UnicodeNormalization;

/// Collapses blank lines and horizontal whitespace, trims every line.
#[derive(Debug, Clone, Copy)]
pub struct WhitespaceNormalizer {
    nfc: bool,
}

impl WhitespaceNormalizer {
    /// Normalizer applying NFC first.
    pub fn new() -> Self {
        Self { nfc: true }
    }

    /// Enable or disable NFC normalization.
    pub fn with_nfc(mut self, nfc: bool) -> Self {
        self.nfc = nfc;
        self
    }

    /// Normalize `text`.
    ///
    /// Runs of blank lines become one blank line, runs of spaces and tabs
    /// inside a line become one space, and every line plus the whole buffer
    /// is trimmed. Applying it twice changes nothing.
    pub fn normalize(&self, text: &str) -> String {
        let text: String = if self.nfc {
            text.nfc().collect()
        } else {
            text.to_string()
        };

        let mut out = String::with_capacity(text.len());
        let mut pending_blank = false;
        for line in text.lines() {
            let line = collapse_horizontal(line);
            if line.is_empty() {
                pending_blank = !out.is_empty();
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
                if pending_blank {
                    out.push('\n');
                }
            }
            pending_blank = false;
            out.push_str(&line);
        }
        out
    }
}

impl Default for WhitespaceNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim a line and squeeze inner whitespace runs to single spaces.
fn collapse_horizontal(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize with NFC enabled.
pub fn normalize(text: &str) -> String {
    WhitespaceNormalizer::new().normalize(text)
}

//! Parsing options and configuration.

use encoding_rs::Encoding;

use crate::decode::DecoderOptions;
use crate::error::{Error, Result};
use crate::render::{CleanupOptions, CleanupPreset};

use super::control::DEFAULT_PAGE_BREAK_MARKER;

/// Options for extracting text from RTF documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Candidate encodings for the byte decoder
    pub decoder: DecoderOptions,

    /// Encoding tried before the candidates, overriding the document's own hint
    pub encoding_hint: Option<&'static Encoding>,

    /// Try the code page declared by `\ansicpgN` right after UTF-8
    pub use_declared_codepage: bool,

    /// Decode `\'hh` byte escapes through the document code page
    pub decode_hex_escapes: bool,

    /// Remove hex, base64 and raster runs found outside groups
    pub strip_payloads: bool,

    /// Line emitted for `\page`
    pub page_break_marker: String,

    /// What to do with raw CR/LF characters of the source
    pub line_breaks: LineBreakMode,

    /// Noise filter and normalizer settings
    pub cleanup: CleanupOptions,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set decoder options.
    pub fn with_decoder(mut self, decoder: DecoderOptions) -> Self {
        self.decoder = decoder;
        self
    }

    /// Use the candidate order for Japanese documents.
    pub fn japanese(mut self) -> Self {
        self.decoder = DecoderOptions::japanese();
        self
    }

    /// Set the encoding tried first.
    pub fn with_encoding_hint(mut self, encoding: &'static Encoding) -> Self {
        self.encoding_hint = Some(encoding);
        self
    }

    /// Set the encoding tried first by its WHATWG label (`"shift_jis"`, `"cp1252"`).
    pub fn with_encoding_label(self, label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| Error::UnsupportedEncoding(label.to_string()))?;
        Ok(self.with_encoding_hint(encoding))
    }

    /// Enable or disable use of the declared code page.
    pub fn with_declared_codepage(mut self, enabled: bool) -> Self {
        self.use_declared_codepage = enabled;
        self
    }

    /// Enable or disable `\'hh` decoding.
    pub fn with_hex_escapes(mut self, enabled: bool) -> Self {
        self.decode_hex_escapes = enabled;
        self
    }

    /// Enable or disable loose payload removal.
    pub fn with_payload_stripping(mut self, enabled: bool) -> Self {
        self.strip_payloads = enabled;
        self
    }

    /// Set the page-break marker line.
    pub fn with_page_break_marker(mut self, marker: impl Into<String>) -> Self {
        self.page_break_marker = marker.into();
        self
    }

    /// Set raw line-break handling.
    pub fn with_line_breaks(mut self, mode: LineBreakMode) -> Self {
        self.line_breaks = mode;
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Set cleanup options from a preset.
    pub fn with_cleanup_preset(mut self, preset: CleanupPreset) -> Self {
        self.cleanup = CleanupOptions::from_preset(preset);
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            decoder: DecoderOptions::default(),
            encoding_hint: None,
            use_declared_codepage: true,
            decode_hex_escapes: true,
            strip_payloads: true,
            page_break_marker: DEFAULT_PAGE_BREAK_MARKER.to_string(),
            line_breaks: LineBreakMode::Auto,
            cleanup: CleanupOptions::default(),
        }
    }
}

/// Handling of raw CR/LF characters in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreakMode {
    /// Ignore them in RTF input, keep them in anything else
    #[default]
    Auto,
    /// Always ignore them, as RTF readers do
    Ignore,
    /// Always keep them as line breaks
    Keep,
}

impl LineBreakMode {
    /// Whether raw line breaks survive, given whether the input is RTF.
    pub fn keeps_breaks(self, is_rtf: bool) -> bool {
        match self {
            LineBreakMode::Auto => !is_rtf,
            LineBreakMode::Ignore => false,
            LineBreakMode::Keep => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .japanese()
            .with_hex_escapes(false)
            .with_page_break_marker("<page>")
            .with_cleanup_preset(CleanupPreset::Aggressive);

        assert_eq!(options.decoder.candidates[1], SHIFT_JIS);
        assert!(!options.decode_hex_escapes);
        assert_eq!(options.page_break_marker, "<page>");
        assert_eq!(options.cleanup.font_listing_min_len, 30);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.decode_hex_escapes);
        assert!(options.strip_payloads);
        assert!(options.use_declared_codepage);
        assert_eq!(options.page_break_marker, "--- page break ---");
        assert_eq!(options.line_breaks, LineBreakMode::Auto);
        assert!(options.encoding_hint.is_none());
    }

    #[test]
    fn test_encoding_label() {
        let options = ParseOptions::new().with_encoding_label("Shift_JIS").unwrap();
        assert_eq!(options.encoding_hint, Some(SHIFT_JIS));

        let err = ParseOptions::new().with_encoding_label("klingon").unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(_)));
    }

    #[test]
    fn test_line_break_mode() {
        assert!(!LineBreakMode::Auto.keeps_breaks(true));
        assert!(LineBreakMode::Auto.keeps_breaks(false));
        assert!(LineBreakMode::Keep.keeps_breaks(true));
        assert!(!LineBreakMode::Ignore.keeps_breaks(false));
    }
}

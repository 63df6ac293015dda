//! Byte decoding by trial over a prioritized encoding list.

use encoding_rs::{
    Encoding, EUC_JP, EUC_JP_INIT, SHIFT_JIS, SHIFT_JIS_INIT, UTF_8, UTF_8_INIT, WINDOWS_1252,
    WINDOWS_1252_INIT,
};

use crate::model::{DecodedText, RawDocument};

/// Candidate encodings tried by default, in order.
pub static DEFAULT_CANDIDATES: [&Encoding; 4] =
    [&UTF_8_INIT, &WINDOWS_1252_INIT, &SHIFT_JIS_INIT, &EUC_JP_INIT];

/// Options for the byte decoder.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Encodings tried in order; the first strict success wins
    pub candidates: Vec<&'static Encoding>,
}

impl DecoderOptions {
    /// Create options with the default candidate list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate order for documents known to come from Japanese systems.
    ///
    /// Shift_JIS is tried before the single-byte fallback so that raw
    /// double-byte text is not read as Latin-1.
    pub fn japanese() -> Self {
        Self {
            candidates: vec![UTF_8, SHIFT_JIS, EUC_JP, WINDOWS_1252],
        }
    }

    /// Replace the candidate list.
    pub fn with_candidates(mut self, candidates: Vec<&'static Encoding>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Try `encoding` before every other candidate.
    pub fn prefer(mut self, encoding: &'static Encoding) -> Self {
        self.candidates.retain(|e| *e != encoding);
        self.candidates.insert(0, encoding);
        self
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.to_vec(),
        }
    }
}

/// Turns raw bytes into text. Never fails.
#[derive(Debug, Clone, Default)]
pub struct ByteDecoder {
    options: DecoderOptions,
}

impl ByteDecoder {
    /// Create a decoder with the given options.
    pub fn new(options: DecoderOptions) -> Self {
        Self { options }
    }

    /// Decode a raw document.
    ///
    /// Order of attempts: the encoding named by a byte order mark, the
    /// document's encoding hint, then the candidate list. When nothing
    /// decodes strictly, the first candidate decodes lossily.
    pub fn decode(&self, raw: &RawDocument) -> DecodedText {
        let (bom_encoding, body) = match Encoding::for_bom(raw.bytes()) {
            Some((encoding, bom_len)) => (Some(encoding), &raw.bytes()[bom_len..]),
            None => (None, raw.bytes()),
        };

        let attempts = bom_encoding
            .into_iter()
            .chain(raw.encoding_hint())
            .chain(self.options.candidates.iter().copied());

        for encoding in attempts {
            if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body)
            {
                log::debug!("Decoded {} bytes as {}", body.len(), encoding.name());
                return DecodedText {
                    text: text.into_owned(),
                    encoding,
                    lossy: false,
                };
            }
            log::trace!("{} rejected the input", encoding.name());
        }

        let encoding = self.options.candidates.first().copied().unwrap_or(UTF_8);
        let (text, _had_errors) = encoding.decode_without_bom_handling(body);
        log::warn!(
            "No candidate encoding decoded cleanly; using lossy {}",
            encoding.name()
        );
        DecodedText {
            text: text.into_owned(),
            encoding,
            lossy: true,
        }
    }
}

/// Decode bytes with the default candidate list.
pub fn decode_bytes(raw: &RawDocument) -> DecodedText {
    ByteDecoder::default().decode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_wins_first() {
        let raw = RawDocument::new("{\\rtf1 日本語}".as_bytes().to_vec());
        let decoded = decode_bytes(&raw);
        assert_eq!(decoded.encoding, UTF_8);
        assert_eq!(decoded.text, "{\\rtf1 日本語}");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_latin1_bytes_fall_to_windows_1252() {
        let raw = RawDocument::new(b"caf\xE9".to_vec());
        let decoded = decode_bytes(&raw);
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert_eq!(decoded.text, "café");
    }

    #[test]
    fn test_japanese_order_reads_shift_jis() {
        // "日本" in Shift_JIS
        let raw = RawDocument::new(vec![0x93, 0xFA, 0x96, 0x7B]);
        let decoder = ByteDecoder::new(DecoderOptions::japanese());
        let decoded = decoder.decode(&raw);
        assert_eq!(decoded.encoding, SHIFT_JIS);
        assert_eq!(decoded.text, "日本");
    }

    #[test]
    fn test_hint_is_tried_first() {
        let raw = RawDocument::new(vec![0x93, 0xFA, 0x96, 0x7B]).with_encoding_hint(SHIFT_JIS);
        let decoded = decode_bytes(&raw);
        assert_eq!(decoded.encoding, SHIFT_JIS);
        assert_eq!(decoded.text, "日本");
    }

    #[test]
    fn test_utf8_bom_is_skipped() {
        let raw = RawDocument::new(b"\xEF\xBB\xBF{\\rtf1}".to_vec());
        let decoded = decode_bytes(&raw);
        assert_eq!(decoded.text, "{\\rtf1}");
    }

    #[test]
    fn test_lossy_fallback_never_fails() {
        let options = DecoderOptions::new().with_candidates(vec![UTF_8]);
        let raw = RawDocument::new(b"ok \xFF\xFE bad".to_vec());
        let decoded = ByteDecoder::new(options).decode(&raw);
        assert!(decoded.lossy);
        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.text.contains('\u{FFFD}'));
        assert!(decoded.text.starts_with("ok "));
    }

    #[test]
    fn test_empty_candidate_list_uses_utf8() {
        let options = DecoderOptions::new().with_candidates(Vec::new());
        let decoded = ByteDecoder::new(options).decode(&RawDocument::new(b"abc".to_vec()));
        assert_eq!(decoded.text, "abc");
        assert!(decoded.lossy);
    }

    #[test]
    fn test_prefer_moves_encoding_to_front() {
        let options = DecoderOptions::new().prefer(SHIFT_JIS);
        assert_eq!(options.candidates[0], SHIFT_JIS);
        assert_eq!(options.candidates.len(), DEFAULT_CANDIDATES.len());
    }

    #[test]
    fn test_default_candidate_order() {
        assert_eq!(
            DecoderOptions::default().candidates,
            vec![UTF_8, WINDOWS_1252, SHIFT_JIS, EUC_JP]
        );
    }
}

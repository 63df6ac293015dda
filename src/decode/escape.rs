//! Numeric escape decoding.
//!
//! `\uN` escapes carry one UTF-16 code unit as a signed decimal. Writers
//! disagree on what follows the digits: `\?`, `?`, a bare `\`, or nothing.
//! All four forms are accepted. `\'hh` escapes carry raw bytes in the
//! document code page and are decoded when a code page encoding is set.
//!
//! A decoded `{`, `}` or `\` is written back in its escaped form so later
//! stages treat it as text rather than markup.

use encoding_rs::Encoding;

use crate::model::EscapeToken;

/// Added to negative `\uN` values to recover the code point.
const NEGATIVE_BIAS: i64 = 65536;

/// Number of fallback bytes that follow a `\uN` escape unless `\ucN` says otherwise.
const DEFAULT_FALLBACK_LEN: usize = 1;

/// Result of an escape decoding pass.
#[derive(Debug, Clone, Default)]
pub struct EscapeOutput {
    /// Text with escapes substituted
    pub text: String,
    /// Every `\uN` token seen, in input order
    pub tokens: Vec<EscapeToken>,
    /// Number of `\'hh` bytes decoded through the code page
    pub hex_bytes: usize,
    /// Number of `\'hh` fallback bytes dropped after `\uN` escapes
    pub skipped_fallbacks: usize,
}

impl EscapeOutput {
    /// Tokens that were replaced by a character.
    pub fn resolved_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_resolved()).count()
    }

    /// Tokens left unchanged in the text.
    pub fn unresolved_count(&self) -> usize {
        self.tokens.len() - self.resolved_count()
    }
}

/// Single-pass escape decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeDecoder {
    hex_encoding: Option<&'static Encoding>,
}

impl EscapeDecoder {
    /// Decoder for `\uN` escapes only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also decode `\'hh` runs with the given code page encoding.
    pub fn with_hex_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.hex_encoding = Some(encoding);
        self
    }

    /// Decode escapes left to right without overlapping matches.
    pub fn decode(&self, text: &str) -> EscapeOutput {
        let bytes = text.as_bytes();
        let mut out = EscapeOutput {
            text: String::with_capacity(text.len()),
            ..Default::default()
        };
        let mut fallback_len = DEFAULT_FALLBACK_LEN;
        let mut copied = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'\\' {
                i += 1;
                continue;
            }

            match bytes.get(i + 1).copied() {
                // Escaped literals; `\\u12` is text, not an escape.
                Some(b'\\' | b'{' | b'}') => i += 2,
                Some(b'u') => {
                    if let Some(n) = parse_fallback_len(bytes, i) {
                        fallback_len = n;
                        i += 2;
                        continue;
                    }
                    let Some(scan) = scan_unicode(text, i) else {
                        i += 2;
                        continue;
                    };

                    out.tokens.push(EscapeToken {
                        raw_form: text[i..scan.end].to_string(),
                        numeric_value: scan.value,
                        resolved_char: scan.resolved,
                    });

                    match scan.resolved {
                        Some(ch) => {
                            out.text.push_str(&text[copied..i]);
                            push_literal(&mut out.text, ch);
                            let mut end = scan.end;
                            for _ in 0..fallback_len {
                                if hex_pair(bytes, end).is_none() {
                                    break;
                                }
                                end += 4;
                                out.skipped_fallbacks += 1;
                            }
                            copied = end;
                            i = end;
                        }
                        None => i = scan.end,
                    }
                }
                Some(b'\'') => {
                    let Some(encoding) = self.hex_encoding else {
                        i += 2;
                        continue;
                    };
                    let mut run = Vec::new();
                    let mut end = i;
                    while let Some(byte) = hex_pair(bytes, end) {
                        run.push(byte);
                        end += 4;
                    }
                    if run.is_empty() {
                        i += 2;
                        continue;
                    }
                    let (decoded, _) = encoding.decode_without_bom_handling(&run);
                    out.text.push_str(&text[copied..i]);
                    for ch in decoded.chars() {
                        push_literal(&mut out.text, ch);
                    }
                    out.hex_bytes += run.len();
                    copied = end;
                    i = end;
                }
                _ => i += 1,
            }
        }

        out.text.push_str(&text[copied..]);
        out
    }
}

/// Decode `\uN` escapes and return the tokens seen.
///
/// # Example
///
/// ```
/// let (text, tokens) = unrtf::decode::decode_escapes("\\u26085\\?\\u26412\\?");
/// assert_eq!(text, "日本");
/// assert_eq!(tokens.len(), 2);
/// ```
pub fn decode_escapes(text: &str) -> (String, Vec<EscapeToken>) {
    let out = EscapeDecoder::new().decode(text);
    (out.text, out.tokens)
}

/// Push a decoded character, escaping the ones RTF reads as markup.
fn push_literal(out: &mut String, ch: char) {
    if matches!(ch, '{' | '}' | '\\') {
        out.push('\\');
    }
    out.push(ch);
}

struct UnicodeScan {
    end: usize,
    value: Option<i64>,
    resolved: Option<char>,
}

/// Scan a `\uN` token starting at the backslash at `start`.
fn scan_unicode(text: &str, start: usize) -> Option<UnicodeScan> {
    let bytes = text.as_bytes();
    let number_start = start + 2;
    let mut j = number_start;
    if bytes.get(j) == Some(&b'-') {
        j += 1;
    }
    let digits_start = j;
    while j < bytes.len() && bytes[j].is_ascii_digit() {
        j += 1;
    }
    if j == digits_start {
        return None;
    }

    let value = text[number_start..j].parse::<i64>().ok();
    Some(UnicodeScan {
        end: terminator_end(bytes, j),
        value,
        resolved: value.and_then(resolve_code_point),
    })
}

fn resolve_code_point(value: i64) -> Option<char> {
    let value = if value < 0 {
        value + NEGATIVE_BIAS
    } else {
        value
    };
    u32::try_from(value).ok().and_then(char::from_u32)
}

/// End offset of the token once its optional terminator is consumed.
fn terminator_end(bytes: &[u8], at: usize) -> usize {
    match (bytes.get(at).copied(), bytes.get(at + 1).copied()) {
        (Some(b'\\'), Some(b'?')) => at + 2,
        (Some(b'?'), _) => at + 1,
        (Some(b'\\'), next) if !starts_control(next) => at + 1,
        _ => at,
    }
}

/// Whether a backslash followed by `next` begins another control word or symbol.
fn starts_control(next: Option<u8>) -> bool {
    match next {
        None => false,
        Some(c) => {
            c.is_ascii_alphabetic()
                || matches!(
                    c,
                    b'\'' | b'{' | b'}' | b'\\' | b'*' | b'~' | b'_' | b'-' | b'|' | b':' | b'\r'
                        | b'\n'
                )
        }
    }
}

/// Parse `\ucN` at `start`, returning N.
fn parse_fallback_len(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start + 2) != Some(&b'c') {
        return None;
    }
    let digits_start = start + 3;
    let mut j = digits_start;
    while j < bytes.len() && bytes[j].is_ascii_digit() {
        j += 1;
    }
    if j == digits_start || bytes.get(j).is_some_and(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    std::str::from_utf8(&bytes[digits_start..j])
        .ok()?
        .parse()
        .ok()
}

/// Read a `\'hh` escape at `at`.
fn hex_pair(bytes: &[u8], at: usize) -> Option<u8> {
    if bytes.get(at) != Some(&b'\\') || bytes.get(at + 1) != Some(&b'\'') {
        return None;
    }
    let hi = hex_value(*bytes.get(at + 2)?)?;
    let lo = hex_value(*bytes.get(at + 3)?)?;
    Some(hi << 4 | lo)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

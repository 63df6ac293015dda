//! RTF format detection and header sniffing.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

lazy_static! {
    static ref RE_CHARSET: Regex = Regex::new(r"\\(ansi|mac|pca|pc)(?:[^a-z]|$)").unwrap();
    static ref RE_ANSICPG: Regex = Regex::new(r"\\ansicpg(\d{1,5})").unwrap();
    static ref RE_UNICODE_ESCAPE: Regex = Regex::new(r"\\u-?\d").unwrap();
    static ref RE_HEX_ESCAPE: Regex = Regex::new(r"\\'[0-9a-fA-F]{2}").unwrap();
}

/// RTF format information read from the document header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtfFormat {
    /// Major version from `{\rtfN` (1 for every RTF writer in practice)
    pub version: u32,
    /// Declared character set (`ansi`, `mac`, `pc`, `pca`)
    pub charset: Option<String>,
    /// Declared ANSI code page from `\ansicpgN`
    pub codepage: Option<u32>,
}

impl std::fmt::Display for RtfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RTF {}", self.version)?;
        if let Some(cp) = self.codepage {
            write!(f, " (cp{})", cp)?;
        }
        Ok(())
    }
}

/// RTF magic: {\rtf
const RTF_MAGIC: &[u8] = b"{\\rtf";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// How much of the file header is inspected.
const HEADER_LEN: usize = 2048;

/// Detect RTF format from a file path.
///
/// # Example
/// ```no_run
/// use unrtf::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("letter.rtf").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<RtfFormat> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect RTF format from bytes.
///
/// Leading whitespace and a UTF-8 BOM are tolerated before `{\rtf`.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<RtfFormat> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .ok_or(Error::UnknownFormat)?;
    let data = &data[start..];

    if !data.starts_with(RTF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let digits: Vec<u8> = data[RTF_MAGIC.len()..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .take(3)
        .copied()
        .collect();
    let version = std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);

    let header = &data[..data.len().min(HEADER_LEN)];
    let charset = RE_CHARSET
        .captures(header)
        .map(|caps| String::from_utf8_lossy(&caps[1]).into_owned());

    Ok(RtfFormat {
        version,
        charset,
        codepage: sniff_codepage(header),
    })
}

/// Find the `\ansicpgN` declaration in raw or decoded document content.
pub fn sniff_codepage(data: &[u8]) -> Option<u32> {
    let header = &data[..data.len().min(HEADER_LEN)];
    RE_ANSICPG
        .captures(header)
        .and_then(|caps| std::str::from_utf8(&caps[1]).ok()?.parse().ok())
}

/// Check if a file looks like RTF.
pub fn is_rtf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes look like RTF.
pub fn is_rtf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Syntax-level summary of a document, computed without extracting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    /// Unescaped `{` count
    pub open_braces: usize,
    /// Unescaped `}` count
    pub close_braces: usize,
    /// Deepest group nesting reached
    pub max_depth: usize,
    /// `}` with no open group
    pub stray_closes: usize,
    /// Control words (`\word`), escapes included
    pub control_words: usize,
    /// `\uN` escapes
    pub unicode_escapes: usize,
    /// `\'hh` escapes
    pub hex_escapes: usize,
}

impl StructureSummary {
    /// Every group is closed and no close brace is stray.
    pub fn is_balanced(&self) -> bool {
        self.open_braces == self.close_braces && self.stray_closes == 0
    }
}

/// Count braces, nesting depth and escapes in raw document bytes.
///
/// RTF syntax is 7-bit, so this works on undecoded input.
pub fn summarize_structure(data: &[u8]) -> StructureSummary {
    let mut summary = StructureSummary {
        unicode_escapes: RE_UNICODE_ESCAPE.find_iter(data).count(),
        hex_escapes: RE_HEX_ESCAPE.find_iter(data).count(),
        ..Default::default()
    };

    let mut depth = 0usize;
    let mut i = 0;
    while i < data.len() {
        match data[i] {
            b'\\' => {
                if data.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
                    summary.control_words += 1;
                }
                i += 2;
                continue;
            }
            b'{' => {
                summary.open_braces += 1;
                depth += 1;
                summary.max_depth = summary.max_depth.max(depth);
            }
            b'}' => {
                summary.close_braces += 1;
                if depth == 0 {
                    summary.stray_closes += 1;
                } else {
                    depth -= 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_valid_rtf() {
        let data = b"{\\rtf1\\ansi\\ansicpg932\\deff0 Hello}";
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format.version, 1);
        assert_eq!(format.charset.as_deref(), Some("ansi"));
        assert_eq!(format.codepage, Some(932));
    }

    #[test]
    fn test_detect_with_bom_and_whitespace() {
        let data = b"\xEF\xBB\xBF  \r\n{\\rtf1\\mac text}";
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format.charset.as_deref(), Some("mac"));
        assert_eq!(format.codepage, None);
    }

    #[test]
    fn test_ansicpg_is_not_charset_ansi() {
        let data = b"{\\rtf1\\ansicpg1252\\pca x}";
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format.charset.as_deref(), Some("pca"));
        assert_eq!(format.codepage, Some(1252));
    }

    #[test]
    fn test_detect_missing_version_defaults_to_one() {
        let format = detect_format_from_bytes(b"{\\rtf plain}").unwrap();
        assert_eq!(format.version, 1);
    }

    #[test]
    fn test_detect_invalid_format() {
        assert!(matches!(
            detect_format_from_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(
            detect_format_from_bytes(b""),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_is_rtf_bytes() {
        assert!(is_rtf_bytes(b"{\\rtf1 x}"));
        assert!(!is_rtf_bytes(b"%PDF-1.7"));
    }

    #[test]
    fn test_display() {
        let format = detect_format_from_bytes(b"{\\rtf1\\ansi\\ansicpg1252 x}").unwrap();
        assert_eq!(format.to_string(), "RTF 1 (cp1252)");
    }

    #[test]
    fn test_summarize_structure() {
        let summary =
            summarize_structure(b"{\\rtf1 {\\fonttbl{\\f0 A;}} \\{x\\} \\u26085? \\'82\\'a0}");
        assert_eq!(summary.open_braces, 3);
        assert_eq!(summary.close_braces, 3);
        assert_eq!(summary.max_depth, 3);
        assert_eq!(summary.unicode_escapes, 1);
        assert_eq!(summary.hex_escapes, 2);
        assert_eq!(summary.control_words, 4);
        assert!(summary.is_balanced());
    }

    #[test]
    fn test_summarize_unbalanced() {
        let summary = summarize_structure(b"}{\\rtf1 {\\info");
        assert_eq!(summary.stray_closes, 1);
        assert!(!summary.is_balanced());
    }
}

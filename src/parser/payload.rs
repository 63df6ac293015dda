//! Binary payloads left outside any recognized group.
//!
//! Pictures pasted by older writers sometimes land in the body as long hex
//! or base64 runs, raw PNG/JPEG bytes decoded as text, or XMP packets.

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{SpanKind, StructuralSpan};

use super::structure::binary_run_end;

/// Shortest hex run treated as a payload.
pub const MIN_HEX_RUN: usize = 50;

/// Shortest base64 run treated as a payload.
pub const MIN_BASE64_RUN: usize = 100;

lazy_static! {
    static ref RE_HEX_RUN: Regex = Regex::new(&format!("[0-9A-Fa-f]{{{},}}", MIN_HEX_RUN)).unwrap();
    static ref RE_BASE64_RUN: Regex =
        Regex::new(&format!("[A-Za-z0-9+/]{{{},}}={{0,2}}", MIN_BASE64_RUN)).unwrap();
    // PNG signature through the IEND chunk and its CRC
    static ref RE_PNG: Regex = Regex::new(r"(?s)\x{89}?PNG.*?IEND(?:[^\n]{0,4}?B`[^\n]?)?").unwrap();
    // JPEG SOI through EOI, as read by a single-byte code page
    static ref RE_JPEG: Regex = Regex::new(r"(?s)ÿØÿ.*?ÿÙ").unwrap();
    static ref RE_XMP: Regex = Regex::new(
        r"(?s)<\?xpacket.*?\?>|<x:xmpmeta.*?</x:xmpmeta>|<rdf:RDF.*?</rdf:RDF>"
    )
    .unwrap();
    static ref RE_BLIP: Regex = Regex::new(
        r"\\(?:pngblip|jpegblip|emfblip|macpict|wmetafile\d*|dibitmap\d*|wbitmap\d*)[^\\{}]*"
    )
    .unwrap();
    static ref RE_BIN: Regex = Regex::new(r"\\bin\d").unwrap();
}

/// Find loose payload runs. Spans may overlap.
pub fn find_payload_spans(text: &str) -> Vec<StructuralSpan> {
    let patterns: [&Regex; 6] = [
        &RE_PNG,
        &RE_JPEG,
        &RE_XMP,
        &RE_BLIP,
        &RE_HEX_RUN,
        &RE_BASE64_RUN,
    ];

    let mut spans: Vec<StructuralSpan> = patterns
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| StructuralSpan::new(m.start(), m.end(), SpanKind::BinaryPayload))
        .collect();

    for m in RE_BIN.find_iter(text) {
        if let Some(end) = binary_run_end(text, m.start()) {
            spans.push(StructuralSpan::new(m.start(), end, SpanKind::BinaryPayload));
        }
    }

    spans.sort_by_key(|s| s.start);
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::structure::remove_spans;

    fn strip(text: &str) -> String {
        remove_spans(text, &find_payload_spans(text))
    }

    #[test]
    fn test_long_hex_run_removed() {
        let hex = "0123456789abcdef".repeat(4);
        let text = format!("before {} after", hex);
        assert_eq!(strip(&text), "before  after");
    }

    #[test]
    fn test_short_hex_kept() {
        let text = "color ff00ff and deadbeef";
        assert_eq!(strip(text), text);
    }

    #[test]
    fn test_base64_run_removed() {
        let b64 = "QUJD".repeat(30);
        let text = format!("x {}== y", b64);
        assert_eq!(strip(&text), "x  y");
    }

    #[test]
    fn test_png_bytes_removed() {
        let text = "text \u{89}PNG\r\n\u{1a}\nIHDR junk IDAT more IEND®B`‚ tail";
        assert_eq!(strip(text), "text  tail");
    }

    #[test]
    fn test_xmp_packet_removed() {
        let text = "a<?xpacket begin='' id='W5M0'?><x:xmpmeta xmlns:x='adobe:ns:meta/'>\
                    <rdf:RDF></rdf:RDF></x:xmpmeta><?xpacket end='w'?>b";
        assert_eq!(strip(text), "ab");
    }

    #[test]
    fn test_blip_marker_removed() {
        let text = "\\pngblip\\picw100 keep";
        assert_eq!(strip(text), "\\picw100 keep");
    }

    #[test]
    fn test_bin_run_removed() {
        let text = "a\\bin5 xxxxxb";
        assert_eq!(strip(text), "ab");
    }

    #[test]
    fn test_prose_untouched() {
        let text = "The PNG format is described elsewhere; nothing ends here.";
        assert_eq!(strip(text), text);
    }
}

//! Removal of groups that carry no narrative text.
//!
//! A group is selected by the control word right after its opening brace
//! (`{\fonttbl`, `{\*\generator`, ...) and removed through its matching
//! closing brace. Nesting is tracked by depth; escaped braces do not count.

use crate::model::{SpanKind, StructuralSpan};

use super::payload::find_payload_spans;

/// Result of structure stripping.
#[derive(Debug, Clone, Default)]
pub struct StripOutput {
    /// Text with all spans removed
    pub text: String,
    /// Removed group spans, offsets into the input text
    pub group_spans: Vec<StructuralSpan>,
    /// Removed payload spans, offsets into the group-stripped text
    pub payload_spans: Vec<StructuralSpan>,
    /// Groups that ran to end of text without a closing brace
    pub unclosed_groups: usize,
}

impl StripOutput {
    /// All removed spans.
    pub fn spans(&self) -> impl Iterator<Item = &StructuralSpan> {
        self.group_spans.iter().chain(self.payload_spans.iter())
    }
}

/// Structural stripper.
#[derive(Debug, Clone, Copy)]
pub struct StructureStripper {
    strip_payloads: bool,
}

impl StructureStripper {
    /// Stripper removing groups and loose payloads.
    pub fn new() -> Self {
        Self {
            strip_payloads: true,
        }
    }

    /// Enable or disable removal of loose binary payloads.
    pub fn with_payloads(mut self, strip: bool) -> Self {
        self.strip_payloads = strip;
        self
    }

    /// Remove known groups, then loose payloads.
    pub fn strip(&self, text: &str) -> StripOutput {
        let (group_spans, unclosed_groups) = find_group_spans(text);
        if unclosed_groups > 0 {
            log::warn!(
                "{} group(s) not closed before end of text; removed through the end",
                unclosed_groups
            );
        }
        let text = remove_spans(text, &group_spans);

        let payload_spans = if self.strip_payloads {
            find_payload_spans(&text)
        } else {
            Vec::new()
        };
        let text = remove_spans(&text, &payload_spans);

        log::debug!(
            "Stripped {} group(s) and {} payload run(s)",
            group_spans.len(),
            payload_spans.len()
        );

        StripOutput {
            text,
            group_spans,
            payload_spans,
            unclosed_groups,
        }
    }
}

impl Default for StructureStripper {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove non-narrative groups and loose payloads.
///
/// # Example
///
/// ```
/// let text = unrtf::parser::strip_structures("{\\fonttbl{\\f0 Times New Roman;}} Real content here");
/// assert_eq!(text.trim(), "Real content here");
/// ```
pub fn strip_structures(text: &str) -> String {
    StructureStripper::new().strip(text).text
}

/// Find every removable group, outermost only.
///
/// Returns the spans and the number of groups left unclosed.
pub fn find_group_spans(text: &str) -> (Vec<StructuralSpan>, usize) {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut unclosed = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'{' => match group_kind(bytes, i) {
                Some(kind) => {
                    let (end, closed) = matching_brace_end(text, i);
                    if !closed {
                        unclosed += 1;
                    }
                    spans.push(StructuralSpan::new(i, end, kind));
                    i = end;
                }
                None => i += 1,
            },
            _ => i += 1,
        }
    }

    (spans, unclosed)
}

/// Classify the group opening at `open`, if it is removable.
fn group_kind(bytes: &[u8], open: usize) -> Option<SpanKind> {
    let mut j = skip_line_breaks(bytes, open + 1);
    let starred = bytes[j..].starts_with(b"\\*");
    if starred {
        j = skip_line_breaks(bytes, j + 2);
    }
    if bytes.get(j) != Some(&b'\\') {
        return None;
    }
    let word_start = j + 1;
    let word_end = word_start
        + bytes[word_start..]
            .iter()
            .take_while(|b| b.is_ascii_lowercase())
            .count();
    if word_end == word_start {
        return None;
    }
    // Letters only, so from_utf8 cannot fail.
    let keyword = std::str::from_utf8(&bytes[word_start..word_end]).ok()?;
    SpanKind::from_keyword(keyword, starred)
}

fn skip_line_breaks(bytes: &[u8], mut at: usize) -> usize {
    while matches!(bytes.get(at), Some(b'\r' | b'\n')) {
        at += 1;
    }
    at
}

/// Offset just past the brace closing the group at `open`.
///
/// Returns `(text.len(), false)` when the group never closes.
fn matching_brace_end(text: &str, open: usize) -> (usize, bool) {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut k = open;

    while k < bytes.len() {
        match bytes[k] {
            b'\\' => {
                if let Some(end) = binary_run_end(text, k) {
                    k = end;
                } else {
                    k += 2;
                }
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (k + 1, true);
                }
            }
            _ => {}
        }
        k += 1;
    }

    (bytes.len(), false)
}

/// If a `\binN` word starts at `at`, the offset after its N payload characters.
pub(crate) fn binary_run_end(text: &str, at: usize) -> Option<usize> {
    let rest = text.get(at..)?.strip_prefix("\\bin")?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let count: usize = rest[..digits].parse().ok()?;
    let mut payload_start = at + 4 + digits;
    if text.as_bytes().get(payload_start) == Some(&b' ') {
        payload_start += 1;
    }
    let end = text[payload_start..]
        .char_indices()
        .nth(count)
        .map(|(offset, _)| payload_start + offset)
        .unwrap_or(text.len());
    Some(end)
}

/// Copy only the ranges not covered by `spans`.
///
/// Spans may be unsorted and may overlap.
pub fn remove_spans(text: &str, spans: &[StructuralSpan]) -> String {
    if spans.is_empty() {
        return text.to_string();
    }

    let mut ranges: Vec<_> = spans.iter().map(|s| s.range()).collect();
    ranges.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in ranges {
        if range.start > cursor {
            out.push_str(&text[cursor..range.start]);
        }
        cursor = cursor.max(range.end.min(text.len()));
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_table_removed_with_nesting() {
        let text = "{\\fonttbl{\\f0 Times New Roman;}{\\f1 Arial;}} Real content here";
        assert_eq!(strip_structures(text), " Real content here");
    }

    #[test]
    fn test_known_groups_removed_inside_document() {
        let text = "{\\rtf1{\\colortbl;\\red0\\green0\\blue0;}{\\stylesheet{\\s0 Normal;}}\
                    {\\info{\\title T}{\\author A}}{\\*\\generator Riched20 10.0;}Body}";
        let out = StructureStripper::new().strip(text);
        assert_eq!(out.text, "{\\rtf1Body}");
        let kinds: Vec<_> = out.group_spans.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SpanKind::ColorTable,
                SpanKind::StyleSheet,
                SpanKind::InfoBlock,
                SpanKind::GeneratorBlock
            ]
        );
    }

    #[test]
    fn test_picture_and_object_groups() {
        let text = "A{\\*\\shppict{\\pict\\pngblip 89504e47}}B{\\object{\\objdata 0102}}C";
        assert_eq!(strip_structures(text), "ABC");
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        let text = "{\\infotext keep}{\\pictures keep}";
        assert_eq!(strip_structures(text), text);
    }

    #[test]
    fn test_starred_unknown_is_ignorable() {
        let text = "x{\\*\\bkmkstart intro}y";
        let out = StructureStripper::new().strip(text);
        assert_eq!(out.text, "xy");
        assert_eq!(out.group_spans[0].kind, SpanKind::IgnorableDestination);
    }

    #[test]
    fn test_escaped_braces_do_not_count() {
        let text = "{\\info \\} still info {\\title x}}after";
        assert_eq!(strip_structures(text), "after");
    }

    #[test]
    fn test_unclosed_group_removed_to_end() {
        let text = "keep {\\fonttbl{\\f0 Arial;} never closed";
        let out = StructureStripper::new().strip(text);
        assert_eq!(out.text, "keep ");
        assert_eq!(out.unclosed_groups, 1);
    }

    #[test]
    fn test_unbalanced_input_never_grows() {
        let inputs = [
            "{{{{{{",
            "{\\pict {{{ 00ff",
            "}}}{\\colortbl",
            "{\\rtf1 {\\b bold text",
            "\\",
            "{\\*",
        ];
        for input in inputs {
            let out = strip_structures(input);
            assert!(out.len() <= input.len(), "{:?} grew to {:?}", input, out);
        }
    }

    #[test]
    fn test_bin_payload_skipped_inside_picture() {
        let text = "{\\pict\\bin3 }{}}after";
        assert_eq!(strip_structures(text), "after");
    }

    #[test]
    fn test_remove_spans_merges_overlaps() {
        let spans = vec![
            StructuralSpan::new(6, 9, SpanKind::BinaryPayload),
            StructuralSpan::new(2, 4, SpanKind::FontTable),
            StructuralSpan::new(3, 7, SpanKind::InfoBlock),
        ];
        assert_eq!(remove_spans("0123456789", &spans), "019");
    }
}

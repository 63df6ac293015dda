//! End-to-end extraction tests over realistic documents.

use std::fs;

use unrtf::{
    extract, extract_file, extract_with_options, CleanupPreset, ParseOptions, SpanKind, Unrtf,
};

const WORD_DOCUMENT: &str = r"{\rtf1\ansi\ansicpg1252\deff0\nouicompat
{\fonttbl{\f0\fnil\fcharset0 Calibri;}{\f1\froman Times New Roman;}}
{\colortbl ;\red255\green0\blue0;\red0\green0\blue255;}
{\stylesheet{\s0 Normal;}{\s1\b Heading 1;}}
{\*\generator Riched20 10.0.19041}
{\info{\title Quarterly summary}{\author Finance team}}
\viewkind4\uc1\pard\sa200\sl276\slmult1\f0\fs22\lang9
{\b Quarterly summary}\par
Revenue grew in every region this quarter.\par
{\pict\pngblip\picw120\pich80 89504e470d0a1a0a0000000d49484452000000780000005008060000}
\par
Costs stayed flat\tab as planned.\page
Outlook remains positive.\par
}";

#[test]
fn test_word_document() {
    let text = extract(WORD_DOCUMENT.as_bytes());
    assert_eq!(
        text,
        "Quarterly summary\n\
         Revenue grew in every region this quarter.\n\
         Costs stayed flat as planned.\n\
         --- page break ---\n\
         Outlook remains positive."
    );
}

#[test]
fn test_word_document_report() {
    let result = extract_with_options(WORD_DOCUMENT.as_bytes(), &ParseOptions::default());
    let report = &result.report;

    assert_eq!(report.format.as_ref().map(|f| f.codepage), Some(Some(1252)));
    for kind in [
        SpanKind::FontTable,
        SpanKind::ColorTable,
        SpanKind::StyleSheet,
        SpanKind::GeneratorBlock,
        SpanKind::InfoBlock,
        SpanKind::PictureBlock,
    ] {
        assert_eq!(report.spans_by_kind.get(&kind), Some(&1), "{:?}", kind);
    }
    assert_eq!(report.unclosed_groups, 0);
    assert_eq!(report.stats.lines_kept, 5);
}

#[test]
fn test_shift_jis_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("japanese.rtf");

    // 日本語 in Shift_JIS; the trail byte of 本 is 0x7B, an ASCII brace
    let mut bytes = b"{\\rtf1\\ansi\\ansicpg932 ".to_vec();
    bytes.extend_from_slice(&[0x93, 0xFA, 0x96, 0x7B, 0x8C, 0xEA]);
    bytes.extend_from_slice(b"\\par}");
    fs::write(&path, bytes).unwrap();

    let result = Unrtf::new().japanese().parse(&path).unwrap();
    assert_eq!(result.text(), "日本語");
    assert_eq!(result.report().encoding, "Shift_JIS");
    assert!(!result.report().lossy_decode);
}

#[test]
fn test_hex_escaped_japanese() {
    // 日本 as \'hh pairs in code page 932
    let text = extract(b"{\\rtf1\\ansi\\ansicpg932 \\'93\\'fa\\'96\\'7b\\par}");
    assert_eq!(text, "日本");
}

#[test]
fn test_unicode_escapes_with_fallbacks() {
    let text = extract(b"{\\rtf1\\uc1 \\u26085?\\u26412?\\u-30050? document\\par}");
    assert_eq!(text, "日本語 document");
}

#[test]
fn test_loose_binary_dump_removed() {
    let hex = "0123456789abcdef".repeat(6);
    let doc = format!("{{\\rtf1 Before the dump\\par\n{}\n\\par After the dump}}", hex);
    assert_eq!(extract(doc.as_bytes()), "Before the dump\nAfter the dump");
}

#[test]
fn test_table_cells_become_spaces() {
    let doc = b"{\\rtf1\\trowd\\cellx1000\\cellx2000 Name\\cell Role\\cell\\row Alice\\cell Editor\\cell\\row}";
    assert_eq!(extract(doc), "Name Role\nAlice Editor");
}

#[test]
fn test_custom_page_marker() {
    let text = Unrtf::new()
        .with_page_break_marker("=== next page ===")
        .parse_bytes(b"{\\rtf1 First page\\page Second page}")
        .into_inner()
        .content;
    assert_eq!(text, "First page\n=== next page ===\nSecond page");
}

#[test]
fn test_escaped_braces_survive() {
    let text = extract(b"{\\rtf1 Use \\{curly\\} and \\\\ slashes}");
    assert_eq!(text, "Use {curly} and \\ slashes");
}

#[test]
fn test_hex_escaped_brace_keeps_group_closed() {
    let text = extract(b"{\\rtf1\\ansi{\\info{\\title Plan \\'7b draft}}Body text survives\\par}");
    assert_eq!(text, "Body text survives");
}

#[test]
fn test_hex_escaped_backslash_is_text() {
    let result = extract_with_options(
        b"{\\rtf1 Path C:\\'5cpath\\'5cfile here\\par}",
        &ParseOptions::new().with_cleanup_preset(CleanupPreset::Minimal),
    );
    assert_eq!(result.content, "Path C:\\path\\file here");
}

#[test]
fn test_line_breaks_after_control_words() {
    let text = extract(b"{\\rtf1\\ansi\r\n\\pard\\i\r\nitalic words here\\i0\r\n and more\\par\r\n}");
    assert_eq!(text, "italic words here and more");
}

#[test]
fn test_typographic_quotes_and_dashes() {
    let text = extract(b"{\\rtf1 It\\rquote s \\ldblquote done\\rdblquote \\emdash mostly\\par}");
    assert_eq!(text, "It's \"done\"--mostly");
}

#[test]
fn test_minimal_keeps_residue() {
    let doc = b"{\\rtf1 Real sentence here\\par x4535\\par}";
    let standard = extract(doc);
    let minimal = extract_with_options(
        doc,
        &ParseOptions::new().with_cleanup_preset(CleanupPreset::Minimal),
    )
    .content;

    assert_eq!(standard, "Real sentence here");
    assert_eq!(minimal, "Real sentence here\nx4535");
}

#[test]
fn test_extract_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.rtf");
    fs::write(&path, "{\\rtf1 A short note\\par}").unwrap();

    assert_eq!(extract_file(&path).unwrap(), "A short note");
}

#[test]
fn test_garbage_never_panics() {
    let mut garbage: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    garbage.extend_from_slice(b"{{{\\pict }}}}\\u-99999999999?\\'zz\\bin999999 ");
    let _ = extract(&garbage);

    let truncated = &WORD_DOCUMENT.as_bytes()[..WORD_DOCUMENT.len() / 2];
    let _ = extract(truncated);
}

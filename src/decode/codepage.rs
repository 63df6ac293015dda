//! Windows code page numbers as used by `\ansicpgN`.

use encoding_rs::*;

/// Code page assumed when a document declares none.
pub const DEFAULT_CODEPAGE: u32 = 1252;

/// Map a Windows code page number to an encoding.
pub fn encoding_for_codepage(codepage: u32) -> Option<&'static Encoding> {
    let encoding = match codepage {
        866 => IBM866,
        874 => WINDOWS_874,
        932 => SHIFT_JIS,
        936 => GBK,
        949 => EUC_KR,
        950 => BIG5,
        1250 => WINDOWS_1250,
        1251 => WINDOWS_1251,
        1252 | 28591 => WINDOWS_1252,
        1253 => WINDOWS_1253,
        1254 => WINDOWS_1254,
        1255 => WINDOWS_1255,
        1256 => WINDOWS_1256,
        1257 => WINDOWS_1257,
        1258 => WINDOWS_1258,
        10000 => MACINTOSH,
        10007 => X_MAC_CYRILLIC,
        20866 => KOI8_R,
        20932 | 51932 => EUC_JP,
        21866 => KOI8_U,
        28592 => ISO_8859_2,
        28595 => ISO_8859_5,
        28597 => ISO_8859_7,
        28605 => ISO_8859_15,
        50220 => ISO_2022_JP,
        54936 => GB18030,
        65001 => UTF_8,
        _ => return None,
    };
    Some(encoding)
}

/// Encoding for a declared code page, falling back to windows-1252.
pub fn encoding_or_default(codepage: Option<u32>) -> &'static Encoding {
    codepage
        .and_then(|cp| {
            let encoding = encoding_for_codepage(cp);
            if encoding.is_none() {
                log::debug!("Unknown code page {}, using cp{}", cp, DEFAULT_CODEPAGE);
            }
            encoding
        })
        .unwrap_or(WINDOWS_1252)
}

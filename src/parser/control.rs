//! Control-word elimination.
//!
//! Runs in two phases. Layout words that carry meaning (`\par`, `\tab`,
//! `\page`, table cell and row ends) become characters first, and the
//! escaped literals `\\`, `\{`, `\}` are parked behind placeholders. The
//! second phase removes every remaining control word, control symbol and
//! grouping brace, then restores the parked literals.
//!
//! A control word ends at its delimiter: one space or a raw line break,
//! consumed with the word.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Marker emitted for `\page` unless configured otherwise.
pub const DEFAULT_PAGE_BREAK_MARKER: &str = "--- page break ---";

const BACKSLASH_PLACEHOLDER: &str = "\u{0000}BS\u{0000}";
const LBRACE_PLACEHOLDER: &str = "\u{0000}LB\u{0000}";
const RBRACE_PLACEHOLDER: &str = "\u{0000}RB\u{0000}";

lazy_static! {
    // Alternatives: control word, escaped literal, escaped line break, raw line break
    static ref RE_STRUCTURAL: Regex =
        Regex::new(r"\\([a-z]+)(-?\d+)?(?: |\r\n|\r|\n)?|\\([\\{}~_])|\\(\r\n|\r|\n)|(\r\n|\r|\n)")
            .unwrap();
    static ref RE_CONTROL_WORD: Regex = Regex::new(r"\\[a-z]+-?\d* ?").unwrap();
    static ref RE_CONTROL_SYMBOL: Regex = Regex::new(r"\\[^a-z\s]").unwrap();
}

/// Removes formatting commands, keeping the characters they stand for.
#[derive(Debug, Clone)]
pub struct ControlCodeEliminator {
    page_break_marker: String,
    keep_source_line_breaks: bool,
}

impl ControlCodeEliminator {
    /// Eliminator with the default page-break marker.
    pub fn new() -> Self {
        Self {
            page_break_marker: DEFAULT_PAGE_BREAK_MARKER.to_string(),
            keep_source_line_breaks: false,
        }
    }

    /// Text emitted on its own line for `\page`.
    pub fn with_page_break_marker(mut self, marker: impl Into<String>) -> Self {
        self.page_break_marker = marker.into();
        self
    }

    /// Keep raw CR/LF characters of the source as line breaks.
    ///
    /// RTF readers ignore them, so they are dropped by default. Text that is
    /// not really RTF reads better with them kept.
    pub fn with_source_line_breaks(mut self, keep: bool) -> Self {
        self.keep_source_line_breaks = keep;
        self
    }

    /// The configured page-break marker.
    pub fn page_break_marker(&self) -> &str {
        &self.page_break_marker
    }

    /// Remove all control words, symbols and braces.
    pub fn eliminate(&self, text: &str) -> String {
        let text = self.substitute(text);
        let text = RE_CONTROL_WORD.replace_all(&text, "");
        let text = RE_CONTROL_SYMBOL.replace_all(&text, "");
        let text: String = text.chars().filter(|c| !matches!(c, '{' | '}')).collect();

        text.replace(BACKSLASH_PLACEHOLDER, "\\")
            .replace(LBRACE_PLACEHOLDER, "{")
            .replace(RBRACE_PLACEHOLDER, "}")
    }

    /// Phase one: layout words to characters, escaped literals to placeholders.
    fn substitute<'t>(&self, text: &'t str) -> Cow<'t, str> {
        RE_STRUCTURAL.replace_all(text, |caps: &Captures| -> String {
            if let Some(word) = caps.get(1) {
                return match word.as_str() {
                    "par" | "line" | "sect" | "row" | "nestrow" => "\n".to_string(),
                    "tab" | "cell" | "nestcell" => "\t".to_string(),
                    "page" => format!("\n{}\n", self.page_break_marker),
                    "lquote" | "rquote" => "'".to_string(),
                    "ldblquote" | "rdblquote" => "\"".to_string(),
                    "emdash" => "--".to_string(),
                    "endash" => "-".to_string(),
                    "bullet" => "*".to_string(),
                    // Left for phase two with a space delimiter
                    other => {
                        let param = caps.get(2).map_or("", |m| m.as_str());
                        format!("\\{}{} ", other, param)
                    }
                };
            }
            if let Some(symbol) = caps.get(3) {
                return match symbol.as_str() {
                    "\\" => BACKSLASH_PLACEHOLDER,
                    "{" => LBRACE_PLACEHOLDER,
                    "}" => RBRACE_PLACEHOLDER,
                    "~" => " ",
                    _ => "-",
                }
                .to_string();
            }
            if caps.get(4).is_some() {
                return "\n".to_string();
            }
            if self.keep_source_line_breaks {
                "\n".to_string()
            } else {
                String::new()
            }
        })
    }
}

impl Default for ControlCodeEliminator {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove control codes with default settings.
///
/// # Example
///
/// ```
/// let text = unrtf::parser::eliminate_control_codes("\\b Bold\\b0  text\\par next");
/// assert_eq!(text, "Bold text\nnext");
/// ```
pub fn eliminate_control_codes(text: &str) -> String {
    ControlCodeEliminator::new().eliminate(text)
}

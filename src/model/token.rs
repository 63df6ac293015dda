//! Escape tokens recorded by the escape decoder.

use serde::{Deserialize, Serialize};

/// One `\uN` escape seen while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeToken {
    /// Matched text including its terminator
    pub raw_form: String,
    /// Parsed value before the negative bias, if the digits parsed
    pub numeric_value: Option<i64>,
    /// Substituted character; `None` means the text was left as is
    pub resolved_char: Option<char>,
}

impl EscapeToken {
    /// Whether the token was replaced in the output.
    pub fn is_resolved(&self) -> bool {
        self.resolved_char.is_some()
    }
}

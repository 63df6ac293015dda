//! Line-level noise filter.
//!
//! Each physical line is trimmed and run through an ordered list of named
//! [`LineRule`]s. The first rule that matches drops the line. Rules marked as
//! yielding to CJK are skipped for lines holding Japanese or Chinese text, so
//! short or digit-heavy lines in those scripts survive.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::LineRecord;

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPreset {
    /// Only blank lines are dropped
    Minimal,
    /// Full rule set
    #[default]
    Standard,
    /// Full rule set, stricter thresholds, replacement and private-use characters removed
    Aggressive,
}

impl std::str::FromStr for CleanupPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimal" => Ok(CleanupPreset::Minimal),
            "standard" => Ok(CleanupPreset::Standard),
            "aggressive" => Ok(CleanupPreset::Aggressive),
            other => Err(format!("unknown cleanup preset: {}", other)),
        }
    }
}

/// Options for text cleanup.
#[derive(Debug, Clone)]
pub struct CleanupOptions {
    /// Run the noise rules; when off only blank lines are dropped
    pub filter_noise: bool,

    /// Lines longer than this made only of name-list characters are font listings
    pub font_listing_min_len: usize,

    /// Remove Unicode replacement character (U+FFFD) before filtering
    pub remove_replacement_char: bool,

    /// Remove Private Use Area (PUA) characters before filtering
    pub remove_pua: bool,

    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self::minimal(),
            CleanupPreset::Standard => Self::standard(),
            CleanupPreset::Aggressive => Self::aggressive(),
        }
    }

    /// Minimal cleanup options.
    pub fn minimal() -> Self {
        Self {
            filter_noise: false,
            font_listing_min_len: FontListing::DEFAULT_MIN_LEN,
            remove_replacement_char: false,
            remove_pua: false,
            normalize_unicode: true,
        }
    }

    /// Standard cleanup options.
    pub fn standard() -> Self {
        Self {
            filter_noise: true,
            ..Self::minimal()
        }
    }

    /// Aggressive cleanup options.
    pub fn aggressive() -> Self {
        Self {
            filter_noise: true,
            font_listing_min_len: 30,
            remove_replacement_char: true,
            remove_pua: true,
            normalize_unicode: true,
        }
    }

    /// Enable or disable NFC normalization.
    pub fn with_unicode_normalization(mut self, enabled: bool) -> Self {
        self.normalize_unicode = enabled;
        self
    }

    /// Set the font-listing length threshold.
    pub fn with_font_listing_min_len(mut self, len: usize) -> Self {
        self.font_listing_min_len = len;
        self
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Whether `c` is Hiragana, Katakana or a CJK unified ideograph.
pub fn is_cjk(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{4E00}'..='\u{9FFF}')
}

/// Whether the text holds at least one CJK character.
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

fn is_private_use(c: char) -> bool {
    let code = c as u32;
    (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
}

/// A named predicate deciding whether a trimmed line is noise.
pub trait LineRule: Send + Sync {
    /// Name recorded in [`LineRecord::rule`].
    fn name(&self) -> &'static str;

    /// Whether the rule is skipped for lines containing CJK text.
    fn yields_to_cjk(&self) -> bool {
        false
    }

    /// Whether the line is noise. The line is already trimmed.
    fn is_noise(&self, line: &str) -> bool;
}

lazy_static! {
    static ref RE_MEASURE_TOKEN: Regex = Regex::new(r"^[A-Za-z]{1,5}\d+$").unwrap();
    static ref RE_FONT_NAME: Regex =
        Regex::new(r"(?i)(?:helvetica|arial|times|courier|symbol|font)").unwrap();
    static ref RE_CONTROL_FRAGMENT: Regex = Regex::new(r"\\[A-Za-z]+\d*").unwrap();
}

/// Image signatures and metadata tags matched anywhere in a line.
const RESIDUE_KEYWORDS: &[&str] = &[
    "png", "idat", "iend", "ihdr", "xml", "xmp", "adobe", "rdf", "width", "height",
];

/// Blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Empty;

impl LineRule for Empty {
    fn name(&self) -> &'static str {
        "empty"
    }

    fn is_noise(&self, line: &str) -> bool {
        line.is_empty()
    }
}

/// Dimension residue such as `x4535` or `Width4535`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasureToken;

impl LineRule for MeasureToken {
    fn name(&self) -> &'static str {
        "measure-token"
    }

    fn yields_to_cjk(&self) -> bool {
        true
    }

    fn is_noise(&self, line: &str) -> bool {
        RE_MEASURE_TOKEN.is_match(line)
    }
}

/// Short line made of digits only, such as a stray list number.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitsOnly;

impl DigitsOnly {
    /// Longest line the rule applies to.
    pub const MAX_LEN: usize = 3;
}

impl LineRule for DigitsOnly {
    fn name(&self) -> &'static str {
        "digits-only"
    }

    fn yields_to_cjk(&self) -> bool {
        true
    }

    fn is_noise(&self, line: &str) -> bool {
        !line.is_empty()
            && line.len() <= Self::MAX_LEN
            && line.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Long run of names and separators, the remains of a font table.
#[derive(Debug, Clone, Copy)]
pub struct FontListing {
    min_len: usize,
}

impl FontListing {
    /// Default length threshold.
    pub const DEFAULT_MIN_LEN: usize = 50;

    /// Rule dropping listings longer than `min_len` characters.
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }
}

impl Default for FontListing {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_LEN)
    }
}

impl LineRule for FontListing {
    fn name(&self) -> &'static str {
        "font-listing"
    }

    fn yields_to_cjk(&self) -> bool {
        true
    }

    fn is_noise(&self, line: &str) -> bool {
        line.chars().count() > self.min_len
            && line.chars().all(|c| {
                c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, ';' | ',' | '&' | '.' | '-')
            })
    }
}

/// Image signatures, metadata tags and font family names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidueKeyword;

impl LineRule for ResidueKeyword {
    fn name(&self) -> &'static str {
        "residue-keyword"
    }

    fn is_noise(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        RESIDUE_KEYWORDS.iter().any(|k| lower.contains(k)) || RE_FONT_NAME.is_match(line)
    }
}

/// Control word that survived elimination.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlFragment;

impl LineRule for ControlFragment {
    fn name(&self) -> &'static str {
        "control-fragment"
    }

    fn is_noise(&self, line: &str) -> bool {
        RE_CONTROL_FRAGMENT.is_match(line)
    }
}

/// Character outside printable ASCII, CJK and fullwidth forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryResidue;

impl LineRule for BinaryResidue {
    fn name(&self) -> &'static str {
        "binary-residue"
    }

    fn is_noise(&self, line: &str) -> bool {
        line.chars().any(|c| {
            !(matches!(c, ' '..='~' | '\u{3000}'..='\u{9FFF}' | '\u{FF00}'..='\u{FFEF}')
                || c.is_whitespace())
        })
    }
}

/// No letter, digit or CJK character at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolsOnly;

impl LineRule for SymbolsOnly {
    fn name(&self) -> &'static str {
        "symbols-only"
    }

    fn yields_to_cjk(&self) -> bool {
        true
    }

    fn is_noise(&self, line: &str) -> bool {
        !line.chars().any(char::is_alphanumeric)
    }
}

/// Fewer than three characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TooShort;

impl LineRule for TooShort {
    fn name(&self) -> &'static str {
        "too-short"
    }

    fn yields_to_cjk(&self) -> bool {
        true
    }

    fn is_noise(&self, line: &str) -> bool {
        line.chars().count() < 3
    }
}

/// Ordered rule set classifying lines as content or noise.
pub struct NoiseFilter {
    rules: Vec<Box<dyn LineRule>>,
    remove_replacement_char: bool,
    remove_pua: bool,
}

impl NoiseFilter {
    /// Create a filter for the given options.
    pub fn new(options: &CleanupOptions) -> Self {
        let filter = if options.filter_noise {
            Self::standard_rules(options.font_listing_min_len)
        } else {
            Self::empty().with_rule(Empty)
        };
        Self {
            remove_replacement_char: options.remove_replacement_char,
            remove_pua: options.remove_pua,
            ..filter
        }
    }

    /// Create a filter from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        Self::new(&CleanupOptions::from_preset(preset))
    }

    /// A filter with no rules; every line is kept.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            remove_replacement_char: false,
            remove_pua: false,
        }
    }

    fn standard_rules(font_listing_min_len: usize) -> Self {
        Self::empty()
            .with_rule(Empty)
            .with_rule(MeasureToken)
            .with_rule(DigitsOnly)
            .with_rule(FontListing::new(font_listing_min_len))
            .with_rule(ResidueKeyword)
            .with_rule(ControlFragment)
            .with_rule(BinaryResidue)
            .with_rule(SymbolsOnly)
            .with_rule(TooShort)
    }

    /// Append a rule; it runs after the existing ones.
    pub fn with_rule(mut self, rule: impl LineRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Insert a rule at `index`, shifting later rules back.
    pub fn with_rule_at(mut self, index: usize, rule: impl LineRule + 'static) -> Self {
        let index = index.min(self.rules.len());
        self.rules.insert(index, Box::new(rule));
        self
    }

    /// Remove every rule called `name`.
    pub fn without_rule(mut self, name: &str) -> Self {
        self.rules.retain(|r| r.name() != name);
        self
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Classify one line.
    pub fn classify(&self, line: &str) -> LineRecord {
        let line = line.trim();
        let cjk = contains_cjk(line);
        let hit = self
            .rules
            .iter()
            .filter(|rule| !(cjk && rule.yields_to_cjk()))
            .find(|rule| rule.is_noise(line));

        match hit {
            Some(rule) => LineRecord::drop(line, rule.name()),
            None => LineRecord::keep(line),
        }
    }

    /// Classify every line of `text`.
    pub fn audit(&self, text: &str) -> Vec<LineRecord> {
        let text = self.prepare(text);
        text.lines().map(|line| self.classify(line)).collect()
    }

    /// Drop noise lines and return the kept lines, trimmed, joined by newlines.
    pub fn filter_lines(&self, text: &str) -> String {
        let records = self.audit(text);
        let dropped = records.iter().filter(|r| !r.is_kept()).count();
        log::debug!("Noise filter kept {} of {} lines", records.len() - dropped, records.len());
        join_kept(&records)
    }

    fn prepare<'t>(&self, text: &'t str) -> Cow<'t, str> {
        if !self.remove_replacement_char && !self.remove_pua {
            return Cow::Borrowed(text);
        }
        Cow::Owned(
            text.chars()
                .filter(|&c| !(self.remove_replacement_char && c == '\u{FFFD}'))
                .filter(|&c| !(self.remove_pua && is_private_use(c)))
                .collect(),
        )
    }
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::from_preset(CleanupPreset::Standard)
    }
}

impl std::fmt::Debug for NoiseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseFilter")
            .field("rules", &self.rule_names())
            .field("remove_replacement_char", &self.remove_replacement_char)
            .field("remove_pua", &self.remove_pua)
            .finish()
    }
}

/// Join the kept lines of an audit.
pub fn join_kept(records: &[LineRecord]) -> String {
    records
        .iter()
        .filter(|r| r.is_kept())
        .map(|r| r.line.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Filter lines with the standard rule set.
pub fn filter_lines(text: &str) -> String {
    NoiseFilter::default().filter_lines(text)
}

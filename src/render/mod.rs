//! Line filtering, normalization and result types.

mod cleanup;
mod json;
mod normalize;
mod result;

pub use cleanup::{
    contains_cjk, filter_lines, is_cjk, join_kept, BinaryResidue, CleanupOptions, CleanupPreset,
    ControlFragment, DigitsOnly, Empty, FontListing, LineRule, MeasureToken, NoiseFilter,
    ResidueKeyword, SymbolsOnly, TooShort,
};
pub use json::{to_json, JsonFormat};
pub use normalize::{normalize, WhitespaceNormalizer};
pub use result::{ExtractionReport, ExtractionStats, RenderResult};

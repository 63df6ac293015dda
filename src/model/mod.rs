//! Data types passed between the extraction stages.
//!
//! Raw bytes become [`DecodedText`], escape decoding yields
//! [`EscapeToken`]s, structure stripping computes [`StructuralSpan`]s and the
//! noise filter classifies lines into [`LineRecord`]s.

mod document;
mod line;
mod span;
mod token;

pub use document::{DecodedText, RawDocument};
pub use line::{LineOutcome, LineRecord};
pub use span::{SpanKind, StructuralSpan};
pub use token::EscapeToken;

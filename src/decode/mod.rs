//! Decoding stages: bytes to text, then numeric escapes to characters.

mod bytes;
mod codepage;
mod escape;

pub use bytes::{decode_bytes, ByteDecoder, DecoderOptions, DEFAULT_CANDIDATES};
pub use codepage::{encoding_for_codepage, encoding_or_default, DEFAULT_CODEPAGE};
pub use escape::{decode_escapes, EscapeDecoder, EscapeOutput};

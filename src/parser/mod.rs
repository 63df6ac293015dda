//! RTF parsing: structure stripping, control-code elimination and the
//! pipeline tying the stages together.

mod control;
mod options;
mod payload;
mod pipeline;
mod structure;

pub use control::{eliminate_control_codes, ControlCodeEliminator, DEFAULT_PAGE_BREAK_MARKER};
pub use options::{LineBreakMode, ParseOptions};
pub use payload::{find_payload_spans, MIN_BASE64_RUN, MIN_HEX_RUN};
pub use pipeline::Pipeline;
pub use structure::{
    find_group_spans, remove_spans, strip_structures, StripOutput, StructureStripper,
};

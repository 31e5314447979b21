//! C1: Hunk Reader — the AmigaOS executable container format.

mod reader;
mod types;

pub use reader::HunkReader;
pub use types::{hunk_ids, HeaderInfo, Hunk, HunkKind, HunkSymbol, MemoryType, RawStab};

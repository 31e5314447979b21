//! C4 (debug model builder) and C5 (relocation & query index): the
//! symbolic model built from a decoded hunk stream, and the queries the
//! debugger core runs against it.

mod build;
mod debuginfo;
mod section;
mod symbol;

pub use debuginfo::DebugInfo;
pub use section::{CommonEntry, Section};
pub use symbol::{Segment, SourceLine, Symbol};

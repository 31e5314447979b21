//! Hunk executable loading, STABS debug-info decoding, address↔source
//! mapping, and the generic debugger control loop that drives an emulator
//! through an abstract protocol.
//!
//! `hunkdbg-core` stays free of any async runtime: the `DebuggerProtocol`
//! trait uses native async-fn-in-trait, and the concrete transport (plus
//! the `tokio` runtime that drives it) lives in `hunkdbg-debugger`.

pub mod breakpoint;
pub mod debugger;
pub mod error;
pub mod hunk;
pub mod line_cache;
mod model;
pub mod protocol;
mod stab;

pub use breakpoint::BreakPoint;
pub use debugger::{AddressLookup, Debugger, LineSource};
pub use model::{DebugInfo, Segment, Section, SourceLine, Symbol};
pub use protocol::{DebuggerProtocol, DisassemblyLine, PrologueData, Registers};

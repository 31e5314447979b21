//! Error types for the hunk loader, stab decoder/parser and debugger protocol.
//!
//! The teacher workspace favors plain `Result<_, String>` for anything
//! user-facing; these enums exist only where the caller genuinely needs to
//! match on the *kind* of failure (fatal vs. skip-and-continue, per the
//! recovery policy laid out for each component). Each still prints as a
//! single line.

use std::fmt;

/// Failure while decoding the raw hunk container.
#[derive(Debug)]
pub enum HunkError {
    /// The byte stream ended before a record's payload was fully read.
    Truncated { offset: usize, expected: usize },
    /// A record tag was not one of the recognized `HUNK_*` ids.
    UnknownType { offset: usize, type_id: u32 },
    /// A `HUNK_SYMBOL` or `HUNK_DEBUG` record appeared with no preceding
    /// CODE/DATA/BSS record to attach to.
    DanglingAttachment { offset: usize },
    /// The file produced no CODE/DATA/BSS sections at all.
    NoSections,
    /// A `HUNK_DEBUG` stab carried a type code with no entry in the
    /// recognized tag set, in a position (inside the debug model builder)
    /// where only a recognized tag is acceptable (§4.2, §4.4).
    UnrecognizedStab { type_code: u8 },
    /// A FUN/GSYM/STSYM/LCSYM info string failed to parse. Unlike
    /// LSYM/RSYM/PSYM (skip-and-continue), these abort the enclosing DEBUG
    /// hunk (§4.3's error policy).
    FunctionOrGlobalGrammar {
        stab: &'static str,
        source: StabParseError,
    },
    /// Reading the executable from disk failed.
    Io(std::io::Error),
}

impl fmt::Display for HunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HunkError::Truncated { offset, expected } => write!(
                f,
                "truncated hunk file at offset {offset:#x}: expected {expected} more bytes"
            ),
            HunkError::UnknownType { offset, type_id } => write!(
                f,
                "unrecognized hunk type {type_id:#x} at offset {offset:#x}"
            ),
            HunkError::DanglingAttachment { offset } => write!(
                f,
                "symbol/debug hunk at offset {offset:#x} with no preceding CODE/DATA/BSS hunk"
            ),
            HunkError::NoSections => write!(f, "executable contains no CODE/DATA/BSS hunks"),
            HunkError::UnrecognizedStab { type_code } => {
                write!(f, "unrecognized stab type code {type_code:#04x} in debug hunk")
            }
            HunkError::FunctionOrGlobalGrammar { stab, source } => {
                write!(f, "{stab} info string failed to parse: {source}")
            }
            HunkError::Io(e) => write!(f, "failed to read executable: {e}"),
        }
    }
}

impl std::error::Error for HunkError {}

/// Failure while decoding a `HUNK_DEBUG` payload into stab entries.
#[derive(Debug)]
pub enum StabDecodeError {
    /// A raw stab type code has no entry in the recognized tag set (§4.2)
    /// and appeared where the builder needs a recognized tag.
    UnrecognizedTag { type_code: u8 },
    /// `name_offset` pointed outside the accompanying string table.
    StringOffsetOutOfRange { offset: u32, table_len: usize },
}

impl fmt::Display for StabDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StabDecodeError::UnrecognizedTag { type_code } => {
                write!(f, "unrecognized stab type code {type_code:#04x}")
            }
            StabDecodeError::StringOffsetOutOfRange { offset, table_len } => write!(
                f,
                "stab string offset {offset} out of range for {table_len}-byte string table"
            ),
        }
    }
}

impl std::error::Error for StabDecodeError {}

/// Failure while parsing a stab's textual type/info grammar (§4.3).
#[derive(Debug)]
pub struct StabParseError {
    /// The unconsumed tail of the string at the point parsing failed.
    pub rest: String,
}

impl fmt::Display for StabParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stab grammar error near \"{}\"", self.rest)
    }
}

impl std::error::Error for StabParseError {}

/// Failure from a `DebuggerProtocol` call (§4.7, §7.3).
#[derive(Debug)]
pub enum ProtocolError {
    /// This transport does not implement the requested operation.
    NotSupported,
    /// The transport understood the request but rejected it.
    Failed(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::NotSupported => write!(f, "command not supported by this adapter"),
            ProtocolError::Failed(msg) => write!(f, "command failed: {msg}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

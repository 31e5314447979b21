//! §3 data model: `Symbol`, `SourceLine`, `Segment`.

use std::cmp::Ordering;
use std::fmt;

/// `{ address, name }`. Ordering is by address then by name (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub address: u32,
    pub name: String,
}

impl Symbol {
    pub fn new(address: u32, name: impl Into<String>) -> Self {
        Symbol {
            address,
            name: name.into(),
        }
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address
            .cmp(&other.address)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}: {}", self.address, self.name)
    }
}

/// A resolved `{ address, path?, line, symbol }` view, owned for queries
/// (§3, §9 — the internal per-section storage is index-based so renames
/// propagate; this is the public, cloned snapshot handed back to callers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub address: u32,
    pub path: Option<String>,
    pub line: u32,
    pub symbol: Symbol,
}

impl SourceLine {
    pub fn offset(&self) -> i64 {
        self.address as i64 - self.symbol.address as i64
    }
}

impl PartialOrd for SourceLine {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SourceLine {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address
            .cmp(&other.address)
            .then_with(|| self.symbol.name.cmp(&other.symbol.name))
    }
}

impl fmt::Display for SourceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.address)?;
        let offset = self.offset();
        if offset == 0 {
            write!(f, " at <{}>", self.symbol.name)?;
        } else {
            write!(f, " at <{}+{}>", self.symbol.name, offset)?;
        }
        if let Some(path) = &self.path {
            write!(f, " in \"{path}:{}\"", self.line)?;
        }
        Ok(())
    }
}

/// Runtime placement of one loaded hunk, as reported by the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: u32,
    pub size: u32,
}

//! Hunk record tags and their decoded payloads.

/// Memory type flags packed into the upper 2 bits of a hunk's size longword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    /// No preference.
    Any,
    /// Must be allocated from chip RAM.
    Chip,
    /// Prefer fast RAM.
    Fast,
    /// Extended memory attributes; the raw flag word follows in the file.
    Extended,
}

impl MemoryType {
    pub fn from_flags(word: u32) -> Self {
        match (word >> 30) & 0x3 {
            0 => MemoryType::Any,
            1 => MemoryType::Fast,
            2 => MemoryType::Chip,
            _ => MemoryType::Extended,
        }
    }
}

/// Which of the three loadable kinds a CODE/DATA/BSS hunk is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HunkKind {
    Code,
    Data,
    Bss,
}

impl HunkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HunkKind::Code => "CODE",
            HunkKind::Data => "DATA",
            HunkKind::Bss => "BSS",
        }
    }
}

/// Raw hunk type ids, as they appear (low 30 bits) in the file.
pub mod hunk_ids {
    pub const HUNK_UNIT: u32 = 0x3E7;
    pub const HUNK_NAME: u32 = 0x3E8;
    pub const HUNK_CODE: u32 = 0x3E9;
    pub const HUNK_DATA: u32 = 0x3EA;
    pub const HUNK_BSS: u32 = 0x3EB;
    pub const HUNK_RELOC32: u32 = 0x3EC;
    pub const HUNK_RELRELOC16: u32 = 0x3ED;
    pub const HUNK_RELRELOC8: u32 = 0x3EE;
    pub const HUNK_EXT: u32 = 0x3EF;
    pub const HUNK_SYMBOL: u32 = 0x3F0;
    pub const HUNK_DEBUG: u32 = 0x3F1;
    pub const HUNK_END: u32 = 0x3F2;
    pub const HUNK_HEADER: u32 = 0x3F3;
    pub const HUNK_OVERLAY: u32 = 0x3F5;
    pub const HUNK_BREAK: u32 = 0x3F6;
    pub const HUNK_RELOC32SHORT: u32 = 0x3FC;
    pub const HUNK_RELRELOC32: u32 = 0x3FD;
    pub const HUNK_ABSRELOC16: u32 = 0x3FE;
}

/// A single `{name, value}` entry in a `HUNK_SYMBOL` record, before its
/// address has been shifted by the enclosing hunk's running base.
#[derive(Debug, Clone)]
pub struct HunkSymbol {
    pub name: String,
    pub refs: u32,
}

/// A single decoded stab entry, ready for the debug model builder.
/// See [`crate::stab::StabKind`] for the tag set.
#[derive(Debug, Clone)]
pub struct RawStab {
    pub kind: crate::stab::StabKind,
    pub value: u32,
    pub desc: u32,
    pub str: String,
}

/// The `HUNK_HEADER` table: resident library names (ignored), table size,
/// first/last hunk indices, and the per-hunk size table. Only consumed by
/// `dumphunk`; the debug model builder does not need it.
#[derive(Debug, Clone)]
pub struct HeaderInfo {
    pub table_size: u32,
    pub first_hunk: u32,
    pub last_hunk: u32,
    pub hunk_sizes: Vec<u32>,
}

/// One decoded hunk record in file order.
#[derive(Debug, Clone)]
pub enum Hunk {
    Header(HeaderInfo),
    Code { size: u32, mem: MemoryType },
    Data { size: u32, mem: MemoryType },
    Bss { size: u32, mem: MemoryType },
    Symbol(Vec<HunkSymbol>),
    Debug { stabs: Vec<RawStab>, strings: Vec<u8> },
    /// HUNK_END / HUNK_RELOC32 / HUNK_UNIT / ... — tolerated, carries no
    /// information the core needs.
    Ignored(u32),
}

impl Hunk {
    pub fn kind(&self) -> Option<HunkKind> {
        match self {
            Hunk::Code { .. } => Some(HunkKind::Code),
            Hunk::Data { .. } => Some(HunkKind::Data),
            Hunk::Bss { .. } => Some(HunkKind::Bss),
            _ => None,
        }
    }

    pub fn size(&self) -> Option<u32> {
        match self {
            Hunk::Code { size, .. } | Hunk::Data { size, .. } | Hunk::Bss { size, .. } => {
                Some(*size)
            }
            _ => None,
        }
    }
}

//! Stab type-code tags (§4.2).
//!
//! Codes follow the a.out STABS numbering handed down from GNU `stab.def`,
//! with two Amiga-convention extensions (`Data`/`Bss`) for the bare section
//! symbols the hunk debug payload carries alongside the source-line-bearing
//! `Stsym`/`Lcsym` entries.

/// A decoded stab's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StabKind {
    So,
    Sol,
    Fun,
    Sline,
    Gsym,
    Stsym,
    Lcsym,
    Data,
    Bss,
    Lsym,
    Rsym,
    Psym,
    Lbrac,
    Rbrac,
    Text,
    /// A raw type code with no entry in the recognized tag set.
    Other(u8),
}

/// Standard a.out/GNU stab numeric codes (see `stab.def`).
pub mod codes {
    pub const N_GSYM: u8 = 0x20;
    pub const N_FUN: u8 = 0x24;
    pub const N_STSYM: u8 = 0x26;
    pub const N_LCSYM: u8 = 0x28;
    pub const N_RSYM: u8 = 0x40;
    pub const N_SLINE: u8 = 0x44;
    pub const N_SO: u8 = 0x64;
    pub const N_LSYM: u8 = 0x80;
    pub const N_SOL: u8 = 0x84;
    pub const N_PSYM: u8 = 0xa0;
    pub const N_LBRAC: u8 = 0xc0;
    pub const N_RBRAC: u8 = 0xe0;
    /// Amiga hunk-debug extension: a bare DATA-section symbol, carrying no
    /// source-line attachment (unlike `N_STSYM`).
    pub const N_DATA: u8 = 0x0c;
    /// Amiga hunk-debug extension: a bare BSS-section symbol (unlike
    /// `N_LCSYM`).
    pub const N_BSS: u8 = 0x0e;
    /// Reserved, always a no-op when decoded.
    pub const N_TEXT: u8 = 0x04;
}

impl StabKind {
    pub fn from_code(type_code: u8) -> Self {
        use codes::*;
        match type_code {
            N_SO => StabKind::So,
            N_SOL => StabKind::Sol,
            N_FUN => StabKind::Fun,
            N_SLINE => StabKind::Sline,
            N_GSYM => StabKind::Gsym,
            N_STSYM => StabKind::Stsym,
            N_LCSYM => StabKind::Lcsym,
            N_DATA => StabKind::Data,
            N_BSS => StabKind::Bss,
            N_LSYM => StabKind::Lsym,
            N_RSYM => StabKind::Rsym,
            N_PSYM => StabKind::Psym,
            N_LBRAC => StabKind::Lbrac,
            N_RBRAC => StabKind::Rbrac,
            N_TEXT => StabKind::Text,
            other => StabKind::Other(other),
        }
    }

    /// Whether the debug model builder treats this tag as fatal when it
    /// appears somewhere only a recognized tag belongs (§4.2, §4.4).
    pub fn is_recognized(self) -> bool {
        !matches!(self, StabKind::Other(_))
    }
}

impl std::fmt::Display for StabKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StabKind::So => "SO",
            StabKind::Sol => "SOL",
            StabKind::Fun => "FUN",
            StabKind::Sline => "SLINE",
            StabKind::Gsym => "GSYM",
            StabKind::Stsym => "STSYM",
            StabKind::Lcsym => "LCSYM",
            StabKind::Data => "DATA",
            StabKind::Bss => "BSS",
            StabKind::Lsym => "LSYM",
            StabKind::Rsym => "RSYM",
            StabKind::Psym => "PSYM",
            StabKind::Lbrac => "LBRAC",
            StabKind::Rbrac => "RBRAC",
            StabKind::Text => "TEXT",
            StabKind::Other(code) => return write!(f, "UNKNOWN({code:#04x})"),
        };
        f.write_str(s)
    }
}

//! C7 (abstract half): the capability trait the debugger core drives, and
//! its value types. The concrete FS-UAE transport lives in the
//! `hunkdbg-debugger` binary crate, which is the only place in the
//! workspace that needs an async runtime.
//!
//! Trait methods are plain `async fn`s (stable native "async fn in trait"),
//! not `#[async_trait]` — that macro has no precedent anywhere in this
//! workspace and pulling it in just to let `hunkdbg-core` stay free of a
//! runtime dependency isn't worth it.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ProtocolError;
use crate::model::Segment;

/// The m68k register file, keyed by name. All values are 32-bit except
/// `SR` (16-bit) — carried widened so the map has one value type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    values: BTreeMap<&'static str, u32>,
}

pub const REGISTER_NAMES: &[&str] = &[
    "D0", "D1", "D2", "D3", "D4", "D5", "D6", "D7", "A0", "A1", "A2", "A3", "A4", "A5", "A6", "A7",
    "PC", "USP", "ISP", "SR",
];

impl Registers {
    pub fn new() -> Self {
        Registers {
            values: REGISTER_NAMES.iter().map(|&n| (n, 0)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &'static str, value: u32) {
        self.values.insert(name, value);
    }

    pub fn pc(&self) -> u32 {
        self.get("PC").unwrap_or(0)
    }

    pub fn sr(&self) -> u16 {
        self.get("SR").unwrap_or(0) as u16
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in [&["D0", "D1", "D2", "D3"][..], &["D4", "D5", "D6", "D7"], &["A0", "A1", "A2", "A3"]] {
            for name in chunk {
                write!(f, "{name}={:08X} ", self.get(name).unwrap_or(0))?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "A4={:08X} A5={:08X} A6={:08X} A7={:08X}",
            self.get("A4").unwrap_or(0),
            self.get("A5").unwrap_or(0),
            self.get("A6").unwrap_or(0),
            self.get("A7").unwrap_or(0)
        )?;
        write!(
            f,
            "PC={:08X} USP={:08X} ISP={:08X} SR={:04X}",
            self.pc(),
            self.get("USP").unwrap_or(0),
            self.get("ISP").unwrap_or(0),
            self.sr()
        )
    }
}

/// One disassembled instruction: `opcode` is the raw hex-encoded
/// instruction bytes, always an even-length string (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisassemblyLine {
    pub address: u32,
    pub opcode: String,
    pub mnemonic: String,
}

impl DisassemblyLine {
    /// The address immediately following this instruction. Returns `None`
    /// when `opcode` has odd length — malformed output from the adapter
    /// rather than a real instruction (§9's "reject odd-length opcode
    /// strings" fix).
    pub fn next_address(&self) -> Option<u32> {
        if self.opcode.len() % 2 != 0 {
            return None;
        }
        Some(self.address + (self.opcode.len() / 2) as u32)
    }
}

/// The register/break-address snapshot delivered after `cont`/`step`
/// complete and resolve at a new stop (§4.6's prologue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrologueData {
    pub regs: Registers,
    pub break_addr: Option<u32>,
}

/// Abstract operations the debugger core drives (§4.7). Default bodies all
/// return `NotSupported`, so a transport only overrides what it implements.
pub trait DebuggerProtocol {
    async fn cont(&mut self) -> Result<(), ProtocolError> {
        Err(ProtocolError::NotSupported)
    }

    async fn step(&mut self) -> Result<(), ProtocolError> {
        Err(ProtocolError::NotSupported)
    }

    async fn read_memory(&mut self, addr: u32, len: u32) -> Result<String, ProtocolError> {
        let _ = (addr, len);
        Err(ProtocolError::NotSupported)
    }

    async fn read_all_registers(&mut self) -> Result<Registers, ProtocolError> {
        Err(ProtocolError::NotSupported)
    }

    async fn insert_hwbreak(&mut self, addr: u32) -> Result<bool, ProtocolError> {
        let _ = addr;
        Err(ProtocolError::NotSupported)
    }

    async fn remove_hwbreak(&mut self, addr: u32) -> Result<bool, ProtocolError> {
        let _ = addr;
        Err(ProtocolError::NotSupported)
    }

    async fn disassemble(&mut self, addr: u32, n: u32) -> Result<Vec<DisassemblyLine>, ProtocolError> {
        let _ = (addr, n);
        Err(ProtocolError::NotSupported)
    }

    async fn fetch_segments(&mut self) -> Result<Vec<Segment>, ProtocolError> {
        Err(ProtocolError::NotSupported)
    }

    async fn kill(&mut self) -> Result<(), ProtocolError> {
        Err(ProtocolError::NotSupported)
    }

    async fn prologue(&mut self) -> Result<PrologueData, ProtocolError> {
        Err(ProtocolError::NotSupported)
    }

    /// Send raw, adapter-specific text (the debugger core's `:RAW` command).
    async fn send_raw(&mut self, text: &str) -> Result<(), ProtocolError> {
        let _ = text;
        Err(ProtocolError::NotSupported)
    }

    /// Reads one byte at `addr`, built on [`Self::read_memory`].
    async fn read_byte(&mut self, addr: u32) -> Result<u8, ProtocolError> {
        let hex = self.read_memory(addr, 1).await?;
        u8::from_str_radix(hex.trim(), 16).map_err(|e| ProtocolError::Failed(e.to_string()))
    }

    /// Reads one big-endian word at `addr`, built on [`Self::read_memory`].
    async fn read_word(&mut self, addr: u32) -> Result<u16, ProtocolError> {
        let hex = self.read_memory(addr, 2).await?;
        u16::from_str_radix(hex.trim(), 16).map_err(|e| ProtocolError::Failed(e.to_string()))
    }

    /// Reads one big-endian longword at `addr`, built on [`Self::read_memory`].
    async fn read_long(&mut self, addr: u32) -> Result<u32, ProtocolError> {
        let hex = self.read_memory(addr, 4).await?;
        u32::from_str_radix(hex.trim(), 16).map_err(|e| ProtocolError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_default_to_zero_and_round_trip() {
        let mut regs = Registers::new();
        assert_eq!(regs.pc(), 0);
        regs.set("PC", 0x1000);
        assert_eq!(regs.pc(), 0x1000);
    }

    #[test]
    fn disassembly_line_rejects_odd_length_opcode() {
        let line = DisassemblyLine {
            address: 0x1000,
            opcode: "4e7".to_string(),
            mnemonic: "rts".to_string(),
        };
        assert_eq!(line.next_address(), None);
    }

    #[test]
    fn disassembly_line_computes_next_address() {
        let line = DisassemblyLine {
            address: 0x1000,
            opcode: "4e71".to_string(),
            mnemonic: "nop".to_string(),
        };
        assert_eq!(line.next_address(), Some(0x1002));
    }
}

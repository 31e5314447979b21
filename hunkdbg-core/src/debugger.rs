//! C6: the generic debugger core — command dispatch, breakpoint registry,
//! source-aware stop display and prologue handling — built against any
//! [`DebuggerProtocol`] implementor so this crate never needs an async
//! runtime of its own.

use crate::breakpoint::BreakPoint;
use crate::line_cache::LineCache;
use crate::model::DebugInfo;
use crate::protocol::{DebuggerProtocol, Registers};

/// Supplies one line of user input at a time. `hunkdbg-debugger` implements
/// this over async stdin; tests can implement it over a fixed `Vec<String>`.
pub trait LineSource {
    async fn next_line(&mut self) -> Option<String>;
}

/// `address_of`'s resolution, reported back so callers can print a
/// diagnostic distinguishing "no debug info loaded" from "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressLookup {
    Found(u32),
    NotFound,
}

pub struct Debugger<P: DebuggerProtocol> {
    protocol: P,
    debug_info: Option<DebugInfo>,
    breakpoints: Vec<BreakPoint>,
    registers: Registers,
    line_cache: LineCache,
}

impl<P: DebuggerProtocol> Debugger<P> {
    pub fn new(protocol: P, debug_info: Option<DebugInfo>) -> Self {
        Debugger {
            protocol,
            debug_info,
            breakpoints: Vec::new(),
            registers: Registers::new(),
            line_cache: LineCache::new(),
        }
    }

    /// Resolves a user-supplied token: hex integer, else `file:line` (if
    /// debug info is loaded), else a symbol name (§4.6).
    pub fn address_of(&self, token: &str) -> AddressLookup {
        let hex = token.strip_prefix("0x").unwrap_or(token);
        if let Ok(addr) = u32::from_str_radix(hex, 16) {
            return AddressLookup::Found(addr);
        }
        if let Some(info) = &self.debug_info {
            if let Some(addr) = info.ask_source_line(token) {
                return AddressLookup::Found(addr);
            }
            if let Some(addr) = info.ask_symbol(token) {
                return AddressLookup::Found(addr);
            }
        }
        AddressLookup::NotFound
    }

    /// [`Self::address_of`], collapsed to a plain `Option` for call sites
    /// that don't need to distinguish the failure reason.
    pub fn resolve(&self, token: &str) -> Option<u32> {
        self.address_of(token).into()
    }

    /// One-line description of `pc` for the stop display: a resolved
    /// source line if debug info covers it, else a bare hex address.
    pub fn break_info(&self, pc: u32) -> String {
        match self.debug_info.as_ref().and_then(|info| info.ask_address(pc)) {
            Some(sl) => format!("{sl}"),
            None => format!("{pc:08X}"),
        }
    }

    pub fn break_lookup(&self, address: u32) -> Option<&BreakPoint> {
        self.breakpoints.iter().find(|b| b.address == address)
    }

    pub fn break_show(&self) -> Vec<BreakPoint> {
        let mut bps = self.breakpoints.clone();
        bps.sort_by_key(|b| b.number);
        bps
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn debug_info(&self) -> Option<&DebugInfo> {
        self.debug_info.as_ref()
    }

    /// Unwraps the adapter, e.g. so the caller can await the emulator
    /// subprocess's own exit status after the command loop returns.
    pub fn into_protocol(self) -> P {
        self.protocol
    }

    /// Awaits the protocol's post-resume data packet, stores the new
    /// register snapshot, and prints the stop display (§4.6).
    pub async fn prologue(&mut self) -> String {
        match self.protocol.prologue().await {
            Ok(data) => {
                self.registers = data.regs;
                let pc = self.registers.pc();
                let mut out = format!("{}\n", self.registers);
                out.push_str(&self.stop_display(pc).await);
                out
            }
            Err(e) => format!("{e}"),
        }
    }

    /// `Stopped at ...` plus either five lines of source context or, when
    /// `pc` isn't covered by debug info, a five-instruction disassembly
    /// starting at `pc` (§4.6).
    async fn stop_display(&mut self, pc: u32) -> String {
        let mut out = format!("Stopped at {}\n", self.break_info(pc));
        let resolved = self.debug_info.as_ref().and_then(|info| info.ask_address(pc));
        match resolved.as_ref().and_then(|sl| sl.path.as_deref().map(|p| (p, sl.line))) {
            Some((path, line)) => {
                for (n, text) in self.line_cache.context(path, line) {
                    let marker = if n == line { ">" } else { " " };
                    out.push_str(&format!("{marker}{n:>5} {text}\n"));
                }
            }
            None => match self.protocol.disassemble(pc, 5).await {
                Ok(lines) => {
                    for l in &lines {
                        out.push_str(&format!("{:08X}  {:<16} {}\n", l.address, l.opcode, l.mnemonic));
                    }
                }
                Err(e) => out.push_str(&format!("{e}\n")),
            },
        }
        out
    }

    pub async fn do_cont(&mut self) -> String {
        match self.protocol.cont().await {
            Ok(()) => self.prologue().await,
            Err(e) => format!("{e}"),
        }
    }

    pub async fn do_step(&mut self) -> String {
        match self.protocol.step().await {
            Ok(()) => self.prologue().await,
            Err(e) => format!("{e}"),
        }
    }

    pub async fn do_memory_read(&mut self, addr: u32, len: u32) -> String {
        match self.protocol.read_memory(addr, len).await {
            Ok(hex) => hex,
            Err(e) => format!("{e}"),
        }
    }

    pub async fn do_break_insert(&mut self, token: &str) -> String {
        let AddressLookup::Found(addr) = self.address_of(token) else {
            return format!("Unresolved location: {token}");
        };
        if self.break_lookup(addr).is_some() {
            return format!("Breakpoint already set at {addr:08X}");
        }
        match self.protocol.insert_hwbreak(addr).await {
            Ok(true) => {
                let bp = BreakPoint::new(addr);
                let number = bp.number;
                self.breakpoints.push(bp);
                format!("Breakpoint {number} at {addr:08X}")
            }
            Ok(false) => format!("Failed to insert breakpoint at {addr:08X}"),
            Err(e) => format!("{e}"),
        }
    }

    pub async fn do_break_remove(&mut self, token: &str) -> String {
        let AddressLookup::Found(addr) = self.address_of(token) else {
            return format!("Unresolved location: {token}");
        };
        let Some(pos) = self.breakpoints.iter().position(|b| b.address == addr) else {
            return format!("No breakpoint at {addr:08X}");
        };
        match self.protocol.remove_hwbreak(addr).await {
            Ok(true) => {
                self.breakpoints.remove(pos);
                format!("Breakpoint removed at {addr:08X}")
            }
            Ok(false) => format!("Failed to remove breakpoint at {addr:08X}"),
            Err(e) => format!("{e}"),
        }
    }

    pub fn do_break_show(&self) -> String {
        self.break_show()
            .iter()
            .map(|b| format!("#{} at {:08X}", b.number, b.address))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn do_disassemble_range(&mut self, start: u32, end: u32) -> String {
        let n = ((end.saturating_sub(start)) / 2).max(1);
        match self.protocol.disassemble(start, n).await {
            Ok(lines) => lines
                .iter()
                .map(|l| format!("{:08X}  {:<16} {}", l.address, l.opcode, l.mnemonic))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => format!("{e}"),
        }
    }

    pub fn do_info_registers(&self) -> String {
        format!("{}", self.registers)
    }

    pub fn do_debuginfo_read(&mut self, path: &str) -> String {
        match DebugInfo::from_file(path) {
            Ok(info) => {
                self.debug_info = Some(info);
                format!("Loaded debug info from {path}")
            }
            Err(e) => format!("Failed to associate debug info: {e}"),
        }
    }

    pub fn do_relocate(&mut self, segments: &[crate::model::Segment]) -> String {
        match &mut self.debug_info {
            Some(info) if info.relocate(segments) => "Debug info relocated".to_string(),
            Some(_) => "Failed to associate debug info with loaded segments".to_string(),
            None => "No debug info loaded".to_string(),
        }
    }

    pub async fn do_where_am_i(&mut self) -> String {
        let pc = self.registers.pc();
        self.stop_display(pc).await
    }

    pub async fn do_quit(&mut self) -> String {
        match self.protocol.kill().await {
            Ok(()) => "Emulator killed".to_string(),
            Err(e) => format!("{e}"),
        }
    }

    async fn do_raw(&mut self, text: &str) -> String {
        match self.protocol.send_raw(text).await {
            Ok(()) => String::new(),
            Err(e) => format!("{e}"),
        }
    }

    /// Parses and dispatches one command line (§6's REPL surface), always
    /// producing output text. `q` (quit) is handled here like any other
    /// command; [`Self::run`] checks the raw line itself to decide when to
    /// stop reading, after printing this command's output.
    pub async fn do_command(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        let mut parts = line.splitn(2, char::is_whitespace);
        let op = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        if let Some(raw) = op.strip_prefix(':') {
            let mut raw_text = raw.to_string();
            if !rest.is_empty() {
                raw_text.push(' ');
                raw_text.push_str(rest);
            }
            return Some(self.do_raw(&raw_text).await);
        }

        Some(match op {
            "mr" => {
                let mut args = rest.split_whitespace();
                match (args.next().and_then(|a| self.resolve(a)), args.next().and_then(|n| n.parse().ok())) {
                    (Some(addr), Some(len)) => self.do_memory_read(addr, len).await,
                    _ => "Usage: mr ADDR LEN".to_string(),
                }
            }
            "b" => self.do_break_insert(rest).await,
            "bd" => self.do_break_remove(rest).await,
            "bl" => self.do_break_show(),
            "dr" => {
                let mut args = rest.split_whitespace();
                match (args.next().and_then(|a| self.resolve(a)), args.next().and_then(|a| self.resolve(a))) {
                    (Some(a), Some(b)) => self.do_disassemble_range(a, b).await,
                    _ => "Usage: dr START END".to_string(),
                }
            }
            "c" => self.do_cont().await,
            "s" => self.do_step().await,
            "ir" => self.do_info_registers(),
            "q" => {
                let msg = self.do_quit().await;
                return Some(msg);
            }
            "Zf" => self.do_debuginfo_read(rest),
            "!" => self.do_where_am_i().await,
            "" => String::new(),
            _ => "Unknown command".to_string(),
        })
    }

    /// Drives the command loop until the source runs out of lines or `q`
    /// is issued (§4.6, §5 — EOF is treated as an implicit `continue`).
    pub async fn run(&mut self, source: &mut impl LineSource) {
        println!("{}", self.prologue().await);
        loop {
            let Some(line) = source.next_line().await else {
                // EOF: one implicit `continue`, then stop reading — stdin
                // won't produce more lines (§5).
                self.do_cont().await;
                break;
            };
            let quit = line.trim() == "q";
            if let Some(output) = self.do_command(&line).await {
                if !output.is_empty() {
                    println!("{output}");
                }
            }
            if quit {
                break;
            }
        }
    }
}

impl From<AddressLookup> for Option<u32> {
    fn from(lookup: AddressLookup) -> Self {
        match lookup {
            AddressLookup::Found(addr) => Some(addr),
            AddressLookup::NotFound => None,
        }
    }
}

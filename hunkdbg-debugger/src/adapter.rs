//! Concrete `DebuggerProtocol` transport: drives `fs-uae`'s built-in console
//! debugger over its subprocess stdin/stderr (§4.7, §5).
//!
//! The subprocess write side is a plain async write; the read side runs as
//! a background task (the "I/O pump") that assembles whole-response text
//! blocks terminated by a `>` prompt line and hands each one back through a
//! freshly created `oneshot` channel, per the single-outstanding-request
//! ordering described in §5 ("no interleaving").

use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex};

use hunkdbg_core::{DebuggerProtocol, DisassemblyLine, PrologueData, Registers, Segment};

type ResponseSlot = Arc<Mutex<Option<oneshot::Sender<String>>>>;

pub struct FsUaeAdapter {
    child: Child,
    stdin: ChildStdin,
    slot: ResponseSlot,
    pump: tokio::task::JoinHandle<()>,
    breakpoint_retries: u32,
}

impl FsUaeAdapter {
    /// Launches `fs-uae --console_debugger=1 --stdout=1 [-c CONFIG]` and
    /// starts the I/O pump over its stderr (the prompt/response stream).
    /// `breakpoint_retries` bounds the retry loop in [`Self::insert_hwbreak`].
    pub async fn spawn(fsuae_bin: &str, config: Option<&str>, breakpoint_retries: u32) -> std::io::Result<Self> {
        let mut cmd = Command::new(fsuae_bin);
        cmd.arg("--console_debugger=1").arg("--stdout=1");
        if let Some(config) = config {
            cmd.arg("-c").arg(config);
        }
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        let stdin = child.stdin.take().expect("stdin was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let slot: ResponseSlot = Arc::new(Mutex::new(None));
        let pump = tokio::spawn(run_pump(stderr, slot.clone()));

        Ok(FsUaeAdapter {
            child,
            stdin,
            slot,
            pump,
            breakpoint_retries,
        })
    }

    async fn send_command(&mut self, text: &str) -> Result<String, hunkdbg_core::error::ProtocolError> {
        use hunkdbg_core::error::ProtocolError;

        let (tx, rx) = oneshot::channel();
        *self.slot.lock().await = Some(tx);

        self.stdin
            .write_all(format!("{text}\n").as_bytes())
            .await
            .map_err(|e| ProtocolError::Failed(e.to_string()))?;

        rx.await.map_err(|_| ProtocolError::Failed("emulator closed the debugger console".to_string()))
    }
}

/// Reads lines from `stderr` until a bare `>` (the fs-uae prompt), hands
/// the accumulated block to whoever is currently waiting in `slot`, then
/// resets for the next response. A response with nobody waiting (unasked
/// output, e.g. startup banner) is dropped.
async fn run_pump(stderr: tokio::process::ChildStderr, slot: ResponseSlot) {
    let mut lines = BufReader::new(stderr).lines();
    let mut buffer = String::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim() == ">" {
                    let mut guard = slot.lock().await;
                    if let Some(tx) = guard.take() {
                        let _ = tx.send(std::mem::take(&mut buffer));
                    } else {
                        buffer.clear();
                    }
                } else {
                    buffer.push_str(&line);
                    buffer.push('\n');
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
}

impl DebuggerProtocol for FsUaeAdapter {
    async fn cont(&mut self) -> Result<(), hunkdbg_core::error::ProtocolError> {
        self.send_command("g").await.map(|_| ())
    }

    async fn step(&mut self) -> Result<(), hunkdbg_core::error::ProtocolError> {
        self.send_command("t").await.map(|_| ())
    }

    async fn read_memory(&mut self, addr: u32, len: u32) -> Result<String, hunkdbg_core::error::ProtocolError> {
        let text = self.send_command(&format!("m {addr:08x} {len:x}")).await?;
        Ok(parse_memory_dump(&text))
    }

    async fn read_all_registers(&mut self) -> Result<Registers, hunkdbg_core::error::ProtocolError> {
        let text = self.send_command("r").await?;
        Ok(parse_registers(&text))
    }

    async fn insert_hwbreak(&mut self, addr: u32) -> Result<bool, hunkdbg_core::error::ProtocolError> {
        for attempt in 0..=self.breakpoint_retries {
            let text = self.send_command(&format!("bp {addr:08x}")).await?;
            if !text.to_lowercase().contains("error") {
                return Ok(true);
            }
            if attempt < self.breakpoint_retries {
                tracing::debug!("breakpoint insert at {addr:08X} rejected, retrying");
            }
        }
        Ok(false)
    }

    async fn remove_hwbreak(&mut self, addr: u32) -> Result<bool, hunkdbg_core::error::ProtocolError> {
        let text = self.send_command(&format!("bc {addr:08x}")).await?;
        Ok(!text.to_lowercase().contains("error"))
    }

    async fn disassemble(&mut self, addr: u32, n: u32) -> Result<Vec<DisassemblyLine>, hunkdbg_core::error::ProtocolError> {
        let text = self.send_command(&format!("d {addr:08x} {n}")).await?;
        Ok(parse_disassembly(&text))
    }

    async fn fetch_segments(&mut self) -> Result<Vec<Segment>, hunkdbg_core::error::ProtocolError> {
        let text = self.send_command("segs").await?;
        Ok(parse_segments(&text))
    }

    async fn kill(&mut self) -> Result<(), hunkdbg_core::error::ProtocolError> {
        let _ = self.send_command("q").await;
        let _ = self.child.start_kill();
        self.pump.abort();
        Ok(())
    }

    async fn prologue(&mut self) -> Result<PrologueData, hunkdbg_core::error::ProtocolError> {
        let regs = self.read_all_registers().await?;
        Ok(PrologueData { regs, break_addr: None })
    }

    async fn send_raw(&mut self, text: &str) -> Result<(), hunkdbg_core::error::ProtocolError> {
        self.send_command(text).await.map(|_| ())
    }
}

impl FsUaeAdapter {
    /// Awaits the subprocess's exit, for the top-level runtime to report
    /// this process's own exit code from (§6 "exit codes").
    pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }
}

/// Five lines of four register pairs (`D0..D7`, `A0..A7`), a status-flag
/// line, a prefetch line, and a next-PC line (§4.7). The status register's
/// bits pack `T S M 0 IMASK(3) 000 X N V C`.
fn parse_registers(text: &str) -> Registers {
    let mut regs = Registers::new();
    for line in text.lines() {
        for pair in line.split_whitespace() {
            if let Some((name, value)) = pair.split_once('=') {
                if let Ok(v) = u32::from_str_radix(value.trim_start_matches("0x"), 16) {
                    if let Some(&canon) = hunkdbg_core::protocol::REGISTER_NAMES
                        .iter()
                        .find(|n| n.eq_ignore_ascii_case(name))
                    {
                        regs.set(canon, v);
                    }
                }
            }
        }
    }
    regs
}

fn parse_memory_dump(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("")
}

/// 8-column hex PC, columns 8-34 hex opcode bytes, remainder mnemonic.
fn parse_disassembly(text: &str) -> Vec<DisassemblyLine> {
    text.lines()
        .filter_map(|line| {
            if line.len() < 8 {
                return None;
            }
            let addr = u32::from_str_radix(&line[0..8], 16).ok()?;
            let rest = line.get(8..).unwrap_or("").trim_start();
            let mut cols = rest.splitn(2, "  ");
            let opcode: String = cols
                .next()
                .unwrap_or("")
                .chars()
                .filter(|c| c.is_ascii_hexdigit())
                .collect();
            let mnemonic = cols.next().unwrap_or("").trim().to_string();
            Some(DisassemblyLine {
                address: addr,
                opcode,
                mnemonic,
            })
        })
        .collect()
}

fn parse_segments(text: &str) -> Vec<Segment> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let start = u32::from_str_radix(parts.next()?.trim_start_matches("0x"), 16).ok()?;
            let size = u32::from_str_radix(parts.next()?.trim_start_matches("0x"), 16).ok()?;
            Some(Segment { start, size })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register_pairs_case_insensitively() {
        let regs = parse_registers("d0=00000001 d1=00000002\npc=00001000 sr=2700");
        assert_eq!(regs.get("D0"), Some(1));
        assert_eq!(regs.get("PC"), Some(0x1000));
        assert_eq!(regs.get("SR"), Some(0x2700));
    }

    #[test]
    fn parses_disassembly_lines() {
        let lines = parse_disassembly("00001000  4e71              nop\n00001002  4e75              rts");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].address, 0x1000);
        assert_eq!(lines[0].opcode, "4e71");
        assert_eq!(lines[0].mnemonic, "nop");
    }

    #[test]
    fn parses_segment_table() {
        let segs = parse_segments("0x00001000 0x00000100\n0x00002000 0x00000200");
        assert_eq!(segs, vec![
            Segment { start: 0x1000, size: 0x100 },
            Segment { start: 0x2000, size: 0x200 },
        ]);
    }
}

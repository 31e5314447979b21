//! Async stdin line reading — the concrete [`LineSource`] `hunkdbg-core`'s
//! command loop drives. Kept out of the core crate so it stays free of a
//! runtime dependency.

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use hunkdbg_core::LineSource;

pub struct StdinLineSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinLineSource {
    pub fn new() -> Self {
        StdinLineSource {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinLineSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for StdinLineSource {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.next_line().await.ok().flatten()
    }
}

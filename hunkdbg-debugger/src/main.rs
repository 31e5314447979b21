//! `uaedbg`: launches `fs-uae` under the debugger, optionally loads
//! `DebugInfo` from an executable, and drives the command loop (§5, §6).

mod adapter;
mod config;
mod line_source;

use clap::Parser;
use hunkdbg_core::{DebugInfo, Debugger};

use adapter::FsUaeAdapter;
use config::Config;
use line_source::StdinLineSource;

#[derive(Debug, Parser)]
#[command(name = "uaedbg", about = "Interactive source-level debugger front-end for FS-UAE")]
struct Cli {
    /// Config file passed through to fs-uae.
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Executable to load DebugInfo from.
    #[arg(short = 'e', long = "executable")]
    executable: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    let debug_info = match &cli.executable {
        Some(path) => match DebugInfo::from_file(path) {
            Ok(info) => Some(info),
            Err(e) => {
                eprintln!("Failed to load debug info from {}: {e}", path.display());
                None
            }
        },
        None => None,
    };

    let mut adapter = match FsUaeAdapter::spawn(
        config.fsuae_bin(),
        cli.config.as_deref().or(config.config_path.as_deref()),
        config.breakpoint_retries(),
    )
    .await
    {
        Ok(adapter) => adapter,
        Err(e) => {
            eprintln!("Failed to launch {}: {e}", config.fsuae_bin());
            std::process::exit(1);
        }
    };

    let debug_info = relocate_to_runtime_segments(&mut adapter, debug_info).await;

    // Ctrl-C at the terminal already reaches fs-uae via the shared
    // foreground process group; this sink only keeps our own process from
    // taking the default terminate-on-SIGINT action while a request is in
    // flight (§5 — cancellation never interrupts an awaiting operation).
    tokio::spawn(async {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                break;
            }
            tracing::debug!("SIGINT observed; forwarded to fs-uae via the shared process group");
        }
    });

    let mut debugger = Debugger::new(adapter, debug_info);
    let mut stdin = StdinLineSource::new();
    debugger.run(&mut stdin).await;

    let status = debugger.into_protocol().wait().await;
    match status {
        Ok(status) => std::process::exit(status.code().unwrap_or(0)),
        Err(e) => {
            tracing::error!("failed to wait on fs-uae: {e}");
            std::process::exit(1);
        }
    }
}

async fn relocate_to_runtime_segments(adapter: &mut FsUaeAdapter, debug_info: Option<DebugInfo>) -> Option<DebugInfo> {
    use hunkdbg_core::DebuggerProtocol;

    let mut debug_info = debug_info?;
    match adapter.fetch_segments().await {
        Ok(segments) if debug_info.relocate(&segments) => Some(debug_info),
        Ok(_) => {
            eprintln!("Failed to associate debug info with loaded segments");
            None
        }
        Err(e) => {
            eprintln!("Could not fetch runtime segments: {e}");
            None
        }
    }
}

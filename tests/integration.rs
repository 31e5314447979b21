use std::io::Write;
use std::path::PathBuf;
use std::process::{self, Stdio};

/// A minimal, hand-assembled HUNK executable: one empty-ish CODE hunk
/// inside a HEADER/END pair. Exercises the reader without needing an m68k
/// toolchain to produce a real fixture.
fn minimal_hunk_executable() -> Vec<u8> {
    const HUNK_HEADER: u32 = 0x3F3;
    const HUNK_CODE: u32 = 0x3E9;
    const HUNK_END: u32 = 0x3F2;

    let mut out = Vec::new();
    let mut push = |v: u32| out.extend_from_slice(&v.to_be_bytes());

    push(HUNK_HEADER);
    push(0); // empty resident library name table
    push(1); // table_size
    push(0); // first_hunk
    push(0); // last_hunk
    push(1); // hunk_sizes[0], in longwords

    push(HUNK_CODE);
    push(1); // size: 1 longword, Any memory
    push(0x4E75_0000); // one longword of "code"

    push(HUNK_END);
    out
}

fn binary_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("target")
        .join("debug")
        .join(name)
}

fn build_workspace() {
    assert!(process::Command::new(env!("CARGO"))
        .args(["build"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to run cargo build")
        .wait()
        .expect("failed to wait on cargo build")
        .success());
}

fn write_sample() -> PathBuf {
    let path = std::env::temp_dir().join(format!("hunkdbg-sample-{}.bin", std::process::id()));
    let mut f = std::fs::File::create(&path).expect("create sample file");
    f.write_all(&minimal_hunk_executable()).expect("write sample file");
    path
}

#[test]
fn dumphunk_reports_the_header_and_code_hunk() {
    build_workspace();
    let sample = write_sample();

    let output = process::Command::new(binary_path("hunkdbg-dump"))
        .args(["dumphunk", sample.to_str().unwrap()])
        .output()
        .expect("hunkdbg-dump failed to run");

    let _ = std::fs::remove_file(&sample);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("HUNK_HEADER"));
    assert!(stdout.contains("HUNK_CODE: 4 bytes"));
}

#[test]
fn dumpdbg_reports_a_single_code_section() {
    build_workspace();
    let sample = write_sample();

    let output = process::Command::new(binary_path("hunkdbg-dump"))
        .args(["dumpdbg", sample.to_str().unwrap()])
        .output()
        .expect("hunkdbg-dump failed to run");

    let _ = std::fs::remove_file(&sample);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CODE"));
}

#[test]
fn dumpaout_and_dumpar_report_unsupported_without_erroring() {
    build_workspace();
    let sample = write_sample();

    for subcommand in ["dumpaout", "dumpar"] {
        let output = process::Command::new(binary_path("hunkdbg-dump"))
            .args([subcommand, sample.to_str().unwrap()])
            .output()
            .unwrap_or_else(|_| panic!("hunkdbg-dump {subcommand} failed to run"));
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("not supported"));
    }

    let _ = std::fs::remove_file(&sample);
}

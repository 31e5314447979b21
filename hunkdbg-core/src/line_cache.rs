//! A small path-keyed cache of a source file's lines, used by the stop
//! display to print a five-line window around the current PC (§4.6) — the
//! ambient equivalent of the original tool's `linecache` module.

use std::collections::HashMap;
use std::fs;

#[derive(Debug, Default)]
pub struct LineCache {
    files: HashMap<String, Vec<String>>,
}

impl LineCache {
    pub fn new() -> Self {
        LineCache::default()
    }

    fn lines_of(&mut self, path: &str) -> Option<&[String]> {
        if !self.files.contains_key(path) {
            let contents = fs::read_to_string(path).ok()?;
            let lines = contents.lines().map(str::to_string).collect();
            self.files.insert(path.to_string(), lines);
        }
        self.files.get(path).map(Vec::as_slice)
    }

    /// Returns up to five 1-indexed `(number, text)` pairs centered on
    /// `line` (`line-2 ..= line+2`, clamped to the file's bounds).
    pub fn context(&mut self, path: &str, line: u32) -> Vec<(u32, String)> {
        let Some(lines) = self.lines_of(path) else {
            return Vec::new();
        };
        let total = lines.len() as u32;
        let start = line.saturating_sub(2).max(1);
        let end = (line + 2).min(total);
        (start..=end)
            .filter_map(|n| lines.get((n - 1) as usize).map(|text| (n, text.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn returns_five_line_window_clamped_to_file_bounds() {
        let mut file = tempfile_with_lines(&["1", "2", "3", "4", "5", "6", "7"]);
        let mut cache = LineCache::new();
        let ctx = cache.context(file.path(), 2);
        assert_eq!(ctx, vec![
            (1, "1".to_string()),
            (2, "2".to_string()),
            (3, "3".to_string()),
            (4, "4".to_string()),
        ]);
        file.cleanup();
    }

    struct TempFile {
        path: std::path::PathBuf,
    }

    impl TempFile {
        fn path(&self) -> &str {
            self.path.to_str().unwrap()
        }
        fn cleanup(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn tempfile_with_lines(lines: &[&str]) -> TempFile {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "hunkdbg-line-cache-test-{}-{unique}",
            std::process::id()
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
        TempFile { path }
    }
}

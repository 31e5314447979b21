//! C5: the relocation and query index over a built [`Section`] sequence.

use crate::error::HunkError;
use crate::model::build;
use crate::model::section::Section;
use crate::model::symbol::{SourceLine, Segment};

/// An ordered sequence of `Section`s, one per loaded hunk, in file order
/// (§3). Section order is significant: it must match the order of runtime
/// segments the emulator reports (§4.5).
#[derive(Debug, Clone)]
pub struct DebugInfo {
    pub(crate) sections: Vec<Section>,
}

impl DebugInfo {
    /// Parses an AmigaOS hunk executable already in memory (C1-C4).
    pub fn from_bytes(data: &[u8]) -> Result<DebugInfo, HunkError> {
        build::build(data)
    }

    /// Reads and parses an executable from disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<DebugInfo, HunkError> {
        let data = std::fs::read(path).map_err(HunkError::Io)?;
        Self::from_bytes(&data)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Relocates every section to its runtime placement (§4.5). Checks all
    /// pairs before mutating any section, so a late mismatch leaves the
    /// whole `DebugInfo` untouched.
    pub fn relocate(&mut self, segments: &[Segment]) -> bool {
        if segments.len() != self.sections.len() {
            return false;
        }
        for (sec, seg) in self.sections.iter().zip(segments) {
            if seg.size != sec.size {
                return false;
            }
        }
        for (sec, seg) in self.sections.iter_mut().zip(segments) {
            sec.apply_relocation(seg.start);
        }
        true
    }

    /// `ask_address`: the unique section containing `pc` answers; `None` if
    /// no section contains it.
    pub fn ask_address(&self, pc: u32) -> Option<SourceLine> {
        self.sections.iter().find(|s| s.has_address(pc)).and_then(|s| s.ask_address(pc))
    }

    /// `ask_symbol`: first matching section symbol across sections in
    /// declaration order. Exact name match; an address of `0` is a
    /// legitimate result (§4.5, §9), so the caller must match on `Option`
    /// rather than truthiness.
    pub fn ask_symbol(&self, name: &str) -> Option<u32> {
        self.sections.iter().find_map(|s| s.ask_symbol(name))
    }

    /// `ask_source_line`: splits `where_` once on `:`; the remainder must
    /// parse as a positive line number or the query returns `None` (§4.5,
    /// §8 — `0` is not a valid line and must not fall through to matching
    /// the first line of the file).
    pub fn ask_source_line(&self, where_: &str) -> Option<u32> {
        let (path, line) = where_.split_once(':')?;
        let line: u32 = line.parse().ok()?;
        if line == 0 {
            return None;
        }
        self.sections.iter().find_map(|s| s.ask_source_line(path, line))
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&section.dump());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunk::HunkKind;
    use crate::model::symbol::Symbol;

    fn sample() -> DebugInfo {
        let mut code = Section::new(HunkKind::Code, 0x1000, 0x10);
        let main = code.push_symbol(Symbol::new(0x1000, "main"));
        code.push_line_for(0x1000, Some("a.c".to_string()), 1, main);
        let mut data = Section::new(HunkKind::Data, 0x2000, 0x10);
        data.push_symbol(Symbol::new(0x2000, "g_counter"));
        code.cleanup(&[]);
        data.cleanup(&[]);
        DebugInfo {
            sections: vec![code, data],
        }
    }

    #[test]
    fn relocate_rejects_count_mismatch() {
        let mut info = sample();
        let before = info.sections[0].start;
        assert!(!info.relocate(&[Segment { start: 0x4000, size: 0x10 }]));
        assert_eq!(info.sections[0].start, before);
    }

    #[test]
    fn relocate_rejects_size_mismatch_all_or_nothing() {
        let mut info = sample();
        let before0 = info.sections[0].start;
        let before1 = info.sections[1].start;
        let ok = info.relocate(&[
            Segment { start: 0x5000, size: 0x10 },
            Segment { start: 0x6000, size: 0x99 }, // wrong size
        ]);
        assert!(!ok);
        assert_eq!(info.sections[0].start, before0);
        assert_eq!(info.sections[1].start, before1);
    }

    #[test]
    fn relocate_shifts_every_address() {
        let mut info = sample();
        assert!(info.relocate(&[
            Segment { start: 0x8000, size: 0x10 },
            Segment { start: 0x9000, size: 0x10 },
        ]));
        let sl = info.ask_address(0x8000).unwrap();
        assert_eq!(sl.address, 0x8000);
        assert_eq!(info.ask_symbol("g_counter"), Some(0x9000));
    }

    #[test]
    fn ask_address_outside_any_section_is_none() {
        let info = sample();
        assert!(info.ask_address(0xFFFF_0000).is_none());
    }

    #[test]
    fn ask_source_line_matches_path_suffix() {
        let info = sample();
        assert_eq!(info.ask_source_line("a.c:1"), Some(0x1000));
        assert_eq!(info.ask_source_line("missing.c:1"), None);
    }

    #[test]
    fn ask_source_line_rejects_zero_line() {
        let info = sample();
        assert_eq!(info.ask_source_line("a.c:0"), None);
    }
}

//! §3 `Section`, plus the per-section half of C4's cleanup pass and C5's
//! query index.
//!
//! Symbols and lines that back-reference them live in the same arena (§9):
//! `symbols` is a plain vector and a `LineEntry` carries an index into it
//! rather than an owning handle, so renaming a symbol during cleanup is
//! automatically visible to every line that points at it.

use crate::hunk::types::HunkKind;
use crate::model::symbol::{SourceLine, Symbol};

/// A source-line record as stored inside a `Section`: the owning symbol is
/// referenced by index into `Section::symbols`, not embedded by value.
#[derive(Debug, Clone)]
struct LineEntry {
    address: u32,
    path: Option<String>,
    line: u32,
    symbol_index: usize,
}

/// A tuple collected in the scratch COMMON pool during build (§4.4, §9):
/// `{ name, path, line }` for a global whose true section is not yet known.
#[derive(Debug, Clone)]
pub struct CommonEntry {
    pub name: String,
    pub path: Option<String>,
    pub line: u32,
}

/// `{ hunk_kind, start, size, symbols, lines }` (§3).
#[derive(Debug, Clone)]
pub struct Section {
    pub hunk_kind: HunkKind,
    pub start: u32,
    pub size: u32,
    symbols: Vec<Symbol>,
    lines: Vec<LineEntry>,
}

impl Section {
    pub fn new(hunk_kind: HunkKind, start: u32, size: u32) -> Self {
        Section {
            hunk_kind,
            start,
            size,
            symbols: Vec::new(),
            lines: Vec::new(),
        }
    }

    pub fn end(&self) -> u32 {
        self.start + self.size
    }

    pub fn has_address(&self, addr: u32) -> bool {
        self.start <= addr && addr < self.end()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn push_symbol(&mut self, symbol: Symbol) -> usize {
        self.symbols.push(symbol);
        self.symbols.len() - 1
    }

    /// Appends a line bound to the symbol at `symbol_index` (an arena index
    /// previously returned by [`Self::push_symbol`]).
    pub fn push_line_for(&mut self, address: u32, path: Option<String>, line: u32, symbol_index: usize) {
        self.lines.push(LineEntry {
            address,
            path,
            line,
            symbol_index,
        });
    }

    fn resolve_line(&self, entry: &LineEntry) -> SourceLine {
        SourceLine {
            address: entry.address,
            path: entry.path.clone(),
            line: entry.line,
            symbol: self.symbols[entry.symbol_index].clone(),
        }
    }

    /// Step 1 of cleanup (§4.4): sort symbols, and for an adjacent pair at
    /// the same address where one name is `"_" + other name`, keep only the
    /// underscore-free spelling. ASCII puts `_` below any letter, so the
    /// underscored symbol sorts *first* in the pair — canonicalize on name
    /// shape, not on sort position.
    fn dedup_underscored(&mut self) {
        // Carry the symbols' current arena indices through the sort so we
        // can remap `lines[*].symbol_index` afterwards.
        let mut indexed: Vec<(usize, Symbol)> = self.symbols.drain(..).enumerate().collect();
        indexed.sort_by(|a, b| a.1.cmp(&b.1));

        let mut remap = vec![usize::MAX; indexed.len()];
        let mut kept: Vec<(usize, Symbol)> = Vec::with_capacity(indexed.len());

        let mut i = 0;
        while i < indexed.len() {
            if i + 1 < indexed.len() {
                let (cur_old, cur) = &indexed[i];
                let (next_old, next) = &indexed[i + 1];
                if cur.address == next.address {
                    let canonical = if next.name == format!("_{}", cur.name) {
                        Some(cur.name.clone())
                    } else if cur.name == format!("_{}", next.name) {
                        Some(next.name.clone())
                    } else {
                        None
                    };
                    if let Some(name) = canonical {
                        let new_index = kept.len();
                        remap[*cur_old] = new_index;
                        remap[*next_old] = new_index;
                        kept.push((*cur_old, Symbol::new(cur.address, name)));
                        i += 2;
                        continue;
                    }
                }
            }
            let (old, sym) = &indexed[i];
            remap[*old] = kept.len();
            kept.push((*old, sym.clone()));
            i += 1;
        }

        self.symbols = kept.into_iter().map(|(_, s)| s).collect();
        for line in &mut self.lines {
            line.symbol_index = remap[line.symbol_index];
        }
    }

    /// Step 2 of cleanup: match scratch COMMON entries against this
    /// section's symbols, renaming on match and synthesizing a line at the
    /// matched symbol's address.
    fn match_common(&mut self, common: &[CommonEntry]) {
        for entry in common {
            for i in 0..self.symbols.len() {
                // Matches exactly, or with the section symbol's own
                // leading byte stripped (the debug-info name commonly
                // lacks the `_` an a.out-convention linker symbol carries;
                // quirk preserved from the original tool — it strips
                // unconditionally, not only when that byte is `_`).
                let without_first = self.symbols[i].name.get(1..);
                let matches = self.symbols[i].name == entry.name || without_first == Some(entry.name.as_str());
                if !matches {
                    continue;
                }
                self.symbols[i].name = entry.name.clone();
                let address = self.symbols[i].address;
                self.push_line_for(address, entry.path.clone(), entry.line, i);
            }
        }
    }

    /// Runs the full cleanup pass (§4.4 steps 1-3; step 4 — dropping the
    /// COMMON pool — happens once in the builder after every section is
    /// cleaned).
    pub fn cleanup(&mut self, common: &[CommonEntry]) {
        self.dedup_underscored();
        self.match_common(common);
        self.lines.sort_by(|a, b| {
            a.address
                .cmp(&b.address)
                .then_with(|| self.symbols[a.symbol_index].name.cmp(&self.symbols[b.symbol_index].name))
        });
    }

    /// Relocates this section in place. Caller (DebugInfo::relocate) has
    /// already verified the size matches before calling.
    pub(crate) fn apply_relocation(&mut self, new_start: u32) {
        let diff = new_start as i64 - self.start as i64;
        for s in &mut self.symbols {
            s.address = (s.address as i64 + diff) as u32;
        }
        for l in &mut self.lines {
            l.address = (l.address as i64 + diff) as u32;
        }
        self.start = new_start;
    }

    /// C5 `ask_address`: merge `lines` with symbols projected as bare
    /// source lines, return the candidate with the greatest address `<=
    /// pc`, ties broken by name (§4.5, §9 — two-sorted-vectors merge-walk
    /// rather than a combined store).
    pub fn ask_address(&self, pc: u32) -> Option<SourceLine> {
        if !self.has_address(pc) {
            return None;
        }
        let mut best: Option<SourceLine> = None;
        for entry in &self.lines {
            if entry.address > pc {
                continue;
            }
            let candidate = self.resolve_line(entry);
            best = Some(match best {
                Some(b) if b.address > candidate.address => b,
                Some(b) if b.address == candidate.address && b.symbol.name >= candidate.symbol.name => b,
                _ => candidate,
            });
        }
        for sym in &self.symbols {
            if sym.address > pc {
                continue;
            }
            let candidate = SourceLine {
                address: sym.address,
                path: None,
                line: 0,
                symbol: sym.clone(),
            };
            best = Some(match best {
                Some(b) if b.address > candidate.address => b,
                Some(b) if b.address == candidate.address && b.symbol.name >= candidate.symbol.name => b,
                _ => candidate,
            });
        }
        best
    }

    /// C5 `ask_symbol`: exact name match, first occurrence in declaration
    /// order.
    pub fn ask_symbol(&self, name: &str) -> Option<u32> {
        self.symbols.iter().find(|s| s.name == name).map(|s| s.address)
    }

    /// C5 `ask_source_line`: first line whose `path` ends with `path` and
    /// whose `line >= line`, in (already-sorted) address order.
    pub fn ask_source_line(&self, path: &str, line: u32) -> Option<u32> {
        self.lines
            .iter()
            .find(|e| e.path.as_deref().is_some_and(|p| p.ends_with(path)) && e.line >= line)
            .map(|e| e.address)
    }

    pub fn lines(&self) -> impl Iterator<Item = SourceLine> + '_ {
        self.lines.iter().map(|e| self.resolve_line(e))
    }

    pub fn dump(&self) -> String {
        let mut out = format!(
            "{} [{:08X} - {:08X}]:\n",
            self.hunk_kind.as_str(),
            self.start,
            self.end()
        );
        out.push_str("  SYMBOLS:\n");
        for s in &self.symbols {
            out.push_str(&format!("    {s}\n"));
        }
        out.push_str("  LINES:\n");
        for l in self.lines() {
            out.push_str(&format!("    {l}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_dedup_scenario() {
        let mut sec = Section::new(HunkKind::Data, 0, 0x200);
        sec.push_symbol(Symbol::new(0x100, "foo"));
        sec.push_symbol(Symbol::new(0x100, "_foo"));
        sec.push_symbol(Symbol::new(0x104, "bar"));
        sec.cleanup(&[]);
        let names: Vec<_> = sec.symbols().iter().map(|s| (s.address, s.name.clone())).collect();
        assert_eq!(names, vec![(0x100, "foo".to_string()), (0x104, "bar".to_string())]);
    }

    #[test]
    fn common_matching_scenario() {
        let mut sec = Section::new(HunkKind::Data, 0, 0x3000);
        sec.push_symbol(Symbol::new(0x2000, "_x"));
        let common = vec![CommonEntry {
            name: "x".to_string(),
            path: Some("a.c".to_string()),
            line: 10,
        }];
        sec.cleanup(&common);
        assert_eq!(sec.symbols()[0].name, "x");
        let lines: Vec<_> = sec.lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].address, 0x2000);
        assert_eq!(lines[0].path.as_deref(), Some("a.c"));
        assert_eq!(lines[0].line, 10);
    }

    #[test]
    fn ask_address_prefers_line_over_bare_symbol_at_same_address() {
        let mut sec = Section::new(HunkKind::Code, 0x1000, 0x100);
        let func = sec.push_symbol(Symbol::new(0x1000, "main"));
        sec.push_line_for(0x1000, Some("a.c".to_string()), 1, func);
        sec.push_line_for(0x1008, Some("a.c".to_string()), 2, func);
        sec.cleanup(&[]);

        let sl = sec.ask_address(0x1004).unwrap();
        assert_eq!(sl.address, 0x1000);
        assert_eq!(sl.line, 1);

        let sl2 = sec.ask_address(0x1008).unwrap();
        assert_eq!(sl2.address, 0x1008);
    }

    #[test]
    fn ask_address_outside_section_is_none() {
        let sec = Section::new(HunkKind::Code, 0x1000, 0x10);
        assert!(sec.ask_address(0x2000).is_none());
    }

    #[test]
    fn ask_symbol_finds_zero_address() {
        let mut sec = Section::new(HunkKind::Bss, 0, 0x10);
        sec.push_symbol(Symbol::new(0, "zeroed"));
        assert_eq!(sec.ask_symbol("zeroed"), Some(0));
        assert_eq!(sec.ask_symbol("missing"), None);
    }
}

//! C4: Debug Model Builder — walks the hunk stream and assembles a
//! `Section`-oriented model, attaching symbols and source lines as it goes.

use std::collections::HashMap;

use crate::error::HunkError;
use crate::hunk::{Hunk, HunkKind, HunkReader};
use crate::model::debuginfo::DebugInfo;
use crate::model::section::{CommonEntry, Section};
use crate::model::symbol::Symbol;
use crate::stab::{ContinuationBuffer, StabKind};

/// Per-DEBUG-hunk bookkeeping (§4.4): the function a run of `SLINE`s
/// attaches to, the current directory/file path built up from `SO`/`SOL`,
/// the continuation buffer for `LSYM`/`RSYM`/`PSYM`, and the lexical scope
/// stack `LBRAC`/`RBRAC` push and pop (reserved for a future variable
/// lookup — not read back by anything in this build).
struct DebugHunkState {
    func_index: Option<usize>,
    dir: String,
    file: String,
    cont: ContinuationBuffer,
    scope_stack: Vec<u32>,
}

impl DebugHunkState {
    fn new() -> Self {
        DebugHunkState {
            func_index: None,
            dir: String::new(),
            file: String::new(),
            cont: ContinuationBuffer::new(),
            scope_stack: Vec::new(),
        }
    }

    fn path(&self) -> Option<String> {
        if self.file.is_empty() {
            None
        } else {
            Some(self.file.clone())
        }
    }
}

/// Consumes a decoded hunk stream and produces a [`DebugInfo`] (§4.4).
pub fn build(data: &[u8]) -> Result<DebugInfo, HunkError> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current_for_kind: HashMap<HunkKind, usize> = HashMap::new();
    let mut last_section: Option<usize> = None;
    let mut running_base: u32 = 0;
    let mut last_size: u32 = 0;
    let mut common: Vec<CommonEntry> = Vec::new();

    for (hunk_index, hunk) in HunkReader::new(data).enumerate() {
        let hunk = hunk?;
        match hunk {
            Hunk::Code { size, .. } | Hunk::Data { size, .. } | Hunk::Bss { size, .. } => {
                let kind = hunk.kind().expect("CODE/DATA/BSS always has a kind");
                running_base += last_size;
                last_size = size;
                sections.push(Section::new(kind, running_base, size));
                let idx = sections.len() - 1;
                current_for_kind.insert(kind, idx);
                last_section = Some(idx);
            }
            Hunk::Symbol(symbols) => {
                let idx = last_section.ok_or(HunkError::DanglingAttachment { offset: hunk_index })?;
                let base = sections[idx].start;
                for sym in symbols {
                    let name = sym.name.strip_prefix('_').unwrap_or(&sym.name).to_string();
                    sections[idx].push_symbol(Symbol::new(sym.refs + base, name));
                }
            }
            Hunk::Debug { stabs, .. } => {
                if last_section.is_none() {
                    return Err(HunkError::DanglingAttachment { offset: hunk_index });
                }
                process_debug_hunk(&stabs, &mut sections, &current_for_kind, &mut common)?;
            }
            Hunk::Header(_) | Hunk::Ignored(_) => {}
        }
    }

    if sections.is_empty() {
        return Err(HunkError::NoSections);
    }

    for section in &mut sections {
        section.cleanup(&common);
    }

    Ok(DebugInfo { sections })
}

fn process_debug_hunk(
    stabs: &[crate::hunk::RawStab],
    sections: &mut [Section],
    current_for_kind: &HashMap<HunkKind, usize>,
    common: &mut Vec<CommonEntry>,
) -> Result<(), HunkError> {
    let mut state = DebugHunkState::new();

    for stab in stabs {
        match stab.kind {
            StabKind::So | StabKind::Sol => {
                if stab.str.ends_with('/') {
                    state.dir = stab.str.clone();
                } else if stab.str.starts_with('/') {
                    state.file = stab.str.clone();
                } else {
                    state.file = format!("{}{}", state.dir, stab.str);
                }
                if stab.kind == StabKind::So {
                    state.cont = ContinuationBuffer::new();
                }
            }
            StabKind::Data => {
                if let Some(&idx) = current_for_kind.get(&HunkKind::Data) {
                    sections[idx].push_symbol(Symbol::new(stab.value, stab.str.clone()));
                }
            }
            StabKind::Bss => {
                if let Some(&idx) = current_for_kind.get(&HunkKind::Bss) {
                    sections[idx].push_symbol(Symbol::new(stab.value, stab.str.clone()));
                }
            }
            StabKind::Gsym => {
                let parsed = crate::stab::parse(&stab.str).map_err(|source| HunkError::FunctionOrGlobalGrammar {
                    stab: "GSYM",
                    source,
                })?;
                common.push(CommonEntry {
                    name: parsed.name,
                    path: state.path(),
                    line: stab.desc,
                });
            }
            StabKind::Stsym => {
                if let Some(&idx) = current_for_kind.get(&HunkKind::Data) {
                    let parsed = crate::stab::parse(&stab.str).map_err(|source| HunkError::FunctionOrGlobalGrammar {
                        stab: "STSYM",
                        source,
                    })?;
                    let sym_idx = sections[idx].push_symbol(Symbol::new(stab.value, parsed.name));
                    sections[idx].push_line_for(stab.value, state.path(), stab.desc, sym_idx);
                }
            }
            StabKind::Lcsym => {
                if let Some(&idx) = current_for_kind.get(&HunkKind::Bss) {
                    let parsed = crate::stab::parse(&stab.str).map_err(|source| HunkError::FunctionOrGlobalGrammar {
                        stab: "LCSYM",
                        source,
                    })?;
                    let sym_idx = sections[idx].push_symbol(Symbol::new(stab.value, parsed.name));
                    sections[idx].push_line_for(stab.value, state.path(), stab.desc, sym_idx);
                }
            }
            StabKind::Sline => {
                if let (Some(func_idx), Some(&idx)) = (state.func_index, current_for_kind.get(&HunkKind::Code)) {
                    sections[idx].push_line_for(stab.value, state.path(), stab.desc, func_idx);
                }
            }
            StabKind::Fun => {
                if let Some(&idx) = current_for_kind.get(&HunkKind::Code) {
                    let parsed = crate::stab::parse(&stab.str).map_err(|source| HunkError::FunctionOrGlobalGrammar {
                        stab: "FUN",
                        source,
                    })?;
                    let sym_idx = sections[idx].push_symbol(Symbol::new(stab.value, parsed.name));
                    state.func_index = Some(sym_idx);
                }
            }
            StabKind::Lsym | StabKind::Rsym | StabKind::Psym => {
                if state.cont.feed(&stab.str) {
                    let joined = state.cont.take();
                    if let Err(e) = crate::stab::parse(&joined) {
                        tracing::warn!("{} info string {:?} failed to parse: {e}", stab.kind, joined);
                    }
                }
            }
            StabKind::Lbrac => state.scope_stack.push(stab.value),
            StabKind::Rbrac => {
                state.scope_stack.pop();
            }
            StabKind::Text => {}
            StabKind::Other(type_code) => {
                return Err(HunkError::UnrecognizedStab { type_code });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hunk::RawStab;

    fn stab(kind: StabKind, value: u32, desc: u32, str: &str) -> RawStab {
        RawStab {
            kind,
            value,
            desc,
            str: str.to_string(),
        }
    }

    #[test]
    fn sline_entries_share_the_function_symbol() {
        let mut sections = vec![Section::new(HunkKind::Code, 0x1000, 0x100)];
        let mut current = HashMap::new();
        current.insert(HunkKind::Code, 0usize);
        let mut common = Vec::new();

        let stabs = vec![
            stab(StabKind::So, 0, 0, "/src/"),
            stab(StabKind::So, 0, 0, "a.c"),
            stab(StabKind::Fun, 0x1000, 0, "main:F1"),
            stab(StabKind::Sline, 0x1004, 2, ""),
            stab(StabKind::Sline, 0x1008, 3, ""),
        ];
        process_debug_hunk(&stabs, &mut sections, &current, &mut common).unwrap();

        let lines: Vec<_> = sections[0].lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].symbol.name, "main");
        assert_eq!(lines[1].symbol.name, "main");
        assert_eq!(lines[0].path.as_deref(), Some("/src/a.c"));
    }

    #[test]
    fn other_tag_in_debug_hunk_is_fatal() {
        let mut sections = vec![Section::new(HunkKind::Code, 0, 0x100)];
        let mut current = HashMap::new();
        current.insert(HunkKind::Code, 0usize);
        let mut common = Vec::new();
        let stabs = vec![stab(StabKind::Other(0xff), 0, 0, "")];
        assert!(process_debug_hunk(&stabs, &mut sections, &current, &mut common).is_err());
    }

    #[test]
    fn zero_sections_is_rejected() {
        assert!(matches!(build(&[]), Err(HunkError::NoSections)));
    }

    #[test]
    fn malformed_fun_grammar_is_fatal() {
        let mut sections = vec![Section::new(HunkKind::Code, 0, 0x100)];
        let mut current = HashMap::new();
        current.insert(HunkKind::Code, 0usize);
        let mut common = Vec::new();
        let stabs = vec![stab(StabKind::Fun, 0x1000, 0, "main:F")];
        let err = process_debug_hunk(&stabs, &mut sections, &current, &mut common).unwrap_err();
        assert!(matches!(err, HunkError::FunctionOrGlobalGrammar { stab: "FUN", .. }));
    }

    #[test]
    fn malformed_lsym_grammar_is_non_fatal() {
        let mut sections = vec![Section::new(HunkKind::Code, 0, 0x100)];
        let mut current = HashMap::new();
        current.insert(HunkKind::Code, 0usize);
        let mut common = Vec::new();
        let stabs = vec![stab(StabKind::Lsym, 0, 0, "bad:t@@@")];
        assert!(process_debug_hunk(&stabs, &mut sections, &current, &mut common).is_ok());
    }
}

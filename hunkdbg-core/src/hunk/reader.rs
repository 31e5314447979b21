//! C1: Hunk Reader — decodes the container into a sequence of typed records.
//!
//! The reader walks a big-endian, longword-oriented byte stream one record
//! at a time (mirroring the teacher's cursor-based parsers, e.g.
//! `name-core/src/parse/lexer.rs`'s positional `peek`/`advance` style, but
//! over bytes instead of source text). It does not build any symbolic model
//! itself — that's C4's job once it has seen every `Hunk` in order.

use super::types::{hunk_ids, HeaderInfo, Hunk, HunkSymbol, MemoryType};
use crate::error::HunkError;
use crate::stab::decode_debug_payload;

pub struct HunkReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HunkReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        HunkReader { data, pos: 0 }
    }

    fn read_u32(&mut self) -> Result<u32, HunkError> {
        if self.pos + 4 > self.data.len() {
            return Err(HunkError::Truncated {
                offset: self.pos,
                expected: 4,
            });
        }
        let bytes = &self.data[self.pos..self.pos + 4];
        self.pos += 4;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], HunkError> {
        if self.pos + n > self.data.len() {
            return Err(HunkError::Truncated {
                offset: self.pos,
                expected: n,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), HunkError> {
        self.read_bytes(n).map(|_| ())
    }

    fn read_name_table_entry(&mut self) -> Result<String, HunkError> {
        let padded = self.read_bytes_of_name()?;
        Ok(cstr_from_padded(padded))
    }

    /// Reads the common `{longword count, count*4 bytes}` name encoding
    /// used by HUNK_SYMBOL and the header's resident-library table.
    fn read_bytes_of_name(&mut self) -> Result<&'a [u8], HunkError> {
        let offset = self.pos;
        let words = self.read_u32()?;
        let nbytes = (words as usize)
            .checked_mul(4)
            .ok_or(HunkError::Truncated {
                offset,
                expected: 4,
            })?;
        self.read_bytes(nbytes)
    }

    fn read_header(&mut self) -> Result<Hunk, HunkError> {
        // Resident library name table, terminated by a zero-length entry.
        loop {
            let offset = self.pos;
            let words = self.read_u32()?;
            if words == 0 {
                break;
            }
            self.skip((words as usize) * 4)
                .map_err(|_| HunkError::Truncated {
                    offset,
                    expected: (words as usize) * 4,
                })?;
        }

        let table_size = self.read_u32()?;
        let first_hunk = self.read_u32()?;
        let last_hunk = self.read_u32()?;
        let offset = self.pos;
        let count = last_hunk
            .checked_sub(first_hunk)
            .and_then(|span| span.checked_add(1))
            .ok_or(HunkError::Truncated { offset, expected: 4 })? as usize;
        let mut hunk_sizes = Vec::with_capacity(count);
        for _ in 0..count {
            hunk_sizes.push(self.read_u32()?);
        }

        Ok(Hunk::Header(HeaderInfo {
            table_size,
            first_hunk,
            last_hunk,
            hunk_sizes,
        }))
    }

    fn read_loadable(&mut self, make: impl Fn(u32, MemoryType) -> Hunk) -> Result<Hunk, HunkError> {
        let raw = self.read_u32()?;
        let mem = MemoryType::from_flags(raw);
        let size_longwords = raw & 0x3FFF_FFFF;
        Ok(make(size_longwords * 4, mem))
    }

    fn read_symbol(&mut self) -> Result<Hunk, HunkError> {
        let mut symbols = Vec::new();
        loop {
            let offset = self.pos;
            let words = self.read_u32()?;
            if words == 0 {
                break;
            }
            self.pos = offset;
            let name = self.read_name_table_entry()?;
            let refs = self.read_u32()?;
            symbols.push(HunkSymbol { name, refs });
        }
        Ok(Hunk::Symbol(symbols))
    }

    fn read_debug(&mut self) -> Result<Hunk, HunkError> {
        let size_longwords = self.read_u32()? as usize;
        let payload = self.read_bytes(size_longwords * 4)?;
        let (stabs, strings) =
            decode_debug_payload(payload).map_err(|_| HunkError::Truncated {
                offset: self.pos,
                expected: 0,
            })?;
        Ok(Hunk::Debug { stabs, strings })
    }

    fn read_reloc32(&mut self) -> Result<Hunk, HunkError> {
        loop {
            let count = self.read_u32()?;
            if count == 0 {
                break;
            }
            let _hunk_num = self.read_u32()?;
            self.skip(count as usize * 4)?;
        }
        Ok(Hunk::Ignored(hunk_ids::HUNK_RELOC32))
    }

    fn read_reloc32_short(&mut self) -> Result<Hunk, HunkError> {
        loop {
            let count = self.read_u16()?;
            if count == 0 {
                break;
            }
            let _hunk_num = self.read_u16()?;
            self.skip(count as usize * 2)?;
        }
        // The table is padded to a longword boundary.
        if self.pos % 4 != 0 {
            self.skip(4 - (self.pos % 4))?;
        }
        Ok(Hunk::Ignored(hunk_ids::HUNK_RELOC32SHORT))
    }

    fn read_u16(&mut self) -> Result<u16, HunkError> {
        if self.pos + 2 > self.data.len() {
            return Err(HunkError::Truncated {
                offset: self.pos,
                expected: 2,
            });
        }
        let bytes = &self.data[self.pos..self.pos + 2];
        self.pos += 2;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

fn cstr_from_padded(padded: &[u8]) -> String {
    let end = padded.iter().position(|&b| b == 0).unwrap_or(padded.len());
    String::from_utf8_lossy(&padded[..end]).into_owned()
}

impl<'a> Iterator for HunkReader<'a> {
    type Item = Result<Hunk, HunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }

        let offset = self.pos;
        let type_id = match self.read_u32() {
            Ok(id) => id & 0x3FFF_FFFF,
            Err(e) => return Some(Err(e)),
        };

        let result = match type_id {
            hunk_ids::HUNK_HEADER => self.read_header(),
            hunk_ids::HUNK_CODE => self.read_code_payload(),
            hunk_ids::HUNK_DATA => self.read_data_payload(),
            hunk_ids::HUNK_BSS => self.read_loadable(|size, mem| Hunk::Bss { size, mem }),
            hunk_ids::HUNK_SYMBOL => self.read_symbol(),
            hunk_ids::HUNK_DEBUG => self.read_debug(),
            hunk_ids::HUNK_RELOC32 => self.read_reloc32(),
            hunk_ids::HUNK_RELOC32SHORT => self.read_reloc32_short(),
            hunk_ids::HUNK_END => Ok(Hunk::Ignored(hunk_ids::HUNK_END)),
            other => Err(HunkError::UnknownType {
                offset,
                type_id: other,
            }),
        };

        Some(result)
    }
}

impl<'a> HunkReader<'a> {
    fn read_code_payload(&mut self) -> Result<Hunk, HunkError> {
        let raw = self.read_u32()?;
        let mem = MemoryType::from_flags(raw);
        let size = (raw & 0x3FFF_FFFF) * 4;
        self.skip(size as usize)?;
        Ok(Hunk::Code { size, mem })
    }

    fn read_data_payload(&mut self) -> Result<Hunk, HunkError> {
        let raw = self.read_u32()?;
        let mem = MemoryType::from_flags(raw);
        let size = (raw & 0x3FFF_FFFF) * 4;
        self.skip(size as usize)?;
        Ok(Hunk::Data { size, mem })
    }
}

//! C2: decode a `HUNK_DEBUG` payload into a stream of stab entries.
//!
//! The payload is the split representation described in §4.2: a table of
//! fixed-size raw stab records (mirroring the classic a.out `nlist` layout —
//! `n_strx: u32, n_type: u8, n_other: u8, n_desc: u16, n_value: u32`, 12
//! bytes each) followed by a length-prefixed, NUL-terminated string table
//! that `n_strx` indexes into.

use crate::error::StabDecodeError;
use crate::hunk::types::RawStab;
use crate::stab::kind::StabKind;

const RECORD_SIZE: usize = 12;

pub fn decode_debug_payload(payload: &[u8]) -> Result<(Vec<RawStab>, Vec<u8>), StabDecodeError> {
    if payload.len() < 4 {
        return Err(StabDecodeError::StringOffsetOutOfRange {
            offset: 0,
            table_len: 0,
        });
    }

    let count = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
    let table_start = 4;
    let table_end = table_start + count * RECORD_SIZE;

    let records = payload
        .get(table_start..table_end)
        .ok_or(StabDecodeError::StringOffsetOutOfRange {
            offset: table_start as u32,
            table_len: payload.len(),
        })?;

    let strings_len_bytes =
        payload
            .get(table_end..table_end + 4)
            .ok_or(StabDecodeError::StringOffsetOutOfRange {
                offset: table_end as u32,
                table_len: payload.len(),
            })?;
    let strings_len = u32::from_be_bytes([
        strings_len_bytes[0],
        strings_len_bytes[1],
        strings_len_bytes[2],
        strings_len_bytes[3],
    ]) as usize;
    let strings_start = table_end + 4;
    let strings = payload
        .get(strings_start..strings_start + strings_len)
        .ok_or(StabDecodeError::StringOffsetOutOfRange {
            offset: strings_start as u32,
            table_len: payload.len(),
        })?
        .to_vec();

    let mut stabs = Vec::with_capacity(count);
    for rec in records.chunks_exact(RECORD_SIZE) {
        let n_strx = u32::from_be_bytes([rec[0], rec[1], rec[2], rec[3]]);
        let n_type = rec[4];
        let _n_other = rec[5];
        let n_desc = u16::from_be_bytes([rec[6], rec[7]]);
        let n_value = u32::from_be_bytes([rec[8], rec[9], rec[10], rec[11]]);

        let str = resolve_string(&strings, n_strx)?;

        stabs.push(RawStab {
            kind: StabKind::from_code(n_type),
            value: n_value,
            desc: n_desc as u32,
            str,
        });
    }

    Ok((stabs, strings))
}

fn resolve_string(table: &[u8], offset: u32) -> Result<String, StabDecodeError> {
    if offset == 0 {
        return Ok(String::new());
    }
    let start = offset as usize;
    let bytes = table
        .get(start..)
        .ok_or(StabDecodeError::StringOffsetOutOfRange {
            offset,
            table_len: table.len(),
        })?;
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_payload(entries: &[(u8, u16, u32, &str)]) -> Vec<u8> {
        let mut strings = vec![0u8]; // offset 0 reserved for "no name"
        let mut offsets = Vec::new();
        for (_, _, _, name) in entries {
            offsets.push(strings.len() as u32);
            strings.extend_from_slice(name.as_bytes());
            strings.push(0);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for (i, (n_type, n_desc, n_value, _)) in entries.iter().enumerate() {
            out.extend_from_slice(&offsets[i].to_be_bytes());
            out.push(*n_type);
            out.push(0);
            out.extend_from_slice(&n_desc.to_be_bytes());
            out.extend_from_slice(&n_value.to_be_bytes());
        }
        out.extend_from_slice(&(strings.len() as u32).to_be_bytes());
        out.extend_from_slice(&strings);
        out
    }

    #[test]
    fn decodes_known_tags() {
        let payload = build_payload(&[
            (crate::stab::kind::codes::N_SO, 0, 0, "/src/"),
            (crate::stab::kind::codes::N_FUN, 12, 0x1000, "main:F1"),
            (crate::stab::kind::codes::N_SLINE, 3, 0x1004, ""),
        ]);
        let (stabs, _strings) = decode_debug_payload(&payload).unwrap();
        assert_eq!(stabs.len(), 3);
        assert_eq!(stabs[0].kind, StabKind::So);
        assert_eq!(stabs[0].str, "/src/");
        assert_eq!(stabs[1].kind, StabKind::Fun);
        assert_eq!(stabs[1].value, 0x1000);
        assert_eq!(stabs[1].str, "main:F1");
        assert_eq!(stabs[2].kind, StabKind::Sline);
        assert_eq!(stabs[2].desc, 3);
    }

    #[test]
    fn unknown_tag_decodes_to_other() {
        let payload = build_payload(&[(0xff, 0, 0, "")]);
        let (stabs, _) = decode_debug_payload(&payload).unwrap();
        assert_eq!(stabs[0].kind, StabKind::Other(0xff));
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let payload = vec![0, 0, 0, 5]; // claims 5 records, has none
        assert!(decode_debug_payload(&payload).is_err());
    }
}

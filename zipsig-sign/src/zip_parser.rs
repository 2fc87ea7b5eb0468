// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use byteorder::{ByteOrder, LittleEndian};
use zipsig_common::*;

// Offsets and sizes are u64 even though the ZIP fields are u32, so that adding
// them together can't overflow
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZipOffsets {
    // Central Directory (from start of file)
    pub cd_start: u64,
    // Central Directory length, as declared by the EOCD
    pub cd_size: u64,
    // End of Central Directory (from start of file)
    pub eocd_start: u64,
    // Length of the comment trailing the EOCD
    pub comment_len: u64
}

pub const EOCD_MAGIC: u32 = 0x06054b50;
pub const CD_MAGIC: u32 = 0x02014b50;
/// The EOCD is 22 bytes long, not counting its comment.
pub const EOCD_FIXED_SIZE: usize = 22;
/// The comment length field is 16 bits wide, which bounds how far back the EOCD can be.
pub const MAX_COMMENT_LEN: usize = u16::MAX as usize;

pub const EOCD_CD_SIZE_FIELD: u64 = 12;
pub const EOCD_CD_OFFSET_FIELD: u64 = 16;
pub const EOCD_COMMENT_LEN_FIELD: u64 = 20;

enum EocdSearch {
    Found(ZipOffsets),
    Exhausted
}

pub fn find_offsets(zip_buf: &[u8]) -> Result<ZipOffsets> {
    if zip_buf.len() < EOCD_FIXED_SIZE {
        return Err(ZipSigError::TooSmall);
    }

    let offsets = match scan_for_eocd(zip_buf) {
        EocdSearch::Found(offsets) => offsets,
        EocdSearch::Exhausted => return Err(ZipSigError::NotAZipContainer)
    };

    // A real EOCD/CD pair, but something has been wedged between them. Signing
    // schemes don't allow that, so don't go looking for another EOCD.
    if offsets.cd_start + offsets.cd_size != offsets.eocd_start {
        return Err(ZipSigError::CdNotAdjacentToEocd);
    }

    Ok(offsets)
}

fn scan_for_eocd(zip_buf: &[u8]) -> EocdSearch {
    // The comment is variable length, so walk backwards one possible
    // comment length at a time
    for comment_len in 0..=MAX_COMMENT_LEN {
        let Some(start) = zip_buf.len().checked_sub(EOCD_FIXED_SIZE + comment_len) else {
            break;
        };
        if let Some(offsets) = corroborated_eocd_at(zip_buf, start as u64, comment_len as u64) {
            return EocdSearch::Found(offsets);
        }
    }
    EocdSearch::Exhausted
}

// The comment can contain the EOCD magic too, so a candidate only counts if it
// accounts for exactly the bytes after it AND points at a real Central Directory.
fn corroborated_eocd_at(zip_buf: &[u8], start: u64, comment_len: u64) -> Option<ZipOffsets> {
    if read_u32(zip_buf, start)? != EOCD_MAGIC {
        return None;
    }
    if u64::from(read_u16(zip_buf, start + EOCD_COMMENT_LEN_FIELD)?) != comment_len {
        return None;
    }
    let cd_start = u64::from(read_u32(zip_buf, start + EOCD_CD_OFFSET_FIELD)?);
    if read_u32(zip_buf, cd_start)? != CD_MAGIC {
        return None;
    }
    let cd_size = u64::from(read_u32(zip_buf, start + EOCD_CD_SIZE_FIELD)?);

    Some(ZipOffsets {
        cd_start,
        cd_size,
        eocd_start: start,
        comment_len
    })
}

/// Borrows `len` bytes at `at`, or `None` if any of them are past the end of the buffer.
pub fn read_bytes(buf: &[u8], at: u64, len: u64) -> Option<&[u8]> {
    let start = usize::try_from(at).ok()?;
    let end = start.checked_add(usize::try_from(len).ok()?)?;
    buf.get(start..end)
}

pub fn read_u16(buf: &[u8], at: u64) -> Option<u16> {
    read_bytes(buf, at, 2).map(LittleEndian::read_u16)
}

pub fn read_u32(buf: &[u8], at: u64) -> Option<u32> {
    read_bytes(buf, at, 4).map(LittleEndian::read_u32)
}

pub fn read_u64(buf: &[u8], at: u64) -> Option<u64> {
    read_bytes(buf, at, 8).map(LittleEndian::read_u64)
}

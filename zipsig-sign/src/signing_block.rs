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

use crate::{
    signing_types::{APK_SIGNING_BLOCK_MAGIC, SIGNING_BLOCK_FRAMING_LEN},
    zip_parser::{read_bytes, read_u64, ZipOffsets}
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSigningBlock {
    // Where the leading size field sits, from start of file
    pub start: u64,
    // Everything between the two size fields
    pub payload: Vec<u8>
}

/// Looks for an APK Signing Block ending right where the Central Directory starts.
///
/// A missing or inconsistent block is not an error: the archive is simply not
/// v2 signed, so this returns `None`.
pub fn find_signing_block(zip_buf: &[u8], offsets: &ZipOffsets) -> Option<LocatedSigningBlock> {
    let cd_start = offsets.cd_start;
    let magic = read_bytes(zip_buf, cd_start.checked_sub(16)?, 16)?;
    if magic != APK_SIGNING_BLOCK_MAGIC {
        return None;
    }

    // The size is written at both ends of the block, but the leading copy
    // doesn't count itself. The two must agree.
    let post_size = read_u64(zip_buf, cd_start.checked_sub(24)?)?;
    let start = cd_start.checked_sub(post_size)?.checked_sub(8)?;
    let pre_size = read_u64(zip_buf, start)?;
    if pre_size != post_size || pre_size < SIGNING_BLOCK_FRAMING_LEN {
        return None;
    }
    // Entries have to come first, so a block at offset 0 isn't one
    if start == 0 {
        return None;
    }

    let payload = read_bytes(zip_buf, start + 8, pre_size - SIGNING_BLOCK_FRAMING_LEN)?;
    Some(LocatedSigningBlock {
        start,
        payload: payload.to_vec()
    })
}

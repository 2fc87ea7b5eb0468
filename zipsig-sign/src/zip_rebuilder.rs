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

use crate::zip_parser::{ZipOffsets, EOCD_CD_OFFSET_FIELD};

/// Builds a new zip buffer with `signing_block` right before the Central
/// Directory. If `existing_block_start` is set, everything from there up to the
/// Central Directory is dropped and replaced.
pub fn rebuild_zip_with_signing_block(
    offsets: &ZipOffsets,
    existing_block_start: Option<u64>,
    zip_buf: &[u8],
    signing_block: &[u8]
) -> Result<Vec<u8>> {
    let insertion_point = existing_block_start.unwrap_or(offsets.cd_start);
    let new_cd_start = cd_offset_field(insertion_point, signing_block.len() as u64)?;

    let chunk1_range = 0..insertion_point as usize;
    let chunk3_range = offsets.cd_start as usize..offsets.eocd_start as usize;
    let chunk4_range = offsets.eocd_start as usize..zip_buf.len();

    // Only the CD offset changes, the comment and its length stay put
    let mut eocd = zip_buf[chunk4_range].to_vec();
    let field = EOCD_CD_OFFSET_FIELD as usize;
    LittleEndian::write_u32(&mut eocd[field..field + 4], new_cd_start);

    let discarded = (offsets.cd_start - insertion_point) as usize;
    let mut final_zip: Vec<u8> =
        Vec::with_capacity(zip_buf.len() - discarded + signing_block.len());

    final_zip.extend(&zip_buf[chunk1_range]);
    final_zip.extend(signing_block);
    final_zip.extend(&zip_buf[chunk3_range]);
    final_zip.extend(&eocd);

    // Et voila
    Ok(final_zip)
}

// The EOCD only has 32 bits for this. Refuse rather than truncate.
fn cd_offset_field(insertion_point: u64, block_len: u64) -> Result<u32> {
    let new_cd_start = insertion_point + block_len;
    u32::try_from(new_cd_start).map_err(|_| ZipSigError::CdOffsetOverflow(new_cd_start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_fixtures::*, zip_parser::find_offsets};

    #[test]
    fn cd_moves_forward_by_the_block_length() {
        let zip_buf = build_zip(&["a.txt", "b.txt"]);
        let offsets = find_offsets(&zip_buf).unwrap();
        let block = [0xAB; 100];

        let rebuilt = rebuild_zip_with_signing_block(&offsets, None, &zip_buf, &block).unwrap();
        let new_offsets = find_offsets(&rebuilt).unwrap();

        assert_eq!(rebuilt.len(), zip_buf.len() + 100);
        assert_eq!(new_offsets.cd_start, offsets.cd_start + 100);
        assert_eq!(new_offsets.cd_size, offsets.cd_size);
        let cd_start = offsets.cd_start as usize;
        assert_eq!(&rebuilt[..cd_start], &zip_buf[..cd_start]);
        assert_eq!(&rebuilt[cd_start..cd_start + 100], &block);
    }

    #[test]
    fn replaces_everything_from_the_existing_block() {
        let zip_buf = build_zip(&["a.txt"]);
        let offsets = find_offsets(&zip_buf).unwrap();
        // Pretend the last 10 bytes before the CD were an old block
        let old_start = offsets.cd_start - 10;

        let rebuilt =
            rebuild_zip_with_signing_block(&offsets, Some(old_start), &zip_buf, &[1, 2, 3])
                .unwrap();
        let new_offsets = find_offsets(&rebuilt).unwrap();

        assert_eq!(rebuilt.len(), zip_buf.len() - 10 + 3);
        assert_eq!(new_offsets.cd_start, old_start + 3);
        assert_eq!(&rebuilt[old_start as usize..old_start as usize + 3], &[1, 2, 3]);
    }

    #[test]
    fn comment_is_carried_over() {
        let zip_buf = with_comment(&build_zip(&["a.txt"]), b"signed by nobody");
        let offsets = find_offsets(&zip_buf).unwrap();

        let rebuilt = rebuild_zip_with_signing_block(&offsets, None, &zip_buf, &[0; 8]).unwrap();
        let new_offsets = find_offsets(&rebuilt).unwrap();

        assert!(rebuilt.ends_with(b"signed by nobody"));
        assert_eq!(new_offsets.comment_len, 16);
    }

    #[test]
    fn cd_offset_beyond_32_bits_is_refused() {
        assert_eq!(cd_offset_field(10, 20).unwrap(), 30);
        assert_eq!(cd_offset_field(0, u32::MAX as u64).unwrap(), u32::MAX);
        assert!(matches!(
            cd_offset_field(u32::MAX as u64, 1),
            Err(ZipSigError::CdOffsetOverflow(0x1_0000_0000))
        ));
    }
}

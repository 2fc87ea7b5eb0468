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
use sha2::{Digest, Sha256};

use crate::zip_parser::{ZipOffsets, EOCD_CD_OFFSET_FIELD};

pub type Sha256Hash = [u8; 32];

pub const BYTES_IN_1MB: u32 = 1024 * 1024;
pub const FIRST_LEVEL_CHUNK_MAGIC: &[u8] = &[0xa5];
pub const SECOND_LEVEL_CHUNK_MAGIC: &[u8] = &[0x5a];

/// Computes the SHA-256 content digest that APK Signature Scheme v2 signs.
///
/// `block_start` is where the signing block begins, or would begin: the
/// Central Directory offset for an unsigned archive.
pub fn compute_top_level_hash(
    zip_buf: &[u8],
    offsets: &ZipOffsets,
    block_start: u64
) -> Sha256Hash {
    let first_level_hashes = compute_first_level_hashes(zip_buf, offsets, block_start);

    let mut hasher = Sha256::new();
    hasher.update(SECOND_LEVEL_CHUNK_MAGIC);
    hasher.update((first_level_hashes.len() as u32).to_le_bytes());
    for hash in &first_level_hashes {
        hasher.update(hash);
    }
    hasher.finalize().into()
}

fn compute_first_level_hashes(
    zip_buf: &[u8],
    offsets: &ZipOffsets,
    block_start: u64
) -> Vec<Sha256Hash> {
    // The Android Developer documentation calls these chunks 1, 3 and 4 because the
    //   APK Signing Block is chunk 2.
    let chunk1_range = 0..block_start as usize;
    let chunk3_range = offsets.cd_start as usize..offsets.eocd_start as usize;
    let chunk4_range = offsets.eocd_start as usize..zip_buf.len();

    let mut first_level_hashes = vec![];

    // Chunk 1: ZIP contents before the signing block
    first_level_hashes.extend(hash_chunk(&zip_buf[chunk1_range]));

    // Chunk 3: Central directories
    first_level_hashes.extend(hash_chunk(&zip_buf[chunk3_range]));

    // Chunk 4: the EOCD, but pointing at the signing block rather than the CD,
    //   so the digest is the same before and after the block is inserted.
    //   block_start is never past cd_start, which came from a u32.
    let mut eocd = zip_buf[chunk4_range].to_vec();
    let field = EOCD_CD_OFFSET_FIELD as usize;
    LittleEndian::write_u32(&mut eocd[field..field + 4], block_start as u32);
    first_level_hashes.extend(hash_chunk(&eocd));

    first_level_hashes
}

fn hash_chunk(chunk: &[u8]) -> Vec<Sha256Hash> {
    let mut hasher = Sha256::new();
    let mut chunk_hashes = vec![];

    for piece in chunk.chunks(BYTES_IN_1MB as usize) {
        // Each chunk is 1MB OR whatever's left in the buffer
        hasher.update(FIRST_LEVEL_CHUNK_MAGIC);
        hasher.update((piece.len() as u32).to_le_bytes());
        hasher.update(piece);
        chunk_hashes.push(hasher.finalize_reset().into());
    }

    chunk_hashes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_are_split_at_one_megabyte() {
        let data = vec![0u8; BYTES_IN_1MB as usize * 2 + 1];
        let hashes = hash_chunk(&data);

        assert_eq!(hashes.len(), 3);
        assert_eq!(hashes[0], hashes[1]);
        assert_ne!(hashes[1], hashes[2]);
    }

    #[test]
    fn chunk_hash_is_prefixed_with_magic_and_length() {
        let mut expected = Sha256::new();
        expected.update([0xa5]);
        expected.update(3u32.to_le_bytes());
        expected.update(b"abc");
        let expected: Sha256Hash = expected.finalize().into();

        assert_eq!(hash_chunk(b"abc"), vec![expected]);
    }

    #[test]
    fn empty_chunks_contribute_nothing() {
        assert!(hash_chunk(&[]).is_empty());
    }
}

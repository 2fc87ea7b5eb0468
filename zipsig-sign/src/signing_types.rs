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

// Framing of the APK Signing Block. What goes *inside* the pairs is up to the
// signature scheme, which lives outside this crate.
use byteorder::{ByteOrder, LittleEndian};
use deku::prelude::*;
use zipsig_common::*;

pub const SIGNATURE_SCHEME_V2_BLOCK_ID: u32 = 0x7109871A;
pub const SIGNATURE_SCHEME_V3_BLOCK_ID: u32 = 0xF05368C0;
pub const APK_SIGNING_BLOCK_MAGIC: &[u8; 16] = b"APK Sig Block 42";
/// Leading size field plus trailing magic. The trailing size field IS counted.
pub const SIGNING_BLOCK_FRAMING_LEN: u64 = 8 + 16;

// Named according to the APK Signature Scheme v2 doc

#[derive(Debug, PartialEq, DekuWrite, Clone)]
pub struct ApkSigningBlock {
    // Size of this structure MINUS this field!
    // This field appears twice, the 'minus' is only for one of them.
    // So if the structure is 128 bytes, this reads 120, NOT 112.
    #[deku(endian = "little")]
    pub size_of_self_not_counted: u64,
    pub pairs: SigningBlockPairs,
    #[deku(endian = "little")]
    pub size_of_self_counted: u64,
    pub magic: [u8; 16]
}

// This is in its own block so that we can determine its size before serialising its parent
#[derive(Debug, PartialEq, DekuWrite, Clone)]
pub struct SigningBlockPairs {
    pub pairs: Vec<U64LengthPrefixed<SigningBlockIdValuePair>>
}

#[derive(Debug, PartialEq, Eq, DekuWrite, Clone)]
pub struct SigningBlockIdValuePair {
    #[deku(endian = "little")]
    pub id: u32,
    pub value: Vec<u8>
}

// Outer APK Signing Block structures use u64 lengths
#[derive(Debug, PartialEq, DekuWrite, Clone)]
pub struct U64LengthPrefixed<T: DekuWriter> {
    #[deku(endian = "little")]
    pub length: u64,
    pub value: T
}

impl SigningBlockIdValuePair {
    pub fn new(id: u32, value: Vec<u8>) -> SigningBlockIdValuePair {
        SigningBlockIdValuePair { id, value }
    }

    fn len_pfx_u64(self) -> U64LengthPrefixed<SigningBlockIdValuePair> {
        U64LengthPrefixed {
            length: 4 + self.value.len() as u64,
            value: self
        }
    }
}

impl ApkSigningBlock {
    /// Wraps ID-value pairs in a signing block whose two size fields agree.
    pub fn new(pairs: Vec<SigningBlockIdValuePair>) -> Result<ApkSigningBlock> {
        let pairs = SigningBlockPairs {
            pairs: pairs
                .into_iter()
                .map(SigningBlockIdValuePair::len_pfx_u64)
                .collect()
        };

        let pairs_length = pairs.to_bytes()?.len() as u64;
        // Plus size_of_self_counted plus magic
        let sig_block_size = pairs_length + SIGNING_BLOCK_FRAMING_LEN;

        Ok(ApkSigningBlock {
            size_of_self_not_counted: sig_block_size,
            pairs,
            size_of_self_counted: sig_block_size,
            magic: *APK_SIGNING_BLOCK_MAGIC
        })
    }
}

/// Splits the payload of a signing block (everything between the two size
/// fields) back into its ID-value pairs.
pub fn parse_id_value_pairs(payload: &[u8]) -> Result<Vec<SigningBlockIdValuePair>> {
    let mut pairs = vec![];
    let mut rest = payload;

    while !rest.is_empty() {
        if rest.len() < 8 {
            return Err(malformed(format!(
                "{} trailing bytes are too short for a pair length",
                rest.len()
            )));
        }
        let length = LittleEndian::read_u64(&rest[..8]);
        rest = &rest[8..];
        // Every pair has at least its 4 byte ID
        if length < 4 || length > rest.len() as u64 {
            return Err(malformed(format!(
                "pair length {} does not fit in the {} remaining bytes",
                length,
                rest.len()
            )));
        }
        let (pair, remainder) = rest.split_at(length as usize);
        pairs.push(SigningBlockIdValuePair {
            id: LittleEndian::read_u32(&pair[..4]),
            value: pair[4..].to_vec()
        });
        rest = remainder;
    }

    Ok(pairs)
}

fn malformed(reason: String) -> ZipSigError {
    ZipSigError::SigningBlockMalformed(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_fields_match_and_exclude_the_leading_one() {
        let block = ApkSigningBlock::new(vec![SigningBlockIdValuePair::new(
            SIGNATURE_SCHEME_V2_BLOCK_ID,
            vec![7; 10]
        )])
        .unwrap();
        let bytes = block.to_bytes().unwrap();

        // 8 (length) + 4 (id) + 10 (value) of pairs
        let size = 22 + SIGNING_BLOCK_FRAMING_LEN;
        assert_eq!(bytes.len() as u64, size + 8);
        assert_eq!(LittleEndian::read_u64(&bytes[..8]), size);
        let trailer = bytes.len() - 24;
        assert_eq!(LittleEndian::read_u64(&bytes[trailer..trailer + 8]), size);
        assert!(bytes.ends_with(APK_SIGNING_BLOCK_MAGIC));
    }

    #[test]
    fn payload_splits_back_into_pairs() {
        let pairs = vec![
            SigningBlockIdValuePair::new(SIGNATURE_SCHEME_V2_BLOCK_ID, b"v2 signers".to_vec()),
            SigningBlockIdValuePair::new(SIGNATURE_SCHEME_V3_BLOCK_ID, vec![])
        ];
        let block = ApkSigningBlock::new(pairs.clone()).unwrap();
        let payload = block.pairs.to_bytes().unwrap();

        assert_eq!(parse_id_value_pairs(&payload).unwrap(), pairs);
    }

    #[test]
    fn empty_payload_has_no_pairs() {
        assert!(parse_id_value_pairs(&[]).unwrap().is_empty());
    }

    #[test]
    fn truncated_pairs_are_malformed() {
        let mut payload = 100u64.to_le_bytes().to_vec();
        payload.extend([0; 20]);
        assert!(matches!(
            parse_id_value_pairs(&payload),
            Err(ZipSigError::SigningBlockMalformed(_))
        ));
        assert!(matches!(
            parse_id_value_pairs(&[1, 2, 3]),
            Err(ZipSigError::SigningBlockMalformed(_))
        ));
    }
}

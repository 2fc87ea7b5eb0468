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

use deku::DekuContainerWrite;
use zipsig_common::*;
use zipsig_zip::read_member_names;

use crate::{
    hasher::{compute_top_level_hash, Sha256Hash},
    observer::LocateObserver,
    signing_block::{find_signing_block, LocatedSigningBlock},
    signing_types::{parse_id_value_pairs, ApkSigningBlock},
    zip_parser::{find_offsets, ZipOffsets},
    zip_rebuilder::rebuild_zip_with_signing_block
};

/// Members that every APK has. An archive with all three is treated as one.
const APK_MEMBERS: [&str; 3] = ["classes.dex", "AndroidManifest.xml", "resources.arsc"];

/// The structural offsets of one ZIP file, and the bytes they were found in.
///
/// Created by [ArchiveDescriptor::locate] and never changed afterwards. The
/// descriptor keeps its own copy of the bytes, so the caller is free to reuse
/// or modify the buffer it passed in.
#[derive(Debug, Clone)]
pub struct ArchiveDescriptor {
    raw: Vec<u8>,
    offsets: ZipOffsets,
    signing_block: Option<LocatedSigningBlock>,
    is_container_of_interest: bool,
    has_v1_signature_files: bool
}

impl ArchiveDescriptor {
    /// Finds the End of Central Directory, Central Directory and (if present)
    /// APK Signing Block within `zip_buf`.
    ///
    /// Fails if the buffer is not a ZIP file, or if it is one but its Central
    /// Directory isn't immediately followed by its EOCD. A signing block that
    /// is missing or has inconsistent size fields is not a failure: the
    /// archive is just reported as not v2 signed.
    pub fn locate(zip_buf: &[u8]) -> Result<ArchiveDescriptor> {
        Self::locate_with_observer(zip_buf, &())
    }

    /// Same as [ArchiveDescriptor::locate], but tells `observer` about the result.
    pub fn locate_with_observer(
        zip_buf: &[u8],
        observer: &dyn LocateObserver
    ) -> Result<ArchiveDescriptor> {
        let raw = zip_buf.to_vec();
        let offsets = find_offsets(&raw)?;

        let names = read_member_names(&raw)?;
        let is_container_of_interest = APK_MEMBERS
            .iter()
            .all(|member| names.iter().any(|name| name.as_str() == *member));
        // JAR signing (v1) leaves a signature file and a certificate file behind
        let has_sf = names.iter().any(|name| name.ends_with(".SF"));
        let has_cert = names
            .iter()
            .any(|name| name.ends_with(".RSA") || name.ends_with(".DSA"));

        let signing_block = find_signing_block(&raw, &offsets);

        let archive = ArchiveDescriptor {
            raw,
            offsets,
            signing_block,
            is_container_of_interest,
            has_v1_signature_files: has_sf && has_cert
        };
        observer.located(&archive);
        Ok(archive)
    }

    /// Length of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.raw.len() as u64
    }

    pub fn eocd_offset(&self) -> u64 {
        self.offsets.eocd_start
    }

    pub fn cd_offset(&self) -> u64 {
        self.offsets.cd_start
    }

    pub fn cd_size(&self) -> u64 {
        self.offsets.cd_size
    }

    pub fn comment_len(&self) -> u64 {
        self.offsets.comment_len
    }

    /// Offset of the APK Signing Block, or 0 if there isn't one.
    pub fn asv2_offset(&self) -> u64 {
        self.signing_block.as_ref().map_or(0, |block| block.start)
    }

    pub fn has_v2_signature(&self) -> bool {
        self.signing_block.is_some()
    }

    /// Whether the archive contains `classes.dex`, `AndroidManifest.xml` and
    /// `resources.arsc`, ie. it looks like an APK rather than any old ZIP.
    pub fn is_container_of_interest(&self) -> bool {
        self.is_container_of_interest
    }

    /// Whether there are `.SF` and `.RSA`/`.DSA` members. Purely informational,
    /// their contents aren't checked.
    pub fn has_v1_signature_files(&self) -> bool {
        self.has_v1_signature_files
    }

    /// Returns the contents of the APK Signing Block, without its size fields
    /// and magic. This is what a signature verifier needs.
    pub fn signing_block_payload(&self) -> Result<&[u8]> {
        self.signing_block
            .as_ref()
            .map(|block| block.payload.as_slice())
            .ok_or(ZipSigError::NotV2Signed)
    }

    /// Looks up one ID-value pair in the APK Signing Block, for example
    /// [SIGNATURE_SCHEME_V2_BLOCK_ID](crate::SIGNATURE_SCHEME_V2_BLOCK_ID).
    pub fn signature_scheme_block(&self, id: u32) -> Result<Option<Vec<u8>>> {
        let pairs = parse_id_value_pairs(self.signing_block_payload()?)?;
        Ok(pairs
            .into_iter()
            .find(|pair| pair.id == id)
            .map(|pair| pair.value))
    }

    /// Returns a copy of the archive's bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.raw.clone()
    }

    /// Digest of everything except the signing block, as signed by APK
    /// Signature Scheme v2. Inserting or replacing the block doesn't change it.
    pub fn content_digest(&self) -> Sha256Hash {
        let block_start = self
            .signing_block
            .as_ref()
            .map_or(self.offsets.cd_start, |block| block.start);
        compute_top_level_hash(&self.raw, &self.offsets, block_start)
    }

    /// Returns a new archive with `signing_block` inserted right before the
    /// Central Directory, and the EOCD updated to match.
    ///
    /// If the archive already has a signing block, it is thrown away and
    /// replaced. Anything from the old block that should survive has to be
    /// part of `signing_block` already.
    ///
    /// `self` is left alone. Call [ArchiveDescriptor::locate] on the result to
    /// inspect it.
    pub fn inject_before_cd(&self, signing_block: &[u8]) -> Result<Vec<u8>> {
        let existing_block_start = self.signing_block.as_ref().map(|block| block.start);
        rebuild_zip_with_signing_block(
            &self.offsets,
            existing_block_start,
            &self.raw,
            signing_block
        )
    }

    pub fn inject_signing_block(&self, signing_block: &ApkSigningBlock) -> Result<Vec<u8>> {
        self.inject_before_cd(&signing_block.to_bytes()?)
    }
}

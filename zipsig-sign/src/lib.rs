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

//! # ZIPSIG
//!
//! Finds and replaces the APK Signing Block of a ZIP file.
//!
//! APK Signature Scheme v2 (and v3) signs the *whole* file by putting a block
//! of signature data between the last file entry and the Central Directory.
//! Ordinary ZIP readers skip over it. This crate finds that block, hands out
//! its contents, and builds new archives with a different block in its place.
//! Producing and checking the signatures themselves is left to the caller.
//!
//! ```ignore
//! let archive = ArchiveDescriptor::locate(&apk_bytes)?;
//! let digest = archive.content_digest();
//! // ...sign the digest somewhere else...
//! let block = ApkSigningBlock::new(vec![SigningBlockIdValuePair::new(
//!     SIGNATURE_SCHEME_V2_BLOCK_ID,
//!     v2_signers
//! )])?;
//! let signed_bytes = archive.inject_signing_block(&block)?;
//! assert!(ArchiveDescriptor::locate(&signed_bytes)?.has_v2_signature());
//! ```

pub use archive::ArchiveDescriptor;
pub use hasher::Sha256Hash;
pub use observer::{LocateObserver, StderrObserver};
pub use signing_types::{
    parse_id_value_pairs, ApkSigningBlock, SigningBlockIdValuePair, SigningBlockPairs,
    U64LengthPrefixed, APK_SIGNING_BLOCK_MAGIC, SIGNATURE_SCHEME_V2_BLOCK_ID,
    SIGNATURE_SCHEME_V3_BLOCK_ID
};
pub use zipsig_common::{Result, ZipSigError};

mod archive;
mod hasher;
mod observer;
mod signing_block;
mod signing_types;
#[cfg(test)]
mod test_fixtures;
mod zip_parser;
mod zip_rebuilder;

// APK Signature Scheme v2 based on https://source.android.com/docs/security/features/apksigning/v2

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

use std::{io, rc::Rc};

use deku::prelude::*;
use zip::result::ZipError;

/// Common error type making it easier to share `Result`s between ZIPSIG crates.
///
/// In general designed to avoid needing utilities like `map_err`.
#[derive(Debug, Clone)]
pub enum ZipSigError {
    /// zipsig-cli encountered an error while processing something specific to
    /// the command line implementation. For example, not enough arguments were
    /// passed via the shell.
    Cli(String),
    /// The buffer is shorter than the 22 fixed bytes of an End Of Central
    /// Directory record, so it cannot possibly be a ZIP file.
    TooSmall,
    /// Every possible comment length was tried and no End Of Central
    /// Directory record was found that both echoes its own comment length and
    /// points at a Central Directory. The input is definitely not a ZIP file.
    NotAZipContainer,
    /// A genuine End Of Central Directory record and Central Directory were
    /// found, but the Central Directory does not end exactly where the End Of
    /// Central Directory begins. Signing requires them to be adjacent, so the
    /// file is either corrupted or has been tampered with.
    CdNotAdjacentToEocd,
    /// The offsets checked out, but the `zip` crate failed to read the entry
    /// table when listing member names. See [ZipError].
    EntryReadFailure(Rc<ZipError>),
    /// Signing block data was requested from an archive which does not carry
    /// an APK Signing Block.
    NotV2Signed,
    /// Injecting the signing block would push the Central Directory past the
    /// 4GiB mark, which a 32-bit End Of Central Directory offset field cannot
    /// describe. ZIP64 is not supported.
    CdOffsetOverflow(u64),
    /// The payload of an APK Signing Block is not a well-formed sequence of
    /// length-prefixed ID-value pairs.
    SigningBlockMalformed(String),
    /// Something went wrong while serialising a signing block structure.
    /// See [DekuError].
    ByteSerialisationFailed(DekuError),
    /// An error occurred while reading or writing to disk. Since only
    /// `zipsig-cli` interacts with the disk, it's likely that one of the file
    /// paths you passed to it is invalid, or the disk was full or similar.
    FileIoError(Rc<io::Error>),
    /// `zipsig-zip` failed to create a zip file in-memory.
    ZipWritingFailed(Rc<ZipError>)
}

/// Result type where the error is always [ZipSigError].
pub type Result<T> = std::result::Result<T, ZipSigError>;

/// This makes it easier to print a `Result<Something, ZipSigError>` from the CLI
impl From<ZipSigError> for String {
    fn from(value: ZipSigError) -> Self {
        format!("{:?}", value)
    }
}

// Automatic conversion from other types of error to ZipSigError makes the rest of the code cleaner
impl From<io::Error> for ZipSigError {
    fn from(value: io::Error) -> Self {
        ZipSigError::FileIoError(value.into())
    }
}

impl From<DekuError> for ZipSigError {
    fn from(value: DekuError) -> Self {
        ZipSigError::ByteSerialisationFailed(value)
    }
}

// Reading goes through `read_member_names`, which maps to EntryReadFailure itself
impl From<ZipError> for ZipSigError {
    fn from(value: ZipError) -> Self {
        ZipSigError::ZipWritingFailed(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_to_file_io_error() {
        let err: ZipSigError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, ZipSigError::FileIoError(_)));
    }

    #[test]
    fn errors_render_as_strings() {
        let rendered: String = ZipSigError::CdOffsetOverflow(1 << 33).into();
        assert_eq!(rendered, "CdOffsetOverflow(8589934592)");
    }
}

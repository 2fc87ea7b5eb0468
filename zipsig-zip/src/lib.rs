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

//! Thin wrappers over the `zip` crate for the parts of ZIPSIG that need an
//! ordinary view of the archive: listing its members, and writing archives.

use std::io::{Cursor, Seek, Write};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};
use zipsig_common::*;

pub struct File {
    pub path: String,
    pub data: Vec<u8>
}

const UNCOMPRESSED_FILES: &[&str] = &["resources.arsc"];

/// Lists the names of every member in the archive's entry table, in
/// Central Directory order.
pub fn read_member_names(zip_buf: &[u8]) -> Result<Vec<String>> {
    let archive = ZipArchive::new(Cursor::new(zip_buf))
        .map_err(|e| ZipSigError::EntryReadFailure(e.into()))?;
    Ok(archive.file_names().map(String::from).collect())
}

/// Writes `files` as a 4-byte aligned archive. Nothing in ZIPSIG writes
/// archives for real, this is how tests build their inputs.
// Output can be a file *or* a buffer in memory
pub fn zip_files<T: Write + Seek>(files: &[File], output: T) -> Result<T> {
    let mut zip = ZipWriter::new(output);
    let compressed_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .with_alignment(4);
    // Some files in APKs are not allowed to be compressed
    let uncompressed_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .with_alignment(4);

    for file in files {
        let options = if UNCOMPRESSED_FILES.contains(&&file.path[..]) {
            uncompressed_options
        } else {
            compressed_options
        };
        zip.start_file(file.path.as_str(), options)?;
        zip.write_all(&file.data)?;
    }

    Ok(zip.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, data: &[u8]) -> File {
        File {
            path: path.into(),
            data: data.to_vec()
        }
    }

    #[test]
    fn written_archives_list_their_members() {
        let files = vec![
            file("AndroidManifest.xml", b"<manifest/>"),
            file("resources.arsc", &[0; 64]),
            file("res/raw/a.txt", b"hello")
        ];
        let zip_buf = zip_files(&files, Cursor::new(vec![])).unwrap().into_inner();

        let mut names = read_member_names(&zip_buf).unwrap();
        names.sort();
        assert_eq!(
            names,
            vec!["AndroidManifest.xml", "res/raw/a.txt", "resources.arsc"]
        );
    }

    #[test]
    fn garbage_is_an_entry_read_failure() {
        let err = read_member_names(&[0x42; 100]).unwrap_err();
        assert!(matches!(err, ZipSigError::EntryReadFailure(_)));
    }
}

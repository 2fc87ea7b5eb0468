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

// In-memory archives for the unit tests

use byteorder::{ByteOrder, LittleEndian};
use std::io::Cursor;
use zipsig_zip::{zip_files, File};

use crate::zip_parser::{find_offsets, EOCD_CD_OFFSET_FIELD, EOCD_COMMENT_LEN_FIELD, EOCD_MAGIC};

pub fn build_zip(names: &[&str]) -> Vec<u8> {
    let files: Vec<File> = names
        .iter()
        .map(|name| File {
            path: name.to_string(),
            data: format!("contents of {}", name).into_bytes()
        })
        .collect();
    zip_files(&files, Cursor::new(vec![])).unwrap().into_inner()
}

pub fn build_apk() -> Vec<u8> {
    build_zip(&[
        "AndroidManifest.xml",
        "classes.dex",
        "resources.arsc",
        "res/raw/hello.txt"
    ])
}

/// Appends `comment` to a zip that doesn't have one yet.
pub fn with_comment(zip_buf: &[u8], comment: &[u8]) -> Vec<u8> {
    let mut commented = zip_buf.to_vec();
    let field = zip_buf.len() - 22 + EOCD_COMMENT_LEN_FIELD as usize;
    LittleEndian::write_u16(&mut commented[field..field + 2], comment.len() as u16);
    commented.extend(comment);
    commented
}

/// 22 bytes that start with the EOCD magic, for hiding in comments.
pub fn fake_eocd(cd_offset: u32, comment_len: u16) -> Vec<u8> {
    let mut eocd = EOCD_MAGIC.to_le_bytes().to_vec();
    // Disk numbers
    eocd.extend([0; 4]);
    // One entry on this disk, one in total
    eocd.extend([1, 0, 1, 0]);
    eocd.extend(46u32.to_le_bytes());
    eocd.extend(cd_offset.to_le_bytes());
    eocd.extend(comment_len.to_le_bytes());
    eocd
}

/// Inserts raw bytes before the Central Directory without any checks.
pub fn splice_before_cd(zip_buf: &[u8], block: &[u8]) -> Vec<u8> {
    let offsets = find_offsets(zip_buf).unwrap();
    let cd_start = offsets.cd_start as usize;

    let mut spliced = zip_buf[..cd_start].to_vec();
    spliced.extend(block);
    spliced.extend(&zip_buf[cd_start..]);

    let field = offsets.eocd_start as usize + block.len() + EOCD_CD_OFFSET_FIELD as usize;
    LittleEndian::write_u32(
        &mut spliced[field..field + 4],
        (cd_start + block.len()) as u32
    );
    spliced
}

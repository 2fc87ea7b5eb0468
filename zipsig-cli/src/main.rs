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

use std::{env, fs, process::ExitCode};
use zipsig_sign::{
    ApkSigningBlock, ArchiveDescriptor, Result, SigningBlockIdValuePair, StderrObserver,
    ZipSigError, SIGNATURE_SCHEME_V2_BLOCK_ID
};

/// Inspects, extracts or replaces the APK Signing Block of a ZIP file.
///
/// ```text
/// $ zipsig-cli inspect ./app.apk
/// $ zipsig-cli extract ./app.apk ./app.sigblock
/// $ zipsig-cli inject ./app.apk ./v2-signers.bin ./app-signed.apk
/// ```
///
/// `inject` wraps the contents of the second file as the APK Signature Scheme
/// v2 block. Any existing signing block is replaced, not merged.
fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message: String = e.into();
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let command = arg(1, "Command (inspect, extract or inject) not provided")?;
    let in_path = arg(2, "Input archive path not provided")?;
    let archive = ArchiveDescriptor::locate_with_observer(&fs::read(&in_path)?, &StderrObserver)?;

    match command.as_str() {
        "inspect" => inspect(&archive),
        "extract" => {
            let out_path = arg(3, "Output payload path not provided")?;
            fs::write(&out_path, archive.signing_block_payload()?)?;
            println!("Wrote {:?} to disk", out_path);
        }
        "inject" => {
            let v2_path = arg(3, "V2 signers block path not provided")?;
            let out_path = arg(4, "Output archive path not provided")?;
            let block = ApkSigningBlock::new(vec![SigningBlockIdValuePair::new(
                SIGNATURE_SCHEME_V2_BLOCK_ID,
                fs::read(&v2_path)?
            )])?;
            fs::write(&out_path, archive.inject_signing_block(&block)?)?;
            println!("Wrote {:?} to disk", out_path);
        }
        other => {
            return Err(ZipSigError::Cli(format!("Unknown command {:?}", other)));
        }
    }

    Ok(())
}

fn arg(position: usize, missing: &str) -> Result<String> {
    env::args()
        .nth(position)
        .ok_or_else(|| ZipSigError::Cli(missing.into()))
}

fn inspect(archive: &ArchiveDescriptor) {
    println!("Size:               {}", archive.size());
    println!("Central Directory:  {} ({} bytes)", archive.cd_offset(), archive.cd_size());
    println!("EOCD:               {}", archive.eocd_offset());
    println!("Comment length:     {}", archive.comment_len());
    println!("Looks like an APK:  {}", archive.is_container_of_interest());
    println!("V1 signature files: {}", archive.has_v1_signature_files());
    println!("V2 signed:          {}", archive.has_v2_signature());
    if archive.has_v2_signature() {
        println!("Signing block:      {}", archive.asv2_offset());
    }
    let digest: String = archive
        .content_digest()
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect();
    println!("Content digest:     {}", digest);
}

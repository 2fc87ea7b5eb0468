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

use crate::archive::ArchiveDescriptor;

/// Gets told about every archive that was located successfully.
///
/// ZIPSIG's library crates never print anything themselves. If you want to
/// see the offsets that were found, pass one of these to
/// [ArchiveDescriptor::locate_with_observer].
pub trait LocateObserver {
    fn located(&self, archive: &ArchiveDescriptor);
}

/// Observes nothing. This is what [ArchiveDescriptor::locate] uses.
impl LocateObserver for () {
    fn located(&self, _archive: &ArchiveDescriptor) {}
}

/// Prints the signing block, Central Directory and EOCD offsets to stderr.
pub struct StderrObserver;

impl LocateObserver for StderrObserver {
    fn located(&self, archive: &ArchiveDescriptor) {
        eprintln!(
            "Located ASv2, CD, EOCD at {} {} {}",
            archive.asv2_offset(),
            archive.cd_offset(),
            archive.eocd_offset()
        );
    }
}

// Copyright 2025 Fernando Borretti
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

use std::fs::read_to_string;
use std::path::Path;

use crate::catalogue::Catalogue;
use crate::catalogue::Language;
use crate::catalogue::parse_verse_file;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::timestamp::Timestamp;

/// Load a translation from a JSON text file into the catalogue. Returns the
/// number of verses imported.
pub async fn import_translation<C: Catalogue>(
    catalogue: &C,
    path: &Path,
    language: &Language,
    now: Timestamp,
) -> Fallible<usize> {
    if !path.exists() {
        return fail(format!("no such file: {}.", path.display()));
    }
    log::debug!("Importing {} from {}", language.version, path.display());
    let verses = parse_verse_file(&read_to_string(path)?)?;
    catalogue.import(language, &verses, now).await
}

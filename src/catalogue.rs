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

//! The local, read-mostly catalogue of Bible text: books, chapters, verses,
//! and their translations. It is filled by importing a text file and never
//! synced.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Fallible;
use crate::types::timestamp::Timestamp;
use crate::types::verse::VerseRef;

/// A translation of the whole text, e.g. English KJV.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Language {
    pub name: String,
    /// Unique across languages, so it also serves as the id.
    pub version: String,
}

impl Language {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[async_trait]
pub trait Catalogue: Send + Sync {
    /// Add a translation, creating the books, chapters and verses it names.
    /// Re-importing replaces the text. All or nothing. Returns the number of
    /// verses imported.
    async fn import(
        &self,
        language: &Language,
        verses: &[(VerseRef, String)],
        now: Timestamp,
    ) -> Fallible<usize>;

    async fn verse_exists(&self, verse_id: &str) -> Fallible<bool>;

    /// The text of a verse in the given version, if it has been imported.
    async fn verse_text(&self, verse_id: &str, version: &str) -> Fallible<Option<String>>;
}

/// Parse a text file: a JSON object from references like `"Genesis 1:1"` to
/// the verse text.
pub fn parse_verse_file(content: &str) -> Fallible<Vec<(VerseRef, String)>> {
    let entries: BTreeMap<String, String> = serde_json::from_str(content)?;
    let mut verses = Vec::with_capacity(entries.len());
    for (reference, text) in entries {
        verses.push((VerseRef::parse(&reference)?, text));
    }
    Ok(verses)
}

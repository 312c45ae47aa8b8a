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

pub mod add;
pub mod due;
pub mod import;
pub mod review;
pub mod sync;

use crate::error::Fallible;
use crate::error::fail;
use crate::store::Store;
use crate::types::collection::Collection;
use crate::types::verse::VerseRef;

pub async fn find_collection<S: Store>(store: &S, name: &str) -> Fallible<Collection> {
    match store.collection_by_name(name).await? {
        Some(collection) => Ok(collection),
        None => fail(format!("no collection named {name:?}.")),
    }
}

/// The verse's reference with the book spelled out. Cards pulled from
/// another device may name verses this one has never seen, so anything
/// unparseable is shown as is.
pub fn describe_verse(verse_id: &str) -> String {
    match VerseRef::parse(verse_id) {
        Ok(verse) => verse.verbose(),
        Err(_) => verse_id.to_string(),
    }
}

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

use serde::Deserialize;
use serde::Serialize;

use crate::types::new_id;
use crate::types::timestamp::Timestamp;

/// Links a card to a verse.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardVerse {
    pub id: String,
    pub card_id: String,
    pub verse_id: String,
    pub created_date: Timestamp,
    #[serde(default)]
    pub updated_date: Option<Timestamp>,
}

impl CardVerse {
    pub fn new(card_id: impl Into<String>, verse_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: new_id(),
            card_id: card_id.into(),
            verse_id: verse_id.into(),
            created_date: now,
            updated_date: Some(now),
        }
    }
}

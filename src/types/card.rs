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

use crate::sm2::INITIAL_EASE_FACTOR;
use crate::types::date::Date;
use crate::types::new_id;
use crate::types::timestamp::Timestamp;

/// A verse scheduled for review within one collection.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub collection_id: String,
    pub verse_id: String,
    /// When the card was last reviewed (or reset).
    pub last_review_date: Timestamp,
    /// Multiplier for interval growth. Never below 1.3.
    pub ease_factor: f64,
    /// Days between the last review and the next one.
    pub interval: u32,
    /// Consecutive successful recalls.
    pub repetition_number: u32,
    pub created_date: Timestamp,
    #[serde(default)]
    pub updated_date: Option<Timestamp>,
}

impl Card {
    /// A card that has never been reviewed. It is due immediately.
    pub fn new(collection_id: impl Into<String>, verse_id: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id: new_id(),
            collection_id: collection_id.into(),
            verse_id: verse_id.into(),
            last_review_date: now,
            ease_factor: INITIAL_EASE_FACTOR,
            interval: 0,
            repetition_number: 0,
            created_date: now,
            updated_date: Some(now),
        }
    }

    pub fn due_date(&self) -> Date {
        self.last_review_date.date().add_days(self.interval)
    }

    pub fn is_due(&self, today: Date) -> bool {
        self.due_date() <= today
    }
}

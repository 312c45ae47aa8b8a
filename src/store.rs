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

use async_trait::async_trait;

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::card_verse::CardVerse;
use crate::types::changeset::EntityKind;
use crate::types::changeset::Rows;
use crate::types::collection::Collection;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

/// The local system of record.
///
/// Every method is atomic on its own. Nothing here locks across calls: the
/// review and sync engines assume they are the only writers while they run.
#[async_trait]
pub trait Store: Send + Sync {
    /// The cards of a collection that are due on or before `today`, in a
    /// stable order.
    async fn find_due(&self, collection_id: &str, today: Date) -> Fallible<Vec<Card>>;

    /// Every card of a collection, in the same order as `find_due`.
    async fn cards_in_collection(&self, collection_id: &str) -> Fallible<Vec<Card>>;

    async fn collection_by_name(&self, name: &str) -> Fallible<Option<Collection>>;

    /// Write the scheduling fields of each card, setting both its last review
    /// and updated timestamps to `now`. All or nothing.
    async fn batch_update(&self, cards: &[Card], now: Timestamp) -> Fallible<()>;

    /// Insert a new card together with its card-verse row. All or nothing.
    async fn add_card(&self, card: &Card, card_verse: &CardVerse) -> Fallible<()>;

    /// Insert each row, or overwrite every column of the row with the same
    /// id. All or nothing.
    async fn upsert(&self, rows: &Rows) -> Fallible<()>;

    /// The rows of one kind updated strictly after the start of `since`, or
    /// all of them if `since` is `None`.
    async fn updated_since(&self, kind: EntityKind, since: Option<Date>) -> Fallible<Rows>;

    /// The date of the last successful pull.
    async fn watermark(&self) -> Fallible<Option<Date>>;

    async fn set_watermark(&self, date: Date) -> Fallible<()>;
}

/// Whether a row last updated at `updated` is newer than the watermark.
/// Rows that were never updated only match a full sync.
pub fn updated_after(updated: Option<Timestamp>, since: Option<Date>) -> bool {
    match since {
        None => true,
        Some(since) => match updated {
            Some(updated) => updated > Timestamp::start_of(since),
            None => false,
        },
    }
}

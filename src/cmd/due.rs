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

use serde::Serialize;

use crate::cmd::describe_verse;
use crate::cmd::find_collection;
use crate::error::Fallible;
use crate::store::Store;
use crate::types::date::Date;

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DueCard {
    verse_id: String,
    /// The verse with its book spelled out.
    reference: String,
    due_date: Date,
    interval: u32,
    repetition_number: u32,
    ease_factor: f64,
}

pub async fn due_cards<S: Store>(store: &S, collection_name: &str, today: Date) -> Fallible<Vec<DueCard>> {
    let collection = find_collection(store, collection_name).await?;
    let cards = store.find_due(&collection.id, today).await?;
    let due = cards
        .into_iter()
        .map(|card| DueCard {
            due_date: card.due_date(),
            reference: describe_verse(&card.verse_id),
            verse_id: card.verse_id,
            interval: card.interval,
            repetition_number: card.repetition_number,
            ease_factor: card.ease_factor,
        })
        .collect();
    Ok(due)
}

pub async fn print_due_cards<S: Store>(store: &S, collection_name: &str, today: Date) -> Fallible<()> {
    let due = due_cards(store, collection_name, today).await?;
    let json = serde_json::to_string_pretty(&due)?;
    println!("{json}");
    Ok(())
}

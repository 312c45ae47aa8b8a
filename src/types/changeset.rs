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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::types::card::Card;
use crate::types::card_verse::CardVerse;
use crate::types::collection::Collection;

/// The kinds of record exchanged with the remote.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Collection,
    Card,
    CardVerse,
}

impl EntityKind {
    /// In foreign key order: parents before children.
    pub const ALL: [EntityKind; 3] = [EntityKind::Collection, EntityKind::Card, EntityKind::CardVerse];

    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Collection => "collections",
            EntityKind::Card => "cards",
            EntityKind::CardVerse => "card_verses",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A homogeneous batch of records of one kind.
#[derive(Clone, PartialEq, Debug)]
pub enum Rows {
    Collections(Vec<Collection>),
    Cards(Vec<Card>),
    CardVerses(Vec<CardVerse>),
}

impl Rows {
    pub fn kind(&self) -> EntityKind {
        match self {
            Rows::Collections(_) => EntityKind::Collection,
            Rows::Cards(_) => EntityKind::Card,
            Rows::CardVerses(_) => EntityKind::CardVerse,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Rows::Collections(rows) => rows.len(),
            Rows::Cards(rows) => rows.len(),
            Rows::CardVerses(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The body of both sync requests: every record of each kind that changed.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changeset {
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub card_verses: Vec<CardVerse>,
}

impl Changeset {
    pub fn insert(&mut self, rows: Rows) {
        match rows {
            Rows::Collections(rows) => self.collections = rows,
            Rows::Cards(rows) => self.cards = rows,
            Rows::CardVerses(rows) => self.card_verses = rows,
        }
    }

    /// Split into per-kind batches, parents first.
    pub fn into_rows(self) -> [Rows; 3] {
        [
            Rows::Collections(self.collections),
            Rows::Cards(self.cards),
            Rows::CardVerses(self.card_verses),
        ]
    }

    pub fn len(&self) -> usize {
        self.collections.len() + self.cards.len() + self.card_verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

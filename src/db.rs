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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::catalogue::Catalogue;
use crate::catalogue::Language;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::store::Store;
use crate::store::updated_after;
use crate::types::card::Card;
use crate::types::card_verse::CardVerse;
use crate::types::changeset::EntityKind;
use crate::types::changeset::Rows;
use crate::types::collection::Collection;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;
use crate::types::verse::VerseRef;

const WATERMARK_KEY: &str = "last_pull";

/// A SQLite-backed store.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema in {database_path}");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

#[async_trait]
impl Store for Database {
    async fn find_due(&self, collection_id: &str, today: Date) -> Fallible<Vec<Card>> {
        let cards = self.cards_in_collection(collection_id).await?;
        Ok(cards.into_iter().filter(|card| card.is_due(today)).collect())
    }

    async fn cards_in_collection(&self, collection_id: &str) -> Fallible<Vec<Card>> {
        let conn = self.acquire();
        let sql = format!(
            "select {CARD_COLUMNS} from cards where collection_id = ? order by created_date, id;"
        );
        let mut stmt = conn.prepare(&sql)?;
        let cards = stmt
            .query_map([collection_id], card_from_row)?
            .collect::<Result<Vec<Card>, _>>()?;
        Ok(cards)
    }

    async fn collection_by_name(&self, name: &str) -> Fallible<Option<Collection>> {
        let conn = self.acquire();
        let sql = "select id, name, created_date, updated_date from collections where name = ?;";
        let collection = conn
            .query_row(sql, [name], collection_from_row)
            .optional()?;
        Ok(collection)
    }

    async fn batch_update(&self, cards: &[Card], now: Timestamp) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        for card in cards {
            let sql = "update cards set last_review_date = ?, ease_factor = ?, interval = ?, repetition_number = ?, updated_date = ? where id = ?;";
            let changed = tx.execute(
                sql,
                (
                    now,
                    card.ease_factor,
                    card.interval,
                    card.repetition_number,
                    now,
                    &card.id,
                ),
            )?;
            if changed != 1 {
                // Dropping the transaction rolls back the cards already written.
                return Err(ErrorReport::storage(format!("no card with id {}.", card.id)));
            }
        }
        tx.commit()?;
        log::debug!("Updated {} cards", cards.len());
        Ok(())
    }

    async fn add_card(&self, card: &Card, card_verse: &CardVerse) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let sql = format!("insert into cards ({CARD_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?);");
        tx.execute(
            &sql,
            (
                &card.id,
                &card.collection_id,
                &card.verse_id,
                card.last_review_date,
                card.ease_factor,
                card.interval,
                card.repetition_number,
                card.created_date,
                card.updated_date,
            ),
        )?;
        let sql = "insert into card_verses (id, card_id, verse_id, created_date, updated_date) values (?, ?, ?, ?, ?);";
        tx.execute(
            sql,
            (
                &card_verse.id,
                &card_verse.card_id,
                &card_verse.verse_id,
                card_verse.created_date,
                card_verse.updated_date,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    async fn upsert(&self, rows: &Rows) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        match rows {
            Rows::Collections(rows) => {
                for row in rows {
                    upsert_collection(&tx, row)?;
                }
            }
            Rows::Cards(rows) => {
                for row in rows {
                    upsert_card(&tx, row)?;
                }
            }
            Rows::CardVerses(rows) => {
                for row in rows {
                    upsert_card_verse(&tx, row)?;
                }
            }
        }
        tx.commit()?;
        log::debug!("Upserted {} {}", rows.len(), rows.kind());
        Ok(())
    }

    async fn updated_since(&self, kind: EntityKind, since: Option<Date>) -> Fallible<Rows> {
        let conn = self.acquire();
        let rows = match kind {
            EntityKind::Collection => {
                let sql = "select id, name, created_date, updated_date from collections order by created_date, id;";
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt
                    .query_map([], collection_from_row)?
                    .collect::<Result<Vec<Collection>, _>>()?;
                Rows::Collections(
                    rows.into_iter()
                        .filter(|row| updated_after(row.updated_date, since))
                        .collect(),
                )
            }
            EntityKind::Card => {
                let sql = format!("select {CARD_COLUMNS} from cards order by created_date, id;");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], card_from_row)?
                    .collect::<Result<Vec<Card>, _>>()?;
                Rows::Cards(
                    rows.into_iter()
                        .filter(|row| updated_after(row.updated_date, since))
                        .collect(),
                )
            }
            EntityKind::CardVerse => {
                let sql = "select id, card_id, verse_id, created_date, updated_date from card_verses order by created_date, id;";
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt
                    .query_map([], card_verse_from_row)?
                    .collect::<Result<Vec<CardVerse>, _>>()?;
                Rows::CardVerses(
                    rows.into_iter()
                        .filter(|row| updated_after(row.updated_date, since))
                        .collect(),
                )
            }
        };
        Ok(rows)
    }

    async fn watermark(&self) -> Fallible<Option<Date>> {
        let conn = self.acquire();
        let sql = "select value from sync_state where key = ?;";
        let date: Option<Date> = conn
            .query_row(sql, [WATERMARK_KEY], |row| row.get(0))
            .optional()?;
        Ok(date)
    }

    async fn set_watermark(&self, date: Date) -> Fallible<()> {
        let conn = self.acquire();
        let sql = "insert into sync_state (key, value) values (?, ?) on conflict (key) do update set value = excluded.value;";
        conn.execute(sql, (WATERMARK_KEY, date))?;
        Ok(())
    }
}

#[async_trait]
impl Catalogue for Database {
    async fn import(
        &self,
        language: &Language,
        verses: &[(VerseRef, String)],
        now: Timestamp,
    ) -> Fallible<usize> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let sql = "insert into languages (id, name, version, created_date) values (?, ?, ?, ?) on conflict (id) do update set name = excluded.name;";
        tx.execute(
            sql,
            (&language.version, &language.name, &language.version, now),
        )?;
        for (verse, text) in verses {
            insert_verse(&tx, verse, now)?;
            let sql = "insert into translations (verse_id, language_id, text, created_date) values (?, ?, ?, ?) on conflict (verse_id, language_id) do update set text = excluded.text;";
            tx.execute(sql, (verse.id(), &language.version, text, now))?;
        }
        tx.commit()?;
        log::debug!("Imported {} verses of {}", verses.len(), language.version);
        Ok(verses.len())
    }

    async fn verse_exists(&self, verse_id: &str) -> Fallible<bool> {
        let conn = self.acquire();
        let sql = "select count(*) from bible_verses where id = ?;";
        let count: i64 = conn.query_row(sql, [verse_id], |row| row.get(0))?;
        Ok(count > 0)
    }

    async fn verse_text(&self, verse_id: &str, version: &str) -> Fallible<Option<String>> {
        let conn = self.acquire();
        let sql = "select t.text from translations t join languages l on l.id = t.language_id where t.verse_id = ? and l.version = ?;";
        let text: Option<String> = conn
            .query_row(sql, [verse_id, version], |row| row.get(0))
            .optional()?;
        Ok(text)
    }
}

/// Insert a verse along with its book and chapter, unless already present.
fn insert_verse(tx: &Transaction, verse: &VerseRef, now: Timestamp) -> Fallible<()> {
    tx.execute(
        "insert into books (id, name, created_date) values (?, ?, ?) on conflict do nothing;",
        (verse.book(), verse.book(), now),
    )?;
    tx.execute(
        "insert into bible_chapters (id, book_id, chapter_number, created_date) values (?, ?, ?, ?) on conflict do nothing;",
        (verse.chapter_id(), verse.book(), verse.chapter(), now),
    )?;
    tx.execute(
        "insert into bible_verses (id, bible_chapter_id, verse_number, created_date) values (?, ?, ?, ?) on conflict do nothing;",
        (verse.id(), verse.chapter_id(), verse.verse(), now),
    )?;
    Ok(())
}

const CARD_COLUMNS: &str = "id, collection_id, verse_id, last_review_date, ease_factor, interval, repetition_number, created_date, updated_date";

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        verse_id: row.get(2)?,
        last_review_date: row.get(3)?,
        ease_factor: row.get(4)?,
        interval: row.get(5)?,
        repetition_number: row.get(6)?,
        created_date: row.get(7)?,
        updated_date: row.get(8)?,
    })
}

fn collection_from_row(row: &Row) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        name: row.get(1)?,
        created_date: row.get(2)?,
        updated_date: row.get(3)?,
    })
}

fn card_verse_from_row(row: &Row) -> rusqlite::Result<CardVerse> {
    Ok(CardVerse {
        id: row.get(0)?,
        card_id: row.get(1)?,
        verse_id: row.get(2)?,
        created_date: row.get(3)?,
        updated_date: row.get(4)?,
    })
}

fn upsert_collection(tx: &Transaction, row: &Collection) -> Fallible<()> {
    let sql = "insert into collections (id, name, created_date, updated_date) values (?, ?, ?, ?) on conflict (id) do update set name = excluded.name, created_date = excluded.created_date, updated_date = excluded.updated_date;";
    tx.execute(
        sql,
        (&row.id, &row.name, row.created_date, row.updated_date),
    )?;
    Ok(())
}

fn upsert_card(tx: &Transaction, row: &Card) -> Fallible<()> {
    let sql = "insert into cards (id, collection_id, verse_id, last_review_date, ease_factor, interval, repetition_number, created_date, updated_date) values (?, ?, ?, ?, ?, ?, ?, ?, ?) on conflict (id) do update set collection_id = excluded.collection_id, verse_id = excluded.verse_id, last_review_date = excluded.last_review_date, ease_factor = excluded.ease_factor, interval = excluded.interval, repetition_number = excluded.repetition_number, created_date = excluded.created_date, updated_date = excluded.updated_date;";
    tx.execute(
        sql,
        (
            &row.id,
            &row.collection_id,
            &row.verse_id,
            row.last_review_date,
            row.ease_factor,
            row.interval,
            row.repetition_number,
            row.created_date,
            row.updated_date,
        ),
    )?;
    Ok(())
}

fn upsert_card_verse(tx: &Transaction, row: &CardVerse) -> Fallible<()> {
    let sql = "insert into card_verses (id, card_id, verse_id, created_date, updated_date) values (?, ?, ?, ?, ?) on conflict (id) do update set card_id = excluded.card_id, verse_id = excluded.verse_id, created_date = excluded.created_date, updated_date = excluded.updated_date;";
    tx.execute(
        sql,
        (
            &row.id,
            &row.card_id,
            &row.verse_id,
            row.created_date,
            row.updated_date,
        ),
    )?;
    Ok(())
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

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

//! Reconciles the local store with the remote.
//!
//! Pull absorbs remote rows by upsert, so the remote wins any conflict, and
//! is the only operation that moves the watermark. Push sends every local row
//! updated after the watermark and leaves the watermark alone, which means a
//! row can be pushed more than once. The remote is expected to upsert, so
//! that is harmless.

pub mod remote;

use serde::Serialize;

use crate::error::Fallible;
use crate::store::Store;
use crate::sync::remote::Remote;
use crate::types::changeset::Changeset;
use crate::types::changeset::EntityKind;
use crate::types::date::Date;

/// How many rows of each kind were transferred.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub collections: usize,
    pub cards: usize,
    pub card_verses: usize,
}

impl Counts {
    fn of(changes: &Changeset) -> Self {
        Self {
            collections: changes.collections.len(),
            cards: changes.cards.len(),
            card_verses: changes.card_verses.len(),
        }
    }
}

/// The outcome of a pull. Anything cached from the store is stale if any of
/// the counts are non-zero.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullReport {
    pub received: Counts,
    pub watermark: Date,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    pub sent: Counts,
    /// The watermark the rows were selected against.
    pub since: Option<Date>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct SyncReport {
    pub push: PushReport,
    pub pull: PullReport,
}

pub struct SyncEngine<S: Store, R: Remote> {
    store: S,
    remote: R,
}

impl<S: Store, R: Remote> SyncEngine<S, R> {
    pub fn new(store: S, remote: R) -> Self {
        Self { store, remote }
    }

    /// Fetch remote changes since the watermark and upsert them, one entity
    /// kind at a time. The watermark moves to `today` only once everything
    /// has been written. On failure it is left as it was, so retrying is
    /// safe.
    pub async fn pull(&self, today: Date) -> Fallible<PullReport> {
        self.try_pull(today)
            .await
            .map_err(|e| e.context("pull failed"))
    }

    async fn try_pull(&self, today: Date) -> Fallible<PullReport> {
        let since = self.store.watermark().await?;
        match since {
            Some(since) => log::debug!("Pulling changes since {since}"),
            None => log::debug!("Pulling everything"),
        }
        let changes = self.remote.pull(since).await?;
        let received = Counts::of(&changes);
        for rows in changes.into_rows() {
            if !rows.is_empty() {
                self.store.upsert(&rows).await?;
            }
        }
        self.store.set_watermark(today).await?;
        log::info!(
            "Pulled {} collections, {} cards, {} card verses",
            received.collections,
            received.cards,
            received.card_verses
        );
        Ok(PullReport {
            received,
            watermark: today,
        })
    }

    /// Send every local row updated after the watermark, or every row if
    /// there is none.
    pub async fn push(&self) -> Fallible<PushReport> {
        self.try_push()
            .await
            .map_err(|e| e.context("push failed"))
    }

    async fn try_push(&self) -> Fallible<PushReport> {
        let since = self.store.watermark().await?;
        let mut changes = Changeset::default();
        for kind in EntityKind::ALL {
            changes.insert(self.store.updated_since(kind, since).await?);
        }
        let sent = Counts::of(&changes);
        self.remote.push(&changes).await?;
        log::info!(
            "Pushed {} collections, {} cards, {} card verses",
            sent.collections,
            sent.cards,
            sent.card_verses
        );
        Ok(PushReport { sent, since })
    }

    /// A full cycle: push local changes, then pull. If the push fails the
    /// pull is skipped.
    pub async fn sync(&self, today: Date) -> Fallible<SyncReport> {
        let push = self.push().await?;
        let pull = self.pull(today).await?;
        Ok(SyncReport { push, pull })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::db::Database;
    use crate::error::ErrorKind;
    use crate::error::ErrorReport;
    use crate::types::card::Card;
    use crate::types::card_verse::CardVerse;
    use crate::types::changeset::Rows;
    use crate::types::collection::Collection;
    use crate::types::timestamp::Timestamp;

    /// An in-memory remote that serves a fixed changeset.
    #[derive(Default)]
    struct MemoryRemote {
        inner: Mutex<MemoryRemoteInner>,
    }

    #[derive(Default)]
    struct MemoryRemoteInner {
        changes: Changeset,
        fail: bool,
        pulls: Vec<Option<Date>>,
        pushes: Vec<Changeset>,
    }

    impl MemoryRemote {
        fn serving(changes: Changeset) -> Self {
            let remote = Self::default();
            remote.inner.lock().unwrap().changes = changes;
            remote
        }

        fn set_failing(&self, fail: bool) {
            self.inner.lock().unwrap().fail = fail;
        }

        fn pulls(&self) -> Vec<Option<Date>> {
            self.inner.lock().unwrap().pulls.clone()
        }

        fn pushes(&self) -> Vec<Changeset> {
            self.inner.lock().unwrap().pushes.clone()
        }
    }

    #[async_trait]
    impl Remote for MemoryRemote {
        async fn pull(&self, last_sync: Option<Date>) -> Fallible<Changeset> {
            let mut inner = self.inner.lock().unwrap();
            inner.pulls.push(last_sync);
            if inner.fail {
                return Err(ErrorReport::network("remote responded with 500."));
            }
            Ok(inner.changes.clone())
        }

        async fn push(&self, changes: &Changeset) -> Fallible<()> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail {
                return Err(ErrorReport::network("remote responded with 500."));
            }
            inner.pushes.push(changes.clone());
            Ok(())
        }
    }

    fn at(m: u32, d: u32) -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, m, d, 9, 0, 0).unwrap())
    }

    fn date(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn remote_changes() -> Changeset {
        let now = at(5, 1);
        let collection = Collection::new("John", now);
        let card = Card::new(&collection.id, "jn-3-16", now);
        let card_verse = CardVerse::new(&card.id, "jn-3-16", now);
        Changeset {
            collections: vec![collection],
            cards: vec![card],
            card_verses: vec![card_verse],
        }
    }

    async fn snapshot(db: &Database) -> Fallible<Vec<Rows>> {
        let mut rows = Vec::new();
        for kind in EntityKind::ALL {
            rows.push(db.updated_since(kind, None).await?);
        }
        Ok(rows)
    }

    #[tokio::test]
    async fn test_pull_into_empty_store() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let changes = remote_changes();
        let engine = SyncEngine::new(db.clone(), MemoryRemote::serving(changes.clone()));

        let report = engine.pull(date("2025-06-01")).await?;
        assert_eq!(
            report.received,
            Counts {
                collections: 1,
                cards: 1,
                card_verses: 1
            }
        );
        assert_eq!(report.watermark, date("2025-06-01"));
        assert_eq!(db.watermark().await?, Some(date("2025-06-01")));
        assert_eq!(engine.remote.pulls(), vec![None]);
        assert_eq!(
            snapshot(&db).await?,
            changes.into_rows().to_vec()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_pull_is_idempotent() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let engine = SyncEngine::new(db.clone(), MemoryRemote::serving(remote_changes()));
        engine.pull(date("2025-06-01")).await?;
        let first = snapshot(&db).await?;
        engine.pull(date("2025-06-01")).await?;
        let second = snapshot(&db).await?;
        assert_eq!(first, second);
        // The second pull is incremental.
        assert_eq!(engine.remote.pulls(), vec![None, Some(date("2025-06-01"))]);
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_wins_conflicts() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let changes = remote_changes();
        let mut local = changes.clone();
        local.cards[0].interval = 12;
        local.cards[0].repetition_number = 3;
        local.cards[0].updated_date = Some(at(6, 2));
        for rows in local.into_rows() {
            db.upsert(&rows).await?;
        }

        let engine = SyncEngine::new(db.clone(), MemoryRemote::serving(changes.clone()));
        engine.pull(date("2025-06-03")).await?;
        let cards = db.cards_in_collection(&changes.collections[0].id).await?;
        assert_eq!(cards, changes.cards);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_pull_keeps_watermark() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        db.set_watermark(date("2025-05-01")).await?;
        let remote = MemoryRemote::serving(remote_changes());
        remote.set_failing(true);
        let engine = SyncEngine::new(db.clone(), remote);

        let err = engine.pull(date("2025-06-01")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("pull failed"));
        assert_eq!(db.watermark().await?, Some(date("2025-05-01")));
        assert!(snapshot(&db).await?.iter().all(Rows::is_empty));

        // A retry after the remote recovers goes through.
        engine.remote.set_failing(false);
        engine.pull(date("2025-06-01")).await?;
        assert_eq!(db.watermark().await?, Some(date("2025-06-01")));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_upsert_keeps_watermark() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let mut changes = remote_changes();
        // A card whose collection exists nowhere.
        changes.cards.push(Card::new("missing", "jn-1-1", at(5, 1)));
        let engine = SyncEngine::new(db.clone(), MemoryRemote::serving(changes));

        let err = engine.pull(date("2025-06-01")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(db.watermark().await?, None);
        // Upserts are atomic per kind: no cards were written.
        assert!(db.updated_since(EntityKind::Card, None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_push_without_watermark_sends_everything() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let mut changes = remote_changes();
        // Old rows, and one that was never updated.
        changes.collections[0].updated_date = Some(at(1, 1));
        changes.cards[0].updated_date = None;
        changes.card_verses[0].updated_date = Some(at(2, 1));
        for rows in changes.clone().into_rows() {
            db.upsert(&rows).await?;
        }

        let engine = SyncEngine::new(db.clone(), MemoryRemote::default());
        let report = engine.push().await?;
        assert_eq!(report.since, None);
        assert_eq!(report.sent.cards, 1);
        assert_eq!(engine.remote.pushes(), vec![changes]);
        // Pushing doesn't move the watermark.
        assert_eq!(db.watermark().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_push_sends_rows_updated_after_watermark() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let changes = remote_changes();
        for rows in changes.clone().into_rows() {
            db.upsert(&rows).await?;
        }
        db.set_watermark(date("2025-05-10")).await?;
        let collection = &changes.collections[0];
        let mut fresh = Card::new(&collection.id, "jn-14-6", at(5, 20));
        fresh.updated_date = Some(at(5, 20));
        db.upsert(&Rows::Cards(vec![fresh.clone()])).await?;

        let engine = SyncEngine::new(db.clone(), MemoryRemote::default());
        let report = engine.push().await?;
        assert_eq!(report.since, Some(date("2025-05-10")));
        let pushes = engine.remote.pushes();
        assert_eq!(pushes.len(), 1);
        assert!(pushes[0].collections.is_empty());
        assert_eq!(pushes[0].cards, vec![fresh]);
        assert!(pushes[0].card_verses.is_empty());

        // Without a pull in between, the same row goes out again.
        engine.push().await?;
        assert_eq!(engine.remote.pushes()[1], pushes[0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_push() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let remote = MemoryRemote::default();
        remote.set_failing(true);
        let engine = SyncEngine::new(db.clone(), remote);
        let err = engine.push().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.to_string().contains("push failed"));
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_pushes_then_pulls() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let now = at(6, 1);
        let local = Collection::new("Local", now);
        db.upsert(&Rows::Collections(vec![local.clone()])).await?;

        let engine = SyncEngine::new(db.clone(), MemoryRemote::serving(remote_changes()));
        let report = engine.sync(date("2025-06-01")).await?;
        assert_eq!(report.push.sent.collections, 1);
        assert_eq!(report.pull.received.collections, 1);
        assert_eq!(engine.remote.pushes()[0].collections, vec![local]);
        assert_eq!(db.watermark().await?, Some(date("2025-06-01")));
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_skips_pull_when_push_fails() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let remote = MemoryRemote::serving(remote_changes());
        remote.set_failing(true);
        let engine = SyncEngine::new(db.clone(), remote);
        assert!(engine.sync(date("2025-06-01")).await.is_err());
        assert!(engine.remote.pulls().is_empty());
        assert_eq!(db.watermark().await?, None);
        Ok(())
    }
}

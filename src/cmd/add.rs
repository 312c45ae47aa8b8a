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

use crate::catalogue::Catalogue;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::Store;
use crate::types::card::Card;
use crate::types::card_verse::CardVerse;
use crate::types::changeset::Rows;
use crate::types::collection::Collection;
use crate::types::timestamp::Timestamp;
use crate::types::verse::VerseRef;

/// Add a verse to the named collection, creating the collection if it
/// doesn't exist. The verse must be in the catalogue. The new card is due
/// right away.
pub async fn add_verse<S: Store + Catalogue>(
    store: &S,
    collection_name: &str,
    reference: &str,
    now: Timestamp,
) -> Fallible<Card> {
    let verse = VerseRef::parse(reference)?;
    let verse_id = verse.id();
    if !store.verse_exists(&verse_id).await? {
        return fail(format!(
            "{} is not in the catalogue. Import a translation first.",
            verse.verbose()
        ));
    }
    let collection = match store.collection_by_name(collection_name).await? {
        Some(collection) => collection,
        None => {
            log::debug!("Creating collection {collection_name:?}");
            let collection = Collection::new(collection_name, now);
            store
                .upsert(&Rows::Collections(vec![collection.clone()]))
                .await?;
            collection
        }
    };
    let existing = store.cards_in_collection(&collection.id).await?;
    if existing.iter().any(|card| card.verse_id == verse_id) {
        return fail(format!("{} is already in {collection_name}.", verse.verbose()));
    }
    let card = Card::new(&collection.id, &verse_id, now);
    let card_verse = CardVerse::new(&card.id, &verse_id, now);
    store.add_card(&card, &card_verse).await?;
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::fixtures::catalogued_db;
    use crate::types::changeset::EntityKind;

    #[tokio::test]
    async fn test_add_creates_collection_once() -> Fallible<()> {
        let db = catalogued_db().await?;
        let now = Timestamp::now();
        let first = add_verse(&db, "Psalms", "Ps 23:1", now).await?;
        let second = add_verse(&db, "Psalms", "Psalms 23:2", now).await?;
        assert_eq!(first.collection_id, second.collection_id);
        assert_eq!(first.verse_id, "Ps 23:1");
        assert_eq!(second.verse_id, "Ps 23:2");

        let collection = db.collection_by_name("Psalms").await?.unwrap();
        assert_eq!(db.cards_in_collection(&collection.id).await?.len(), 2);
        assert_eq!(db.updated_since(EntityKind::Collection, None).await?.len(), 1);
        assert_eq!(db.updated_since(EntityKind::CardVerse, None).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_verse() -> Fallible<()> {
        let db = catalogued_db().await?;
        let now = Timestamp::now();
        add_verse(&db, "Psalms", "Ps 23:1", now).await?;
        let err = add_verse(&db, "Psalms", "Psalms 23:1", now).await.unwrap_err();
        assert_eq!(err.to_string(), "error: Psalms 23:1 is already in Psalms.");
        // The same verse can go in another collection.
        add_verse(&db, "Comfort", "Ps 23:1", now).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_add_requires_catalogued_verse() -> Fallible<()> {
        let db = catalogued_db().await?;
        let err = add_verse(&db, "Psalms", "Ps 23:6", Timestamp::now()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "error: Psalms 23:6 is not in the catalogue. Import a translation first."
        );
        assert!(add_verse(&db, "Psalms", "Psalms", Timestamp::now()).await.is_err());
        assert_eq!(db.collection_by_name("Psalms").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_new_card_is_due() -> Fallible<()> {
        let db = catalogued_db().await?;
        let now = Timestamp::now();
        let card = add_verse(&db, "Psalms", "John 3:16", now).await?;
        let due = db.find_due(&card.collection_id, now.date()).await?;
        assert_eq!(due, vec![card]);
        Ok(())
    }
}

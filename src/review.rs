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

mod session;

pub use session::Phase;
pub use session::Progress;
pub use session::ReviewSession;

use crate::error::Fallible;
use crate::error::fail;
use crate::sm2::reset_card;
use crate::store::Store;
use crate::types::date::Date;
use crate::types::quality::Quality;
use crate::types::timestamp::Timestamp;

/// Runs review sessions against a store.
pub struct ReviewEngine<S: Store> {
    store: S,
}

impl<S: Store> ReviewEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Start a session over the cards of a collection due on `today`.
    pub async fn start(&self, collection_id: &str, today: Date) -> Fallible<ReviewSession> {
        let cards = self.store.find_due(collection_id, today).await?;
        log::debug!("Starting review of {} due cards", cards.len());
        Ok(ReviewSession::new(cards))
    }

    /// Rate the session's current card. When this ends the session, the cards
    /// are committed with last review `now`. If that commit fails the error
    /// is returned, the session is left ended but uncommitted, and the commit
    /// can be retried with [`ReviewEngine::commit`].
    pub async fn rate(
        &self,
        session: &mut ReviewSession,
        quality: Quality,
        now: Timestamp,
    ) -> Fallible<Phase> {
        let phase = session.rate(quality)?;
        if phase == Phase::Ended {
            self.commit(session, now).await?;
        }
        Ok(phase)
    }

    /// Persist every card of an ended session in one batch, all with last
    /// review `now`. Committing twice is a no-op.
    pub async fn commit(&self, session: &mut ReviewSession, now: Timestamp) -> Fallible<()> {
        if !session.is_ended() {
            return fail("cannot commit a review session before it ends.");
        }
        if session.committed_at().is_some() {
            return Ok(());
        }
        self.store.batch_update(session.cards(), now).await?;
        session.mark_committed(now);
        log::debug!("Session completed");
        Ok(())
    }

    /// Restart spaced repetition for every card in a collection. Returns the
    /// number of cards reset.
    pub async fn reset(&self, collection_id: &str, now: Timestamp) -> Fallible<usize> {
        let mut cards = self.store.cards_in_collection(collection_id).await?;
        for card in cards.iter_mut() {
            reset_card(card, now);
        }
        self.store.batch_update(&cards, now).await?;
        log::debug!("Reset {} cards", cards.len());
        Ok(cards.len())
    }
}

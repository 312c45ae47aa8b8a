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

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::sm2;
use crate::types::card::Card;
use crate::types::quality::Quality;
use crate::types::timestamp::Timestamp;

/// Where a session is.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// Every due card is rated once, in order. Ratings update the schedule.
    PhaseOne { cursor: usize },
    /// Cards that lapsed in phase one are drilled until recovered. Ratings
    /// don't touch the schedule.
    PhaseTwo { cursor: usize },
    Ended,
}

/// How far through a session is.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Progress {
    /// Cards rated in phase one.
    pub reviewed: usize,
    /// Cards in the due set.
    pub total: usize,
    /// Cards waiting to be recovered.
    pub lapsed: usize,
}

/// The in-memory state of one review pass over a collection's due cards.
///
/// The session owns its copies of the cards until they are committed. Nothing
/// else should write those rows in the meantime.
pub struct ReviewSession {
    /// The due cards, in the order they were supplied.
    cards: Vec<Card>,
    /// Indices into `cards` of the cards still to be recovered.
    lapsed: Vec<usize>,
    phase: Phase,
    committed_at: Option<Timestamp>,
}

impl ReviewSession {
    pub fn new(cards: Vec<Card>) -> Self {
        let phase = if cards.is_empty() {
            Phase::Ended
        } else {
            Phase::PhaseOne { cursor: 0 }
        };
        Self {
            cards,
            lapsed: Vec::new(),
            phase,
            committed_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// When the session's cards were persisted, if they have been.
    pub fn committed_at(&self) -> Option<Timestamp> {
        self.committed_at
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn lapsed(&self) -> impl Iterator<Item = &Card> {
        self.lapsed.iter().map(|&idx| &self.cards[idx])
    }

    /// The card to show next.
    pub fn current(&self) -> Option<&Card> {
        match self.phase {
            Phase::PhaseOne { cursor } => self.cards.get(cursor),
            Phase::PhaseTwo { cursor } => self.lapsed.get(cursor).map(|&idx| &self.cards[idx]),
            Phase::Ended => None,
        }
    }

    /// How many more ratings the session needs, at least.
    pub fn remaining(&self) -> usize {
        match self.phase {
            Phase::PhaseOne { cursor } => self.cards.len() - cursor + self.lapsed.len(),
            Phase::PhaseTwo { .. } => self.lapsed.len(),
            Phase::Ended => 0,
        }
    }

    pub fn progress(&self) -> Progress {
        let reviewed = match self.phase {
            Phase::PhaseOne { cursor } => cursor,
            Phase::PhaseTwo { .. } | Phase::Ended => self.cards.len(),
        };
        Progress {
            reviewed,
            total: self.cards.len(),
            lapsed: self.lapsed.len(),
        }
    }

    /// Rate the current card and advance. Returns the new phase.
    pub fn rate(&mut self, quality: Quality) -> Fallible<Phase> {
        self.phase = match self.phase {
            Phase::Ended => {
                return Err(ErrorReport::with_kind(
                    ErrorKind::SessionEnded,
                    "the review session has ended.",
                ));
            }
            Phase::PhaseOne { cursor } => {
                if sm2::update_card(&mut self.cards[cursor], quality) {
                    self.lapsed.push(cursor);
                }
                if cursor + 1 < self.cards.len() {
                    Phase::PhaseOne { cursor: cursor + 1 }
                } else if self.lapsed.is_empty() {
                    Phase::Ended
                } else {
                    Phase::PhaseTwo { cursor: 0 }
                }
            }
            Phase::PhaseTwo { cursor } => {
                // A card stays up until it is recovered. Then it leaves the
                // queue and the next one slides into its slot.
                if sm2::recovered(quality) {
                    self.lapsed.remove(cursor);
                }
                if self.lapsed.is_empty() {
                    Phase::Ended
                } else if cursor >= self.lapsed.len() {
                    Phase::PhaseTwo { cursor: 0 }
                } else {
                    Phase::PhaseTwo { cursor }
                }
            }
        };
        log::debug!("Session phase: {:?}", self.phase);
        Ok(self.phase)
    }

    /// Record that the cards were written with last review `now`.
    pub(crate) fn mark_committed(&mut self, now: Timestamp) {
        for card in self.cards.iter_mut() {
            card.last_review_date = now;
            card.updated_date = Some(now);
        }
        self.committed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(value: i64) -> Quality {
        Quality::new(value).unwrap()
    }

    fn cards(n: usize) -> Vec<Card> {
        let now = Timestamp::now();
        (0..n)
            .map(|i| Card::new("collection", format!("verse-{i}"), now))
            .collect()
    }

    fn lapsed_verses(session: &ReviewSession) -> Vec<&str> {
        session.lapsed().map(|c| c.verse_id.as_str()).collect()
    }

    #[test]
    fn test_empty_session_starts_ended() {
        let mut session = ReviewSession::new(Vec::new());
        assert!(session.is_ended());
        assert_eq!(session.current(), None);
        assert_eq!(session.remaining(), 0);
        assert_eq!(session.rate(q(5)).unwrap_err().kind(), ErrorKind::SessionEnded);
    }

    #[test]
    fn test_phase_one_visits_cards_in_order() -> Fallible<()> {
        let mut session = ReviewSession::new(cards(3));
        for i in 0..3 {
            assert_eq!(session.phase(), Phase::PhaseOne { cursor: i });
            assert_eq!(session.progress().reviewed, i);
            assert_eq!(session.current().unwrap().verse_id, format!("verse-{i}"));
            session.rate(q(5))?;
        }
        assert!(session.is_ended());
        Ok(())
    }

    #[test]
    fn test_all_good_ratings_end_without_phase_two() -> Fallible<()> {
        let mut session = ReviewSession::new(cards(2));
        assert_eq!(session.rate(q(4))?, Phase::PhaseOne { cursor: 1 });
        assert_eq!(session.rate(q(5))?, Phase::Ended);
        assert_eq!(session.lapsed().count(), 0);
        assert_eq!(session.rate(q(5)).unwrap_err().kind(), ErrorKind::SessionEnded);
        Ok(())
    }

    #[test]
    fn test_poor_ratings_are_lapsed_once_each() -> Fallible<()> {
        let mut session = ReviewSession::new(cards(4));
        session.rate(q(3))?;
        session.rate(q(5))?;
        session.rate(q(0))?;
        let phase = session.rate(q(2))?;
        assert_eq!(phase, Phase::PhaseTwo { cursor: 0 });
        assert_eq!(lapsed_verses(&session), vec!["verse-0", "verse-2", "verse-3"]);
        assert_eq!(session.remaining(), 3);
        assert_eq!(
            session.progress(),
            Progress {
                reviewed: 4,
                total: 4,
                lapsed: 3
            }
        );
        Ok(())
    }

    #[test]
    fn test_phase_two_does_not_touch_schedule() -> Fallible<()> {
        let mut session = ReviewSession::new(cards(1));
        session.rate(q(1))?;
        let before = session.cards()[0].clone();
        session.rate(q(2))?;
        session.rate(q(3))?;
        assert_eq!(session.cards()[0], before);
        session.rate(q(4))?;
        assert_eq!(session.cards()[0], before);
        assert!(session.is_ended());
        Ok(())
    }

    #[test]
    fn test_phase_two_repeats_until_recovered() -> Fallible<()> {
        let mut session = ReviewSession::new(cards(3));
        session.rate(q(0))?;
        session.rate(q(1))?;
        session.rate(q(2))?;
        assert_eq!(session.current().unwrap().verse_id, "verse-0");

        // Failing verse-0 shows it again.
        assert_eq!(session.rate(q(2))?, Phase::PhaseTwo { cursor: 0 });
        assert_eq!(session.current().unwrap().verse_id, "verse-0");
        assert_eq!(session.rate(q(3))?, Phase::PhaseTwo { cursor: 0 });
        assert_eq!(session.current().unwrap().verse_id, "verse-0");

        // Recovering it brings up verse-1.
        assert_eq!(session.rate(q(4))?, Phase::PhaseTwo { cursor: 0 });
        assert_eq!(session.current().unwrap().verse_id, "verse-1");
        assert_eq!(lapsed_verses(&session), vec!["verse-1", "verse-2"]);

        assert_eq!(session.rate(q(0))?, Phase::PhaseTwo { cursor: 0 });
        assert_eq!(session.current().unwrap().verse_id, "verse-1");
        assert_eq!(session.rate(q(5))?, Phase::PhaseTwo { cursor: 0 });
        assert_eq!(session.current().unwrap().verse_id, "verse-2");

        assert_eq!(session.rate(q(4))?, Phase::Ended);
        assert_eq!(session.current(), None);
        Ok(())
    }

    #[test]
    fn test_failed_lapsed_card_is_shown_again() -> Fallible<()> {
        let mut session = ReviewSession::new(cards(2));
        session.rate(q(0))?;
        session.rate(q(0))?;
        assert_eq!(lapsed_verses(&session), vec!["verse-0", "verse-1"]);
        session.rate(q(2))?;
        assert_eq!(session.phase(), Phase::PhaseTwo { cursor: 0 });
        assert_eq!(session.current().unwrap().verse_id, "verse-0");
        Ok(())
    }

    #[test]
    fn test_mark_committed() -> Fallible<()> {
        let mut session = ReviewSession::new(cards(2));
        session.rate(q(5))?;
        session.rate(q(5))?;
        let now = Timestamp::now();
        session.mark_committed(now);
        assert_eq!(session.committed_at(), Some(now));
        assert!(session.cards().iter().all(|c| c.last_review_date == now));
        Ok(())
    }
}

